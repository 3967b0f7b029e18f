use std::time::{Duration, Instant};

/// Media-time clock that only advances while playing.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    playing_since: Option<Instant>,
    accumulated: Duration,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }

    pub fn play_at(&mut self, now: Instant) {
        if self.playing_since.is_none() {
            self.playing_since = Some(now);
        }
    }

    pub fn pause_at(&mut self, now: Instant) {
        if let Some(since) = self.playing_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }
    }

    pub fn position(&self, now: Instant) -> Duration {
        match self.playing_since {
            Some(since) => self.accumulated + now.saturating_duration_since(since),
            None => self.accumulated,
        }
    }

    #[cfg(test)]
    pub fn rewind(&mut self, now: Instant) {
        self.accumulated = Duration::ZERO;
        if self.playing_since.is_some() {
            self.playing_since = Some(now);
        }
    }
}

/// Index of the frame on screen at `position`, looping over `delays`.
pub(crate) fn looped_frame_index(delays: &[Duration], position: Duration) -> usize {
    let total: Duration = delays.iter().sum();
    if delays.len() < 2 || total.is_zero() {
        return 0;
    }
    let mut remaining = Duration::from_nanos((position.as_nanos() % total.as_nanos()) as u64);
    for (index, delay) in delays.iter().enumerate() {
        if remaining < *delay {
            return index;
        }
        remaining -= *delay;
    }
    delays.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_stands_still_while_paused() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new();
        assert_eq!(clock.position(start + Duration::from_secs(3)), Duration::ZERO);

        clock.play_at(start);
        clock.pause_at(start + Duration::from_millis(400));
        assert_eq!(
            clock.position(start + Duration::from_secs(10)),
            Duration::from_millis(400)
        );

        clock.play_at(start + Duration::from_secs(10));
        assert_eq!(
            clock.position(start + Duration::from_millis(10_250)),
            Duration::from_millis(650)
        );
    }

    #[test]
    fn repeated_play_keeps_original_start() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.play_at(start);
        clock.play_at(start + Duration::from_secs(1));
        assert_eq!(clock.position(start + Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[test]
    fn rewind_restarts_from_zero() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.play_at(start);
        clock.rewind(start + Duration::from_secs(5));
        assert_eq!(
            clock.position(start + Duration::from_secs(6)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn frame_index_loops() {
        let delays = [
            Duration::from_millis(100),
            Duration::from_millis(50),
            Duration::from_millis(150),
        ];
        assert_eq!(looped_frame_index(&delays, Duration::ZERO), 0);
        assert_eq!(looped_frame_index(&delays, Duration::from_millis(99)), 0);
        assert_eq!(looped_frame_index(&delays, Duration::from_millis(100)), 1);
        assert_eq!(looped_frame_index(&delays, Duration::from_millis(160)), 2);
        assert_eq!(looped_frame_index(&delays, Duration::from_millis(300)), 0);
        assert_eq!(looped_frame_index(&delays, Duration::from_millis(455)), 2);
    }

    #[test]
    fn single_frame_is_always_zero() {
        assert_eq!(looped_frame_index(&[Duration::from_millis(40)], Duration::from_secs(9)), 0);
        assert_eq!(looped_frame_index(&[], Duration::from_secs(9)), 0);
    }
}
