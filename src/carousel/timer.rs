use std::time::{Duration, Instant};

/// Repeating auto-advance deadline.
///
/// The event loop sleeps until [`AutoAdvance::next_due`] and calls
/// [`AutoAdvance::poll`] when it wakes. A late wake-up fires a single tick and
/// schedules the following one a full period later, so stalls never produce a
/// burst of advances.
#[derive(Debug, Clone)]
pub struct AutoAdvance {
    period: Duration,
    next_due: Instant,
}

impl AutoAdvance {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

    pub fn start(period: Duration, now: Instant) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            next_due: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        if self.next_due <= now {
            self.next_due = now + self.period;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::AutoAdvance;
    use std::time::{Duration, Instant};

    #[test]
    fn fires_once_per_period() {
        let start = Instant::now();
        let period = Duration::from_secs(5);
        let mut timer = AutoAdvance::start(period, start);

        assert!(!timer.poll(start + Duration::from_secs(4)));
        assert!(timer.poll(start + period));
        assert!(!timer.poll(start + period));
        assert_eq!(timer.next_due(), start + period * 2);
        assert!(timer.poll(start + period * 2 + Duration::from_millis(10)));
        assert_eq!(timer.next_due(), start + period * 3);
    }

    #[test]
    fn late_wakeup_does_not_burst() {
        let start = Instant::now();
        let period = Duration::from_secs(5);
        let mut timer = AutoAdvance::start(period, start);

        let late = start + Duration::from_secs(23);
        assert!(timer.poll(late));
        assert!(!timer.poll(late));
        assert_eq!(timer.next_due(), late + period);
    }

    #[test]
    fn zero_period_is_raised_to_a_millisecond() {
        let timer = AutoAdvance::start(Duration::ZERO, Instant::now());
        assert_eq!(timer.period(), Duration::from_millis(1));
    }
}
