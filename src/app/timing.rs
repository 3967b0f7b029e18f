use std::time::{Duration, Instant};
use winit::window::Window;

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Frame pacing plus an fps readout in the window title.
pub struct FrameTiming {
    last_fps_time: Instant,
    frame_count: u32,
    base_title: String,
    frame_interval: Duration,
    next_frame_at: Instant,
}

impl FrameTiming {
    pub fn new(base_title: String, window: &Window) -> Self {
        let now = Instant::now();
        let frame_interval = monitor_frame_interval(window);
        Self {
            last_fps_time: now,
            frame_count: 0,
            base_title,
            frame_interval,
            next_frame_at: now,
        }
    }

    pub fn refresh_interval(&mut self, window: &Window) {
        self.frame_interval = monitor_frame_interval(window);
    }

    /// True when a redraw is due; schedules the next one.
    pub fn frame_due(&mut self, now: Instant) -> bool {
        if now < self.next_frame_at {
            return false;
        }
        self.next_frame_at = now + self.frame_interval;
        true
    }

    pub fn next_frame_at(&self) -> Instant {
        self.next_frame_at
    }

    pub fn record_frame(&mut self, window: &Window, now: Instant, render_ms: f32) {
        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            window.set_title(&format!(
                "{} - {:.1} fps (render {:.2} ms)",
                self.base_title, fps, render_ms
            ));
            self.frame_count = 0;
            self.last_fps_time = now;
        }
    }
}

fn monitor_frame_interval(window: &Window) -> Duration {
    window
        .current_monitor()
        .and_then(|monitor| monitor.refresh_rate_millihertz())
        .map(|millihz| millihz as f32 / 1000.0)
        .filter(|hz| *hz > 1.0)
        .map(|hz| Duration::from_secs_f32(1.0 / hz))
        .unwrap_or(DEFAULT_FRAME_INTERVAL)
}
