//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
///
/// Call [`Timer::update`] once per frame from the host's animation callback.
pub struct Timer {
    started: Instant,
    last_frame: Instant,
    delta_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_frame: now,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Update the timer with an explicit frame timestamp
    pub fn update_at(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn elapsed(&self) -> Duration {
        self.last_frame.saturating_duration_since(self.started)
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Milliseconds between two instants as `f64`, zero if `later` precedes `earlier`
pub fn millis_between(earlier: Instant, later: Instant) -> f64 {
    later.saturating_duration_since(earlier).as_secs_f64() * 1000.0
}
