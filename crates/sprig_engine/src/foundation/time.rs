//! Time management utilities

use std::time::Instant;

/// Frame clock for the scheduler.
///
/// Either measures wall-clock time between calls to [`Timer::update`] or is
/// advanced by a caller-supplied delta through [`Timer::advance`].
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
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
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Measure the wall-clock delta since the previous update and count a frame
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.advance(elapsed)
    }

    /// Count a frame of `dt` seconds without consulting the wall clock.
    ///
    /// Negative or non-finite deltas are clamped to zero.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.delta_time = dt;
        self.total_time += dt;
        self.frame_count += 1;
        dt
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_advance_accumulates() {
        let mut timer = Timer::new();
        timer.advance(0.25);
        timer.advance(0.5);
        assert_eq!(timer.frame_count(), 2);
        assert_relative_eq!(timer.total_time(), 0.75);
        assert_relative_eq!(timer.delta_time(), 0.5);
    }

    #[test]
    fn test_advance_clamps_bad_deltas() {
        let mut timer = Timer::new();
        assert_eq!(timer.advance(-1.0), 0.0);
        assert_eq!(timer.advance(f32::NAN), 0.0);
        assert_eq!(timer.frame_count(), 2);
    }
}
