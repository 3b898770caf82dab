//! Variable-rate frame clock.
//!
//! Every redraw advances the visualization by the wall-clock time since the
//! previous redraw. Long stalls (a minimized window, a debugger pause) are
//! clamped so the animation resumes where it left off instead of jumping.

use std::time::Instant;
use tracing::warn;

/// Largest delta handed to the animation in one frame, in seconds.
pub const MAX_FRAME_TIME: f64 = 0.25;

pub struct FrameClock {
    previous_time: Instant,
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Starts measuring from the current instant.
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Measures the time since the previous call and returns the clamped delta.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;
        self.advance(frame_time)
    }

    /// Advances by an explicit frame time instead of the measured one.
    pub fn advance(&mut self, frame_time: f64) -> f32 {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }
        self.elapsed += frame_time;
        self.frame_count += 1;
        frame_time as f32
    }

    /// Forget the time spent before now, e.g. while the GPU was initialising.
    pub fn restart(&mut self) {
        self.previous_time = Instant::now();
    }

    /// Total clamped time handed out so far, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_frame_passes_through() {
        let mut clock = FrameClock::new();
        let dt = clock.advance(1.0 / 60.0);
        assert!((dt - 1.0 / 60.0).abs() < 1e-6, "dt was {dt}");
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FrameClock::new();
        let dt = clock.advance(2.0);
        assert!(
            (dt as f64 - MAX_FRAME_TIME).abs() < 1e-6,
            "expected clamp to {MAX_FRAME_TIME}, got {dt}"
        );
        assert!((clock.elapsed() - MAX_FRAME_TIME).abs() < 1e-9);
    }

    #[test]
    fn test_negative_frame_time_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(-0.5), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_elapsed_accumulates_across_frames() {
        let mut clock = FrameClock::new();
        for _ in 0..60 {
            clock.advance(1.0 / 60.0);
        }
        assert!(
            (clock.elapsed() - 1.0).abs() < 1e-9,
            "elapsed was {}",
            clock.elapsed()
        );
        assert_eq!(clock.frame_count(), 60);
    }

    #[test]
    fn test_clamped_stall_does_not_jump_elapsed() {
        let mut clock = FrameClock::new();
        clock.advance(0.016);
        clock.advance(30.0);
        clock.advance(0.016);
        assert!(clock.elapsed() < 0.3, "elapsed was {}", clock.elapsed());
    }

    #[test]
    fn test_measured_tick_is_bounded() {
        let mut clock = FrameClock::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let dt = clock.tick();
        assert!(dt > 0.0 && dt as f64 <= MAX_FRAME_TIME, "dt was {dt}");
    }

    #[test]
    fn test_restart_discards_pending_time() {
        let mut clock = FrameClock::new();
        std::thread::sleep(std::time::Duration::from_millis(20));
        clock.restart();
        let dt = clock.tick();
        assert!(dt < 0.02, "restart should drop the 20ms sleep, got {dt}");
    }
}
