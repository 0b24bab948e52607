//! Frame timing for the render loop.
//!
//! Simulation ticks are counted per frame, not per second, so wall-clock time
//! only drives camera smoothing and the fps readout.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! loop {
//!     let dt = clock.update();
//!     camera.update(dt, attractor.centroid());
//! }
//! ```

use std::time::{Duration, Instant};

/// Longest delta reported by [`FrameClock::update`]. Stalls (window drags,
/// breakpoints) would otherwise make the camera jump.
const MAX_DELTA: f32 = 0.1;

#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Mark a new frame and return the clamped delta in seconds.
    pub fn update(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let raw = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = raw.min(MAX_DELTA);
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// True on frames where [`fps`](Self::fps) was just recomputed.
    pub fn fps_refreshed(&self) -> bool {
        self.fps_frame_count == self.frame_count && self.frame_count > 0
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
    fn test_new_clock() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.fps(), 0.0);
        assert!(!clock.fps_refreshed());
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = FrameClock::new();
        let start = clock.last_frame;
        let dt = clock.tick_at(start + Duration::from_secs(3));
        assert_eq!(dt, MAX_DELTA);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_fps_refresh() {
        let mut clock = FrameClock::new();
        let start = clock.last_frame;
        for i in 1..=30 {
            clock.tick_at(start + Duration::from_millis(i * 10));
        }
        // 30 frames over 300ms: not refreshed yet
        assert_eq!(clock.fps(), 0.0);

        for i in 31..=50 {
            clock.tick_at(start + Duration::from_millis(i * 10));
        }
        assert!(clock.fps_refreshed() || clock.fps() > 0.0);
        assert!((clock.fps() - 100.0).abs() < 1.0);
    }
}
