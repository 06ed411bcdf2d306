//! Per-frame delta time.

use std::time::{Duration, Instant};

/// Longest step handed to simulation code, in seconds. Stalls such as a
/// texture-set rebuild or a minimized window would otherwise produce one huge
/// jump.
pub const MAX_FRAME_TIME: f32 = 0.25;

#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
    frame_count: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            frame_count: 0,
        }
    }

    /// Returns the seconds since the previous tick, clamped to [`MAX_FRAME_TIME`].
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        self.frame_count += 1;
        clamp_frame_time(delta)
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_frame_time(delta: Duration) -> f32 {
    delta.as_secs_f32().min(MAX_FRAME_TIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_frame_time() {
        assert!((clamp_frame_time(Duration::from_millis(16)) - 0.016).abs() < 1e-6);
        assert_eq!(clamp_frame_time(Duration::from_secs(3)), MAX_FRAME_TIME);
    }

    #[test]
    fn test_tick_counts_frames() {
        let mut clock = FrameClock::new();
        let dt = clock.tick();
        clock.tick();
        assert!(dt >= 0.0);
        assert!(dt <= MAX_FRAME_TIME);
        assert_eq!(clock.frame_count(), 2);
    }
}
