//! Slow-motion frame skipper.
//!
//! Stretches a few simulated frames over `interval` times as many controller
//! invocations. Skipped invocations still record input; only the real ones
//! run a phase handler.

/// Number of invocations per simulated frame: `round(normal_fps / slow_fps)`.
pub fn skip_interval(normal_fps: u32, slow_motion_fps: u32) -> u32 {
    assert!(slow_motion_fps > 0, "slow motion fps must be positive");
    ((normal_fps + slow_motion_fps / 2) / slow_motion_fps).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowMotion {
    interval: u32,
    frames_left: u32,
    skip_counter: u32,
}

impl SlowMotion {
    pub fn new(normal_fps: u32, slow_motion_fps: u32) -> Self {
        Self {
            interval: skip_interval(normal_fps, slow_motion_fps),
            frames_left: 0,
            skip_counter: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.frames_left > 0
    }

    /// Schedule `frames` slow simulated frames.
    pub fn schedule(&mut self, frames: u32) {
        self.frames_left = frames;
        self.skip_counter = 0;
    }

    /// Account for one controller invocation.
    ///
    /// Returns `true` if this invocation is a skipped tick.
    pub fn consume_invocation(&mut self) -> bool {
        if self.frames_left == 0 {
            return false;
        }
        self.skip_counter += 1;
        if self.skip_counter % self.interval != 0 {
            return true;
        }
        self.frames_left -= 1;
        self.skip_counter = 0;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_interval_rounds() {
        assert_eq!(skip_interval(30, 5), 6);
        assert_eq!(skip_interval(25, 5), 5);
        assert_eq!(skip_interval(25, 4), 6);
        assert_eq!(skip_interval(25, 10), 3);
        assert_eq!(skip_interval(5, 5), 1);
    }

    #[test]
    fn test_idle_never_skips() {
        let mut slow = SlowMotion::new(30, 5);
        for _ in 0..10 {
            assert!(!slow.consume_invocation());
        }
    }

    #[test]
    fn test_six_frames_take_thirty_six_invocations() {
        let mut slow = SlowMotion::new(30, 5);
        slow.schedule(6);

        let mut invocations = 0;
        let mut real = 0;
        while slow.is_active() {
            invocations += 1;
            if !slow.consume_invocation() {
                real += 1;
            }
        }
        assert_eq!(invocations, 36);
        assert_eq!(real, 6);
    }

    #[test]
    fn test_real_frame_is_last_of_each_interval() {
        let mut slow = SlowMotion::new(30, 10);
        slow.schedule(2);
        let pattern: Vec<bool> = (0..6).map(|_| slow.consume_invocation()).collect();
        assert_eq!(pattern, vec![true, true, false, true, true, false]);
        assert!(!slow.is_active());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_scheduled_frames_stretch_by_interval(
                frames in 1u32..20,
                slow_fps in 1u32..30,
                extra in 0u32..90,
            ) {
                let normal_fps = slow_fps + extra;
                let mut slow = SlowMotion::new(normal_fps, slow_fps);
                slow.schedule(frames);

                let mut invocations = 0u32;
                let mut real = 0u32;
                while slow.is_active() {
                    invocations += 1;
                    if !slow.consume_invocation() {
                        real += 1;
                    }
                }
                prop_assert_eq!(invocations, frames * skip_interval(normal_fps, slow_fps));
                prop_assert_eq!(real, frames);
            }
        }
    }
}
