/// Default cap on fixed steps run for a single measured frame.
pub const MAX_STEPS_PER_FRAME: u32 = 5;

/// Converts measured frame times into a whole number of fixed steps.
///
/// Leftover time carries into the next frame. When a frame would need more
/// than `max_steps`, the backlog is dropped instead of spiralling.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
    max_steps: u32,
}

impl FixedTimestep {
    /// A timestep running at `rate_hz`. Invalid rates fall back to 60 Hz.
    pub fn new(rate_hz: f32) -> Self {
        let rate = if rate_hz.is_finite() && rate_hz > 0.0 {
            rate_hz
        } else {
            60.0
        };
        Self {
            step: 1.0 / rate,
            accumulator: 0.0,
            max_steps: MAX_STEPS_PER_FRAME,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Length of one step in seconds.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add `elapsed` seconds and return how many steps are now due.
    pub fn accumulate(&mut self, elapsed: f32) -> u32 {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if self.accumulator >= self.step {
            tracing::debug!(
                backlog = self.accumulator,
                "Frame exceeded {} fixed steps, dropping backlog",
                self.max_steps
            );
            self.accumulator = 0.0;
        }
        steps
    }

    /// Fraction of a step left in the accumulator, for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_remainder_between_frames() {
        let mut ts = FixedTimestep::new(64.0);
        let step = ts.step();
        assert_eq!(ts.accumulate(step * 1.5), 1);
        assert!((ts.alpha() - 0.5).abs() < 1e-5);
        assert_eq!(ts.accumulate(step * 0.5), 1);
        assert!(ts.alpha() < 1e-5);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut ts = FixedTimestep::new(60.0).with_max_steps(3);
        assert_eq!(ts.accumulate(10.0), 3);
        assert_eq!(ts.alpha(), 0.0, "backlog should be dropped");
    }

    #[test]
    fn invalid_inputs_are_ignored() {
        let mut ts = FixedTimestep::new(f32::NAN);
        assert!((ts.step() - 1.0 / 60.0).abs() < 1e-7);
        assert_eq!(ts.accumulate(-1.0), 0);
        assert_eq!(ts.accumulate(f32::INFINITY), 0);
        assert_eq!(ts.accumulate(0.0), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn steps_are_capped_and_alpha_stays_in_range(
                rate in 20.0f32..240.0,
                max_steps in 1u32..8,
                frames in prop::collection::vec(0.0f32..0.5, 1..60),
            ) {
                let mut ts = FixedTimestep::new(rate).with_max_steps(max_steps);
                for elapsed in frames {
                    let steps = ts.accumulate(elapsed);
                    prop_assert!(steps <= max_steps, "{} steps over cap {}", steps, max_steps);
                    let alpha = ts.alpha();
                    prop_assert!((0.0..=1.0).contains(&alpha), "alpha {}", alpha);
                }
            }
        }
    }
}
