use crate::feedback::FeedbackEvent;
use crate::input::InputSnapshot;

/// A deterministic, single-threaded, fixed-tick simulation.
///
/// The runtime owns windowing, rendering and device polling; the simulation
/// only turns elapsed time and resolved input into state and feedback.
pub trait Simulation {
    /// Advance by `dt` seconds. Non-finite or non-positive `dt` is a no-op.
    fn update(&mut self, dt: f32, input: &InputSnapshot) -> Vec<FeedbackEvent>;

    /// Serialize the full mutable state (MessagePack).
    fn serialize_state(&self) -> Vec<u8>;

    /// Replace the mutable state with a previously serialized one. Bytes that
    /// fail to decode leave the current state untouched.
    fn apply_state(&mut self, state: &[u8]);

    /// Return every entity to its spawn state.
    fn reset(&mut self);

    /// Preferred fixed step rate in Hz.
    fn tick_rate(&self) -> f32 {
        60.0
    }

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;
}

/// Generates the `serialize_state`, `apply_state`, `pause`, `resume` and
/// `is_paused` methods of [`Simulation`].
///
/// Requires the implementing struct to have `state: $StateType` and
/// `paused: bool` fields, and the calling crate to depend on `rmp-serde` and
/// `tracing`.
#[macro_export]
macro_rules! simulation_boilerplate {
    (state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).expect("simulation state serialization must succeed")
        }

        fn apply_state(&mut self, state: &[u8]) {
            match rmp_serde::from_slice::<$StateType>(state) {
                Ok(s) => self.state = s,
                Err(e) => tracing::warn!("Ignoring undecodable state snapshot: {e}"),
            }
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    };
}
