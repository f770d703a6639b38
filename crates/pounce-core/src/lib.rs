pub mod feedback;
pub mod input;
pub mod math;
pub mod simulation;
pub mod time;
pub mod timer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::feedback::FeedbackEvent;
    use crate::input::InputSnapshot;
    use crate::simulation::Simulation;

    /// Run `n` ticks with the same input, returning all accumulated events.
    pub fn run_ticks(
        sim: &mut dyn Simulation,
        n: usize,
        dt: f32,
        input: &InputSnapshot,
    ) -> Vec<FeedbackEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(sim.update(dt, input));
        }
        all_events
    }

    /// Run one tick per input in `script`, returning all accumulated events.
    pub fn run_script(
        sim: &mut dyn Simulation,
        script: &[InputSnapshot],
        dt: f32,
    ) -> Vec<FeedbackEvent> {
        let mut all_events = Vec::new();
        for input in script {
            all_events.extend(sim.update(dt, input));
        }
        all_events
    }

    // ================================================================
    // Simulation Trait Contract Tests
    // ================================================================
    // Generic checks every Simulation implementation must pass. Simulation
    // crates call them from their own #[cfg(test)] modules.

    /// update() with dt=0 must leave the state byte-identical, however often
    /// it is called and whatever is held.
    pub fn contract_zero_dt_is_noop(sim: &mut dyn Simulation, input: &InputSnapshot) {
        let before = sim.serialize_state();
        for _ in 0..10 {
            let events = sim.update(0.0, input);
            assert!(events.is_empty(), "dt=0 must not emit feedback: {events:?}");
        }
        let after = sim.serialize_state();
        assert_eq!(before, after, "State must not change under dt=0");
    }

    /// pause() must freeze the state, resume() must unfreeze it.
    pub fn contract_pause_stops_updates(sim: &mut dyn Simulation, dt: f32) {
        let idle = InputSnapshot::default();
        sim.pause();
        assert!(sim.is_paused());
        let before = sim.serialize_state();
        sim.update(dt, &idle);
        let during_pause = sim.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        sim.resume();
        assert!(!sim.is_paused());
        sim.update(dt, &idle);
        let after_resume = sim.serialize_state();
        assert_ne!(during_pause, after_resume, "State must change after resume");
    }

    /// serialize_state → apply_state must be stable after one roundtrip.
    pub fn contract_state_roundtrip_preserves(sim: &mut dyn Simulation) {
        let state_a = sim.serialize_state();
        sim.apply_state(&state_a);
        let state_b = sim.serialize_state();
        sim.apply_state(&state_b);
        let state_c = sim.serialize_state();
        assert_eq!(state_a, state_b, "apply_state must restore the snapshot");
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// Garbage bytes, and any extra `snapshots` the caller knows to be
    /// invalid, must not disturb the current state. The simulation must keep
    /// updating afterwards.
    pub fn contract_corrupt_state_ignored(sim: &mut dyn Simulation, snapshots: &[&[u8]]) {
        let before = sim.serialize_state();
        let garbage: &[u8] = &[0xc1, 0xff, 0x00];
        for (i, bytes) in std::iter::once(garbage).chain(snapshots.iter().copied()).enumerate() {
            sim.apply_state(bytes);
            assert_eq!(
                before,
                sim.serialize_state(),
                "Corrupt snapshot {i} must be ignored"
            );
        }
        sim.update(1.0 / 60.0, &InputSnapshot::default());
    }

    /// Two fresh instances fed the same script must end byte-identical.
    pub fn contract_deterministic_replay(
        make: &dyn Fn() -> Box<dyn Simulation>,
        script: &[InputSnapshot],
        dt: f32,
    ) {
        let mut a = make();
        let mut b = make();
        let events_a = run_script(a.as_mut(), script, dt);
        let events_b = run_script(b.as_mut(), script, dt);
        assert_eq!(events_a, events_b, "Replayed feedback must match");
        assert_eq!(
            a.serialize_state(),
            b.serialize_state(),
            "Replayed state must match"
        );
    }

    /// reset() must return the simulation to its freshly constructed state.
    pub fn contract_reset_restores_initial(
        sim: &mut dyn Simulation,
        script: &[InputSnapshot],
        dt: f32,
    ) {
        let initial = sim.serialize_state();
        run_script(sim, script, dt);
        sim.reset();
        assert_eq!(
            initial,
            sim.serialize_state(),
            "reset() must restore the initial state"
        );
    }
}
