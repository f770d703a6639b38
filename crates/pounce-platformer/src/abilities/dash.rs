use pounce_core::feedback::{Ability, Cue, FeedbackEvent, ParticleKind, Rejection};
use pounce_core::math::Vec2;

use crate::body::{Facing, KinematicBody};
use crate::config::ControllerConfig;

use super::{AbilityState, AbilityTimer, Controls, Exclusive};

impl AbilityState {
    /// Start a dash along the held direction, or along facing without input.
    ///
    /// Cancels a ground pound or ledge grab in progress.
    pub(crate) fn try_dash(
        &mut self,
        body: &mut KinematicBody,
        controls: &Controls,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) -> bool {
        let rejection = if !cfg.dash_enabled || cfg.dash_duration <= 0.0 {
            Some(Rejection::Disabled)
        } else if self.is_dashing() {
            Some(Rejection::AlreadyActive)
        } else if self.timers.is_active(AbilityTimer::DashCooldown) {
            Some(Rejection::OnCooldown)
        } else {
            None
        };
        if let Some(reason) = rejection {
            events.push(FeedbackEvent::rejected(Ability::Dash, reason));
            return false;
        }

        let direction = if controls.direction == Vec2::ZERO {
            Vec2::new(body.facing.sign(), 0.0)
        } else {
            controls.direction
        };
        if let Some(facing) = Facing::from_sign(direction.x) {
            body.facing = facing;
        }

        // A pound cancelled by a dash never bounces
        self.timers.clear(AbilityTimer::SuperBounceBuffer);
        self.timers.clear(AbilityTimer::DashJumpWindow);
        self.exclusive = Exclusive::Dashing { direction };
        self.wall_sliding = false;
        self.struck.clear();
        body.velocity = direction * cfg.dash_speed;

        self.timers.start(AbilityTimer::Dash, cfg.dash_duration);
        self.timers.start(AbilityTimer::DashCooldown, cfg.dash_cooldown);
        self.timers
            .extend(AbilityTimer::Invincibility, cfg.dash_invincibility_time);

        events.push(FeedbackEvent::PlayCue(Cue::Dash));
        events.push(FeedbackEvent::particles(
            ParticleKind::Dash,
            body.position,
            -direction,
        ));
        tracing::debug!(x = direction.x, y = direction.y, "Dash started");
        true
    }

    /// Hold the dash velocity for the current tick. Gravity does not apply.
    pub(crate) fn hold_dash(&self, body: &mut KinematicBody, cfg: &ControllerConfig) {
        if let Exclusive::Dashing { direction } = self.exclusive {
            body.velocity = direction * cfg.dash_speed;
        }
    }

    /// Damp the burst and open the dash-jump window.
    pub(crate) fn end_dash(&mut self, body: &mut KinematicBody, cfg: &ControllerConfig) {
        body.velocity = body.velocity * cfg.dash_end_damping;
        self.exclusive = Exclusive::Idle;
        self.timers.clear(AbilityTimer::Dash);
        self.timers
            .start(AbilityTimer::DashJumpWindow, cfg.dash_jump_window);
        tracing::debug!("Dash ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (AbilityState, KinematicBody, ControllerConfig) {
        let body = KinematicBody::new(Vec2::new(100.0, 100.0), 32.0, 48.0);
        (AbilityState::default(), body, ControllerConfig::default())
    }

    #[test]
    fn dash_without_input_follows_facing() {
        let (mut state, mut body, cfg) = setup();
        body.facing = Facing::Left;
        let mut events = Vec::new();
        assert!(state.try_dash(&mut body, &Controls::default(), &cfg, &mut events));
        assert_eq!(body.velocity, Vec2::new(-cfg.dash_speed, 0.0));
        assert!(state.is_dashing());
        assert!(state.is_invincible());
        assert!(events.contains(&FeedbackEvent::PlayCue(Cue::Dash)));
    }

    #[test]
    fn diagonal_dash_is_normalized() {
        let (mut state, mut body, cfg) = setup();
        let controls = Controls {
            direction: Vec2::new(1.0, -1.0).normalized(),
            ..Controls::default()
        };
        let mut events = Vec::new();
        state.try_dash(&mut body, &controls, &cfg, &mut events);
        assert!((body.velocity.length() - cfg.dash_speed).abs() < 1e-2);
        assert!(body.velocity.x > 0.0 && body.velocity.y < 0.0);
    }

    #[test]
    fn dash_rejections() {
        let (mut state, mut body, cfg) = setup();
        let mut events = Vec::new();
        state.try_dash(&mut body, &Controls::default(), &cfg, &mut events);
        events.clear();

        assert!(!state.try_dash(&mut body, &Controls::default(), &cfg, &mut events));
        assert_eq!(
            events,
            vec![FeedbackEvent::rejected(Ability::Dash, Rejection::AlreadyActive)]
        );

        state.end_dash(&mut body, &cfg);
        events.clear();
        assert!(!state.try_dash(&mut body, &Controls::default(), &cfg, &mut events));
        assert_eq!(
            events,
            vec![FeedbackEvent::rejected(Ability::Dash, Rejection::OnCooldown)]
        );

        let disabled = ControllerConfig {
            dash_enabled: false,
            ..ControllerConfig::default()
        };
        let mut fresh = AbilityState::default();
        events.clear();
        assert!(!fresh.try_dash(&mut body, &Controls::default(), &disabled, &mut events));
        assert_eq!(
            events,
            vec![FeedbackEvent::rejected(Ability::Dash, Rejection::Disabled)]
        );
    }

    #[test]
    fn dash_cancels_ground_pound() {
        let (mut state, mut body, cfg) = setup();
        state.exclusive = Exclusive::GroundPounding;
        state.timers.start(AbilityTimer::SuperBounceBuffer, 0.2);
        let mut events = Vec::new();
        state.try_dash(&mut body, &Controls::default(), &cfg, &mut events);
        assert!(state.is_dashing());
        assert!(!state.is_ground_pounding());
        assert!(!state.timers.is_active(AbilityTimer::SuperBounceBuffer));
    }

    #[test]
    fn dash_end_damps_instead_of_stopping() {
        let (mut state, mut body, cfg) = setup();
        let mut events = Vec::new();
        state.try_dash(&mut body, &Controls::default(), &cfg, &mut events);
        state.end_dash(&mut body, &cfg);
        assert_eq!(body.velocity.x, cfg.dash_speed * cfg.dash_end_damping);
        assert_eq!(state.exclusive, Exclusive::Idle);
        assert!(state.timers.is_active(AbilityTimer::DashJumpWindow));
    }
}
