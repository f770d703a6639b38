use pounce_core::feedback::{Ability, Cue, FeedbackEvent, ParticleKind, Rejection};
use pounce_core::math::Vec2;

use crate::body::KinematicBody;
use crate::collision::height_above_ground;
use crate::config::ControllerConfig;
use crate::level::Level;

use super::{AbilityState, AbilityTimer, Controls, Exclusive};

impl AbilityState {
    /// Start a ground pound when airborne, off cooldown and high enough.
    ///
    /// With nothing at all below the body the height gate passes.
    pub(crate) fn try_ground_pound(
        &mut self,
        body: &mut KinematicBody,
        level: &Level,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) -> bool {
        let rejection = if !cfg.ground_pound_enabled {
            Some(Rejection::Disabled)
        } else if self.is_ground_pounding() {
            Some(Rejection::AlreadyActive)
        } else if self.is_dashing() {
            Some(Rejection::Busy)
        } else if body.on_ground {
            Some(Rejection::Grounded)
        } else if self.timers.is_active(AbilityTimer::GroundPoundCooldown) {
            Some(Rejection::OnCooldown)
        } else {
            height_above_ground(&body.aabb(), level, cfg.height_probe_margin)
                .filter(|&height| height < cfg.ground_pound_min_height)
                .map(|height| Rejection::TooLow {
                    height,
                    required: cfg.ground_pound_min_height,
                })
        };
        if let Some(reason) = rejection {
            events.push(FeedbackEvent::rejected(Ability::GroundPound, reason));
            return false;
        }

        self.exclusive = Exclusive::GroundPounding;
        self.wall_sliding = false;
        self.jump_cut_armed = false;
        self.timers.clear(AbilityTimer::SuperBounceBuffer);
        self.timers.clear(AbilityTimer::JumpBuffer);
        body.velocity = Vec2::new(0.0, cfg.ground_pound_speed);
        events.push(FeedbackEvent::PlayCue(Cue::GroundPound));
        tracing::debug!(y = body.position.y, "Ground pound started");
        true
    }

    /// Fixed descent; gravity does not apply.
    pub(crate) fn hold_ground_pound(&self, body: &mut KinematicBody, cfg: &ControllerConfig) {
        body.velocity = Vec2::new(0.0, cfg.ground_pound_speed);
    }

    /// Floor contact while pounding: bounce, add held momentum, shake.
    pub(crate) fn ground_pound_impact(
        &mut self,
        body: &mut KinematicBody,
        controls: &Controls,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) {
        let super_bounce = self.timers.is_active(AbilityTimer::SuperBounceBuffer);
        let multiplier = if super_bounce {
            cfg.super_bounce_multiplier
        } else {
            1.0
        };
        body.velocity.y = cfg.ground_pound_bounce * multiplier;
        if controls.horizontal != 0.0 {
            let cap = cfg.ground_pound_max_momentum;
            body.velocity.x = (controls.horizontal
                * cfg.ground_pound_momentum_boost
                * cfg.ground_max_speed)
                .clamp(-cap, cap);
        }
        body.on_ground = false;

        self.exclusive = Exclusive::Idle;
        self.on_landed();
        self.timers.clear(AbilityTimer::SuperBounceBuffer);
        self.timers
            .start(AbilityTimer::GroundPoundCooldown, cfg.ground_pound_cooldown);

        events.push(FeedbackEvent::ScreenShake {
            intensity: cfg.ground_pound_shake_intensity,
            duration: cfg.ground_pound_shake_duration,
        });
        events.push(FeedbackEvent::particles(
            ParticleKind::GroundPoundImpact,
            Vec2::new(body.position.x, body.bottom()),
            Vec2::new(0.0, -1.0),
        ));
        events.push(FeedbackEvent::PlayCue(if super_bounce {
            Cue::SuperBounce
        } else {
            Cue::Land
        }));
        tracing::debug!(super_bounce, vy = body.velocity.y, "Ground pound impact");
    }
}
