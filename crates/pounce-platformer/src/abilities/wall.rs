use pounce_core::feedback::{FeedbackEvent, ParticleKind};
use pounce_core::math::Vec2;

use crate::body::KinematicBody;
use crate::config::ControllerConfig;

use super::{AbilityState, AbilityTimer};

impl AbilityState {
    /// Cap the fall speed while pressed against a wall in the air.
    pub(crate) fn apply_wall_slide(
        &mut self,
        body: &mut KinematicBody,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) {
        let sliding = cfg.wall_jump_enabled
            && body.on_wall
            && !body.on_ground
            && body.velocity.y > 0.0;
        if sliding {
            body.velocity.y = body.velocity.y.min(cfg.wall_slide_speed);
            if !self.wall_sliding {
                let side = f32::from(body.wall_direction);
                events.push(FeedbackEvent::particles(
                    ParticleKind::WallSlide,
                    Vec2::new(body.position.x + side * body.half_extents.x, body.position.y),
                    Vec2::new(-side, 0.0),
                ));
            }
        }
        self.wall_sliding = sliding;
    }

    /// Lateral contact while airborne opens the wall-stick window.
    pub(crate) fn on_wall_contact(&mut self, body: &KinematicBody, cfg: &ControllerConfig) {
        if body.on_wall && !body.on_ground && body.wall_direction != 0 {
            self.last_wall_side = body.wall_direction;
            self.timers.start(AbilityTimer::WallStick, cfg.wall_stick_time);
        }
    }
}
