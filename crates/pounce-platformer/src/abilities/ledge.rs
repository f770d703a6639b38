use pounce_core::feedback::{Cue, FeedbackEvent};
use pounce_core::math::{Aabb, Vec2};

use crate::body::{Facing, KinematicBody};
use crate::config::ControllerConfig;

use super::{AbilityState, AbilityTimer, Controls, Exclusive, Ledge};

/// Gap left between the body and the obstacle edge after dropping off.
const DROP_CLEARANCE: f32 = 0.5;

impl AbilityState {
    /// On landing, hang from `platform` when the sensor ahead of the body is
    /// past its edge.
    pub(crate) fn try_ledge_grab(
        &mut self,
        body: &mut KinematicBody,
        platform: &Aabb,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) -> bool {
        if !cfg.ledge_grab_enabled
            || self.exclusive != Exclusive::Idle
            || self.timers.is_active(AbilityTimer::LedgeRegrab)
        {
            return false;
        }

        let reach = body.half_extents.x + cfg.ledge_probe_offset;
        let sensor_x = body.position.x + body.facing.sign() * reach;
        let edge_x = match body.facing {
            Facing::Right if sensor_x > platform.right() + cfg.ledge_overhang => platform.right(),
            Facing::Left if sensor_x < platform.left() - cfg.ledge_overhang => platform.left(),
            _ => return false,
        };

        self.exclusive = Exclusive::LedgeGrabbing(Ledge {
            top: platform.top(),
            edge_x,
            side: body.facing,
        });
        body.velocity = Vec2::ZERO;
        body.on_ground = false;
        events.push(FeedbackEvent::PlayCue(Cue::LedgeGrab));
        tracing::debug!(edge_x, top = platform.top(), "Ledge grabbed");
        true
    }

    /// While hanging: climb on up or jump, drop on down, otherwise stay frozen.
    pub(crate) fn update_ledge(
        &mut self,
        body: &mut KinematicBody,
        controls: &Controls,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) {
        let Exclusive::LedgeGrabbing(ledge) = self.exclusive else {
            return;
        };
        body.velocity = Vec2::ZERO;

        if controls.up_held || controls.jump_pressed {
            let inward = -ledge.side.sign();
            body.position = Vec2::new(
                ledge.edge_x + inward * (body.half_extents.x + cfg.ledge_climb_inset),
                ledge.top - body.half_extents.y,
            );
            body.on_ground = true;
            self.exclusive = Exclusive::Idle;
            self.jumps_used = 0;
            self.timers.clear(AbilityTimer::JumpBuffer);
            self.timers
                .start(AbilityTimer::LedgeRegrab, cfg.ledge_regrab_delay);
            events.push(FeedbackEvent::PlayCue(Cue::LedgeClimb));
            tracing::debug!(x = body.position.x, "Ledge climbed");
        } else if controls.down_held {
            body.position.x =
                ledge.edge_x + ledge.side.sign() * (body.half_extents.x + DROP_CLEARANCE);
            body.on_ground = false;
            self.exclusive = Exclusive::Idle;
            self.timers
                .start(AbilityTimer::LedgeRegrab, cfg.ledge_regrab_delay);
            tracing::debug!("Ledge released");
        }
    }
}
