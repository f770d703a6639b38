use pounce_core::feedback::{Cue, FeedbackEvent};

use crate::body::{Facing, KinematicBody};
use crate::config::ControllerConfig;

use super::{AbilityState, AbilityTimer, Controls};

impl AbilityState {
    /// Apply the early-release cut, then execute a buffered jump if any jump
    /// condition holds. Returns `true` when a jump fired this tick.
    pub(crate) fn update_jump(
        &mut self,
        body: &mut KinematicBody,
        controls: &Controls,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) -> bool {
        if self.jump_cut_armed && !controls.jump_held && body.velocity.y < 0.0 {
            body.velocity.y *= cfg.jump_cut_multiplier;
            self.jump_cut_armed = false;
        }

        if !self.timers.is_active(AbilityTimer::JumpBuffer) {
            return false;
        }

        let grounded = body.on_ground
            || (self.timers.is_active(AbilityTimer::Coyote) && self.jumps_used == 0);
        let wall_side = if body.on_wall && !body.on_ground {
            body.wall_direction
        } else if self.timers.is_active(AbilityTimer::WallStick) {
            self.last_wall_side
        } else {
            0
        };

        let (cue, mut vy) = if grounded {
            self.jumps_used = 1;
            (Cue::Jump, cfg.jump_strength)
        } else if cfg.wall_jump_enabled && wall_side != 0 {
            let away = -f32::from(wall_side);
            body.velocity.x = away * cfg.wall_jump_x_force;
            if let Some(facing) = Facing::from_sign(away) {
                body.facing = facing;
            }
            body.on_wall = false;
            body.wall_direction = 0;
            self.jumps_used = 1;
            self.locked_wall_side = wall_side;
            self.timers
                .start(AbilityTimer::WallJumpLock, cfg.wall_jump_lock_time);
            self.timers.clear(AbilityTimer::WallStick);
            (Cue::WallJump, cfg.wall_jump_y_force)
        } else if self.jumps_used < cfg.max_jumps {
            self.jumps_used += 1;
            (Cue::DoubleJump, cfg.double_jump_strength)
        } else {
            // Buffer stays armed; it may still fire on landing.
            return false;
        };

        if self.timers.is_active(AbilityTimer::DashJumpWindow) {
            vy *= cfg.dash_jump_height_multiplier;
            body.velocity.x *= cfg.dash_jump_speed_multiplier;
            self.timers.clear(AbilityTimer::DashJumpWindow);
            events.push(FeedbackEvent::PlayCue(Cue::DashJump));
        }

        body.velocity.y = vy;
        body.on_ground = false;
        self.timers.clear(AbilityTimer::JumpBuffer);
        self.timers.clear(AbilityTimer::Coyote);
        self.jump_cut_armed = true;
        self.timers.start(AbilityTimer::JumpCut, cfg.jump_cut_window);
        events.push(FeedbackEvent::PlayCue(cue));
        tracing::trace!(?cue, vy, jumps_used = self.jumps_used, "Jump");
        true
    }

    /// Airborne to grounded.
    pub(crate) fn on_landed(&mut self) {
        self.jumps_used = 0;
        self.jump_cut_armed = false;
        self.timers.clear(AbilityTimer::Coyote);
        self.timers.clear(AbilityTimer::WallStick);
        self.timers.clear(AbilityTimer::JumpCut);
    }

    /// Grounded to airborne without a jump.
    pub(crate) fn on_left_ground(&mut self, cfg: &ControllerConfig) {
        if self.jumps_used != 0 {
            return;
        }
        if cfg.coyote_time > 0.0 {
            self.timers.start(AbilityTimer::Coyote, cfg.coyote_time);
        } else {
            self.forfeit_ground_jump();
        }
    }

    /// Walking off a ledge spends the ground jump once coyote time is over.
    pub(crate) fn forfeit_ground_jump(&mut self) {
        if self.jumps_used == 0 {
            self.jumps_used = 1;
        }
    }
}
