use crate::body::KinematicBody;
use crate::config::ControllerConfig;

use super::{AbilityState, AbilityTimer, Controls};

/// Move `value` toward `target` by at most `step`.
fn approach(value: f32, target: f32, step: f32) -> f32 {
    if value < target {
        (value + step).min(target)
    } else {
        (value - step).max(target)
    }
}

impl AbilityState {
    /// Accelerate toward the held direction, or decelerate toward rest.
    pub(crate) fn apply_run(
        &self,
        body: &mut KinematicBody,
        controls: &Controls,
        dt: f32,
        cfg: &ControllerConfig,
    ) {
        let mut horizontal = controls.horizontal;
        // Momentum lock after a wall jump
        if self.timers.is_active(AbilityTimer::WallJumpLock)
            && horizontal * f32::from(self.locked_wall_side) > 0.0
        {
            horizontal = 0.0;
        }

        let (acceleration, friction, max_speed) = if body.on_ground {
            (
                cfg.ground_acceleration,
                cfg.ground_friction,
                cfg.ground_max_speed,
            )
        } else {
            (cfg.air_acceleration, cfg.air_friction, cfg.air_max_speed)
        };

        body.velocity.x = if horizontal != 0.0 {
            approach(body.velocity.x, horizontal * max_speed, acceleration * dt)
        } else {
            approach(body.velocity.x, 0.0, friction * dt)
        };
    }
}

/// Gravity, scaled up while fast-falling, capped at terminal speed.
pub(crate) fn apply_gravity(
    body: &mut KinematicBody,
    controls: &Controls,
    dt: f32,
    cfg: &ControllerConfig,
) {
    let mut gravity = cfg.gravity;
    if !body.on_ground && body.velocity.y > 0.0 && controls.down_held {
        gravity *= cfg.fast_fall_multiplier;
    }
    body.velocity.y = (body.velocity.y + gravity * dt).min(cfg.max_fall_speed);
}
