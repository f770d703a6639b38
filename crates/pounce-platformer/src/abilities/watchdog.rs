use pounce_core::feedback::{EntityId, FeedbackEvent};

use crate::body::KinematicBody;
use crate::config::ControllerConfig;

use super::{AbilityState, Exclusive};

impl AbilityState {
    /// Track time spent airborne at near-zero speed and lock movement input
    /// once it passes the threshold.
    pub(crate) fn update_watchdog(
        &mut self,
        body: &KinematicBody,
        entity: EntityId,
        dt: f32,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) {
        let threshold = cfg.stuck_speed_threshold;
        let stalled = !body.on_ground
            && self.exclusive == Exclusive::Idle
            && body.velocity.x.abs() < threshold
            && body.velocity.y.abs() < threshold;
        if !stalled {
            self.stuck_time = 0.0;
            return;
        }

        self.stuck_time += dt;
        if !self.movement_locked && self.stuck_time > cfg.stuck_time_threshold {
            self.movement_locked = true;
            tracing::warn!(
                x = body.position.x,
                y = body.position.y,
                "Body stuck in the air, locking movement input"
            );
            events.push(FeedbackEvent::MovementLocked { entity });
        }
    }

    /// Explicit reset input clears the lock.
    pub(crate) fn unlock_movement(&mut self, entity: EntityId, events: &mut Vec<FeedbackEvent>) {
        if self.movement_locked {
            self.movement_locked = false;
            self.stuck_time = 0.0;
            events.push(FeedbackEvent::MovementUnlocked { entity });
        }
    }
}
