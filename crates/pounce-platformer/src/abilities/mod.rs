//! Ability sub-machines sharing one body and one timer bank.
//!
//! Precedence when several are eligible in the same tick:
//! dash > ground pound > ledge grab > normal (run, jump, fall, wall slide).
//! The three exclusive abilities live in a single [`Exclusive`] slot, so
//! starting one always replaces whichever was active.

mod dash;
mod ground_pound;
mod jump;
mod ledge;
mod run;
mod wall;
mod watchdog;

pub(crate) use run::apply_gravity;

use serde::{Deserialize, Serialize};

use pounce_core::feedback::{Ability, EntityId, FeedbackEvent, Rejection};
use pounce_core::input::{Action, InputSnapshot, InputSource};
use pounce_core::math::Vec2;
use pounce_core::timer::{TimerBank, TimerSlot};

use crate::body::{Facing, KinematicBody};
use crate::config::ControllerConfig;

/// Named slots of the ability timer bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityTimer {
    Coyote,
    JumpBuffer,
    /// Window in which releasing jump cuts the ascent.
    JumpCut,
    Dash,
    DashCooldown,
    Invincibility,
    DashJumpWindow,
    WallStick,
    WallJumpLock,
    LedgeRegrab,
    GroundPoundCooldown,
    SuperBounceBuffer,
    FireCooldown,
    GrenadeCooldown,
}

impl TimerSlot for AbilityTimer {
    const COUNT: usize = 14;

    fn index(self) -> usize {
        self as usize
    }
}

/// A ledge the body is hanging from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ledge {
    /// Top edge of the grabbed obstacle.
    pub top: f32,
    /// The obstacle's vertical edge on the overhanging side.
    pub edge_x: f32,
    pub side: Facing,
}

/// The mutually exclusive abilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Exclusive {
    #[default]
    Idle,
    Dashing {
        direction: Vec2,
    },
    GroundPounding,
    LedgeGrabbing(Ledge),
}

/// Per-tick intent derived from the input snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    /// -1, 0 or 1.
    pub horizontal: f32,
    /// Held 8-way direction, `ZERO` without input.
    pub direction: Vec2,
    pub up_held: bool,
    pub down_held: bool,
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub dash_pressed: bool,
    pub ground_pound_pressed: bool,
    pub fire_pressed: bool,
    pub throw_pressed: bool,
}

impl Controls {
    pub fn from_input(input: &InputSnapshot) -> Self {
        Self {
            horizontal: input.horizontal(),
            direction: input.direction(),
            up_held: input.is_held(Action::MoveUp),
            down_held: input.is_held(Action::MoveDown),
            jump_pressed: input.is_pressed_this_tick(Action::Jump),
            jump_held: input.is_held(Action::Jump),
            dash_pressed: input.is_pressed_this_tick(Action::Dash),
            ground_pound_pressed: input.is_pressed_this_tick(Action::GroundPound),
            fire_pressed: input.is_pressed_this_tick(Action::Fire),
            throw_pressed: input.is_pressed_this_tick(Action::Throw),
        }
    }

    /// Movement intent stripped while the stuck watchdog holds the lock.
    /// Firing and throwing stay available.
    pub fn locked(input: &InputSnapshot) -> Self {
        Self {
            fire_pressed: input.is_pressed_this_tick(Action::Fire),
            throw_pressed: input.is_pressed_this_tick(Action::Throw),
            ..Self::default()
        }
    }
}

/// Ability state owned by one controllable character.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AbilityState {
    pub timers: TimerBank<AbilityTimer>,
    pub jumps_used: u8,
    pub exclusive: Exclusive,
    /// Set by a jump; cleared once the cut has been applied or can no longer apply.
    pub jump_cut_armed: bool,
    /// Side of the latest airborne wall contact, kept for the wall-stick window.
    pub last_wall_side: i8,
    /// Side whose input is ignored while the wall-jump lock runs.
    pub locked_wall_side: i8,
    pub wall_sliding: bool,
    /// Seconds spent airborne at near-zero speed.
    pub stuck_time: f32,
    pub movement_locked: bool,
    /// Entities already struck by the current dash.
    pub struck: Vec<EntityId>,
}

impl AbilityState {
    pub fn is_dashing(&self) -> bool {
        matches!(self.exclusive, Exclusive::Dashing { .. })
    }

    pub fn is_ground_pounding(&self) -> bool {
        self.exclusive == Exclusive::GroundPounding
    }

    pub fn is_ledge_grabbing(&self) -> bool {
        matches!(self.exclusive, Exclusive::LedgeGrabbing(_))
    }

    pub fn is_invincible(&self) -> bool {
        self.timers.is_active(AbilityTimer::Invincibility)
    }

    /// Start the jump buffer, or the super-bounce buffer mid-pound.
    pub(crate) fn buffer_jump(&mut self, cfg: &ControllerConfig) {
        if self.is_ground_pounding() {
            self.timers
                .start(AbilityTimer::SuperBounceBuffer, cfg.super_bounce_buffer);
        } else {
            self.timers
                .start(AbilityTimer::JumpBuffer, cfg.jump_buffer_time);
        }
    }

    /// Advance every timer and run the transitions their expiry triggers.
    pub(crate) fn tick_timers(
        &mut self,
        body: &mut KinematicBody,
        dt: f32,
        cfg: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) {
        let expired = self.timers.tick(dt);
        if expired.contains(AbilityTimer::Dash) && self.is_dashing() {
            self.end_dash(body, cfg);
        }
        if expired.contains(AbilityTimer::Coyote) {
            self.forfeit_ground_jump();
        }
        if expired.contains(AbilityTimer::JumpCut) {
            self.jump_cut_armed = false;
        }
        if expired.contains(AbilityTimer::JumpBuffer) {
            events.push(FeedbackEvent::rejected(Ability::Jump, Rejection::Exhausted));
        }
    }
}
