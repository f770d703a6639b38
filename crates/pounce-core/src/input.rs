use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// A logical action, independent of the device that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Jump,
    Dash,
    GroundPound,
    Fire,
    Throw,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::Jump,
        Action::Dash,
        Action::GroundPound,
        Action::Fire,
        Action::Throw,
    ];

    pub const fn flag(self) -> Actions {
        match self {
            Action::MoveLeft => Actions::MOVE_LEFT,
            Action::MoveRight => Actions::MOVE_RIGHT,
            Action::MoveUp => Actions::MOVE_UP,
            Action::MoveDown => Actions::MOVE_DOWN,
            Action::Jump => Actions::JUMP,
            Action::Dash => Actions::DASH,
            Action::GroundPound => Actions::GROUND_POUND,
            Action::Fire => Actions::FIRE,
            Action::Throw => Actions::THROW,
        }
    }
}

bitflags::bitflags! {
    /// Set of logical actions, one bit each.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Actions: u16 {
        const MOVE_LEFT    = 1 << 0;
        const MOVE_RIGHT   = 1 << 1;
        const MOVE_UP      = 1 << 2;
        const MOVE_DOWN    = 1 << 3;
        const JUMP         = 1 << 4;
        const DASH         = 1 << 5;
        const GROUND_POUND = 1 << 6;
        const FIRE         = 1 << 7;
        const THROW        = 1 << 8;
    }
}

/// Anything that can answer held/pressed queries for logical actions.
///
/// Device layers implement this; the simulation only ever sees an
/// [`InputSnapshot`] captured from it.
pub trait InputSource {
    fn is_held(&self, action: Action) -> bool;
    fn is_pressed_this_tick(&self, action: Action) -> bool;
}

/// Resolved input for one tick.
///
/// `pressed` holds the actions whose press edge landed in this tick. A press
/// always implies held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub held: Actions,
    pub pressed: Actions,
}

impl InputSnapshot {
    pub fn new(held: Actions, pressed: Actions) -> Self {
        Self {
            held: held | pressed,
            pressed,
        }
    }

    /// Capture the current state of an input source.
    pub fn capture(source: &impl InputSource) -> Self {
        let mut snap = Self::default();
        for action in Action::ALL {
            if source.is_held(action) {
                snap.held |= action.flag();
            }
            if source.is_pressed_this_tick(action) {
                snap.pressed |= action.flag();
                snap.held |= action.flag();
            }
        }
        snap
    }

    pub fn with_held(mut self, action: Action) -> Self {
        self.held |= action.flag();
        self
    }

    pub fn with_pressed(mut self, action: Action) -> Self {
        self.pressed |= action.flag();
        self.held |= action.flag();
        self
    }

    /// The same snapshot with every press edge removed.
    pub fn held_only(self) -> Self {
        Self {
            held: self.held,
            pressed: Actions::empty(),
        }
    }

    /// Horizontal intent in {-1, 0, 1}. Opposing directions cancel.
    pub fn horizontal(&self) -> f32 {
        axis(
            self.held.contains(Actions::MOVE_LEFT),
            self.held.contains(Actions::MOVE_RIGHT),
        )
    }

    /// Vertical intent in {-1, 0, 1}; up is negative.
    pub fn vertical(&self) -> f32 {
        axis(
            self.held.contains(Actions::MOVE_UP),
            self.held.contains(Actions::MOVE_DOWN),
        )
    }

    /// Held movement as an 8-way unit vector, or `ZERO` with no input.
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.horizontal(), self.vertical()).normalized()
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

impl InputSource for InputSnapshot {
    fn is_held(&self, action: Action) -> bool {
        self.held.contains(action.flag())
    }

    fn is_pressed_this_tick(&self, action: Action) -> bool {
        self.pressed.contains(action.flag())
    }
}

/// Collects device frames between simulation ticks.
///
/// Press edges accumulate until [`InputLatch::take`] hands them to a tick, so a
/// tap that starts and ends between two fixed steps is never lost.
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    held: Actions,
    pending: Actions,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one polled frame. Held state is replaced; presses are OR'd.
    pub fn record(&mut self, frame: &InputSnapshot) {
        self.held = frame.held;
        self.pending |= frame.pressed;
    }

    /// Snapshot for the next tick, clearing the accumulated presses.
    pub fn take(&mut self) -> InputSnapshot {
        let snap = InputSnapshot::new(self.held, self.pending);
        self.pending = Actions::empty();
        snap
    }
}
