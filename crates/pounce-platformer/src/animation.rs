use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityState, Exclusive};
use crate::body::KinematicBody;

/// Horizontal speed above which a grounded body counts as running.
const RUN_THRESHOLD: f32 = 10.0;
/// Around the apex the previous airborne state is kept while |vy| stays
/// within this band.
const APEX_BAND: f32 = 100.0;

/// What the character is visibly doing after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MovementState {
    #[default]
    Idle,
    Running,
    Jumping,
    Falling,
    WallSliding,
    Dashing,
    GroundPounding,
    LedgeGrabbing,
}

impl MovementState {
    pub const ALL: [MovementState; 8] = [
        MovementState::Idle,
        MovementState::Running,
        MovementState::Jumping,
        MovementState::Falling,
        MovementState::WallSliding,
        MovementState::Dashing,
        MovementState::GroundPounding,
        MovementState::LedgeGrabbing,
    ];

    /// Classify the post-tick state. Ability precedence applies first.
    pub fn classify(body: &KinematicBody, abilities: &AbilityState, previous: Self) -> Self {
        match abilities.exclusive {
            Exclusive::Dashing { .. } => return MovementState::Dashing,
            Exclusive::GroundPounding => return MovementState::GroundPounding,
            Exclusive::LedgeGrabbing(_) => return MovementState::LedgeGrabbing,
            Exclusive::Idle => {},
        }

        if body.on_ground {
            return if body.velocity.x.abs() > RUN_THRESHOLD {
                MovementState::Running
            } else {
                MovementState::Idle
            };
        }
        if abilities.wall_sliding {
            return MovementState::WallSliding;
        }

        let vy = body.velocity.y;
        let airborne_before = matches!(previous, MovementState::Jumping | MovementState::Falling);
        if vy.abs() <= APEX_BAND && airborne_before {
            previous
        } else if vy < 0.0 {
            MovementState::Jumping
        } else {
            MovementState::Falling
        }
    }
}

/// Frame sequences keyed by movement state, resolved once at load time.
///
/// `F` is whatever the renderer uses to name a frame. States without frames
/// fall back to the idle sequence.
#[derive(Debug, Clone)]
pub struct AnimationTable<F> {
    frames: HashMap<MovementState, Vec<F>>,
}

impl<F> Default for AnimationTable<F> {
    fn default() -> Self {
        Self {
            frames: HashMap::new(),
        }
    }
}

impl<F> AnimationTable<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, state: MovementState, frames: Vec<F>) -> Self {
        self.frames.insert(state, frames);
        self
    }

    pub fn insert(&mut self, state: MovementState, frames: Vec<F>) {
        self.frames.insert(state, frames);
    }

    /// Frames for `state`, or the idle frames when it has none.
    pub fn frames(&self, state: MovementState) -> &[F] {
        self.frames
            .get(&state)
            .filter(|f| !f.is_empty())
            .or_else(|| self.frames.get(&MovementState::Idle))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Frame shown `elapsed` seconds into `state` at `fps`, looping.
    pub fn frame_at(&self, state: MovementState, elapsed: f32, fps: f32) -> Option<&F> {
        let frames = self.frames(state);
        if frames.is_empty() || !(elapsed.is_finite() && fps.is_finite()) || fps <= 0.0 {
            return frames.first();
        }
        let index = (elapsed.max(0.0) * fps) as usize % frames.len();
        frames.get(index)
    }

    /// States that will fall back to idle frames.
    pub fn missing_states(&self) -> Vec<MovementState> {
        MovementState::ALL
            .into_iter()
            .filter(|s| self.frames.get(s).is_none_or(|f| f.is_empty()))
            .collect()
    }
}
