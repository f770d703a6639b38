use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Identifies a damageable entity within one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    Player,
    Target(u32),
    Enemy(u32),
}

/// Particle effects the renderer may spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Landing,
    Dash,
    WallSlide,
    GroundPoundImpact,
    Explosion,
    Spark,
}

/// Audio or visual cues with no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    Jump,
    DoubleJump,
    WallJump,
    DashJump,
    Dash,
    GroundPound,
    SuperBounce,
    Land,
    LedgeGrab,
    LedgeClimb,
    Fire,
    Throw,
    Hit,
    Hurt,
    Respawn,
}

/// Abilities that can be attempted and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    Jump,
    Dash,
    GroundPound,
    LedgeGrab,
    Fire,
    Throw,
}

/// Why an ability attempt was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    Disabled,
    OnCooldown,
    AlreadyActive,
    Grounded,
    TooLow { height: f32, required: f32 },
    /// Another exclusive ability already owns the body.
    Busy,
    /// No jumps left before landing.
    Exhausted,
    NoAmmo,
    MovementLocked,
}

/// Fire-and-forget output of a simulation tick.
///
/// Rendering, audio and camera collaborators consume these; the core never
/// waits on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedbackEvent {
    SpawnParticles {
        kind: ParticleKind,
        position: Vec2,
        direction: Vec2,
    },
    ScreenShake {
        intensity: f32,
        duration: f32,
    },
    PlayCue(Cue),
    AbilityRejected {
        ability: Ability,
        reason: Rejection,
    },
    /// The stuck watchdog locked movement input.
    MovementLocked {
        entity: EntityId,
    },
    MovementUnlocked {
        entity: EntityId,
    },
    Respawned {
        entity: EntityId,
        position: Vec2,
    },
    Damaged {
        entity: EntityId,
        amount: i32,
        remaining: i32,
    },
    Destroyed {
        entity: EntityId,
    },
    Detonated {
        position: Vec2,
        radius: f32,
    },
}

impl FeedbackEvent {
    pub fn particles(kind: ParticleKind, position: Vec2, direction: Vec2) -> Self {
        Self::SpawnParticles {
            kind,
            position,
            direction,
        }
    }

    pub fn rejected(ability: Ability, reason: Rejection) -> Self {
        Self::AbilityRejected { ability, reason }
    }
}
