use serde::{Deserialize, Serialize};

use pounce_core::math::{Aabb, Vec2};

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing for a signed horizontal intent, `None` when it is zero.
    pub fn from_sign(x: f32) -> Option<Self> {
        if x < 0.0 {
            Some(Facing::Left)
        } else if x > 0.0 {
            Some(Facing::Right)
        } else {
            None
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Position, velocity and contact state of a box-shaped body.
///
/// `position` is the box center. The bounding box is always derived from it,
/// so the two can never drift apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KinematicBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub half_extents: Vec2,
    pub facing: Facing,
    pub on_ground: bool,
    pub on_wall: bool,
    /// Side of the touching wall: -1 left, 1 right, 0 none.
    pub wall_direction: i8,
    pub on_ceiling: bool,
}

impl KinematicBody {
    pub fn new(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            half_extents: Vec2::new(width * 0.5, height * 0.5),
            facing: Facing::Right,
            on_ground: false,
            on_wall: false,
            wall_direction: 0,
            on_ceiling: false,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.half_extents.y
    }

    /// Move to `position` at rest with every contact cleared.
    pub fn teleport(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.clear_contacts();
    }

    pub fn clear_contacts(&mut self) {
        self.on_ground = false;
        self.on_wall = false;
        self.wall_direction = 0;
        self.on_ceiling = false;
    }

    /// Clamp horizontal speed to `max_speed` and downward speed to
    /// `max_fall_speed`. Upward speed is left alone.
    pub fn clamp_velocity(&mut self, max_speed: f32, max_fall_speed: f32) {
        self.velocity.x = self.velocity.x.clamp(-max_speed, max_speed);
        if self.velocity.y > max_fall_speed {
            self.velocity.y = max_fall_speed;
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}
