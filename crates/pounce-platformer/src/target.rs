use serde::{Deserialize, Serialize};

use pounce_core::feedback::EntityId;
use pounce_core::math::{Aabb, Vec2};

use crate::projectile::{Hittable, Team};

/// Edge length of a target's square box.
pub const TARGET_SIZE: f32 = 32.0;
/// Health a target spawns with.
pub const TARGET_HEALTH: i32 = 50;

/// A stationary damageable entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub id: u32,
    pub position: Vec2,
    pub half_extents: Vec2,
    pub health: i32,
    pub team: Team,
}

impl Target {
    pub fn new(id: u32, position: Vec2) -> Self {
        let half = TARGET_SIZE * 0.5;
        Self {
            id,
            position,
            half_extents: Vec2::new(half, half),
            health: TARGET_HEALTH,
            team: Team::Hostile,
        }
    }

    pub fn entity(&self) -> EntityId {
        EntityId::Target(self.id)
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn hittable(&self) -> Hittable {
        Hittable {
            entity: self.entity(),
            aabb: self.aabb(),
            team: self.team,
        }
    }

    /// Apply damage, returning the health left. Never drops below zero.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.health = self.health.saturating_sub(amount.max(0)).max(0);
        self.health
    }
}
