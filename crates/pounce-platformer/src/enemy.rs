//! Hostile AI entities: ground walkers and flyers that wander around a patrol
//! centre, chase the last place they saw the player, and shoot on sight.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use pounce_core::feedback::{Cue, EntityId, FeedbackEvent};
use pounce_core::math::{Aabb, Vec2};
use pounce_core::timer::{TimerBank, TimerSlot};

use crate::body::KinematicBody;
use crate::character::SpawnRequest;
use crate::collision::{CollisionParams, move_and_collide};
use crate::config::EnemyConfig;
use crate::level::Level;
use crate::projectile::{Hittable, Team};

/// Spreads consecutive decision counters across the seed space.
const DECISION_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Walks along floors under gravity.
    Ground,
    /// Moves freely in both axes, no gravity.
    Flying,
}

/// An enemy placement in a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub position: Vec2,
    pub kind: EnemyKind,
}

impl EnemySpawn {
    pub fn new(position: Vec2, kind: EnemyKind) -> Self {
        Self { position, kind }
    }
}

/// AI behaviour selected each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EnemyMode {
    #[default]
    Wander,
    /// Heading for the last sighting after losing line of sight.
    Investigate,
    /// Player visible: hold range and shoot.
    Attack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyTimer {
    ShootCooldown,
    /// Time left on the current wander heading.
    WanderChange,
}

impl TimerSlot for EnemyTimer {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub body: KinematicBody,
    pub health: i32,
    pub team: Team,
    pub mode: EnemyMode,
    pub patrol_center: Vec2,
    pub last_seen: Option<Vec2>,
    pub sees_player: bool,
    pub wander_direction: Vec2,
    pub timers: TimerBank<EnemyTimer>,
    seed: u64,
    /// Wander headings picked so far; each one draws from its own seeded rng.
    decisions: u64,
}

impl Enemy {
    /// A fresh enemy whose wander choices derive from `world_seed` and `id`.
    pub fn new(id: u32, spawn: EnemySpawn, world_seed: u64, cfg: &EnemyConfig) -> Self {
        Self {
            id,
            kind: spawn.kind,
            body: KinematicBody::new(spawn.position, cfg.size, cfg.size),
            health: cfg.health,
            team: Team::Hostile,
            mode: EnemyMode::Wander,
            patrol_center: spawn.position,
            last_seen: None,
            sees_player: false,
            wander_direction: Vec2::ZERO,
            timers: TimerBank::new(),
            seed: world_seed ^ (u64::from(id) << 32),
            decisions: 0,
        }
    }

    pub fn entity(&self) -> EntityId {
        EntityId::Enemy(self.id)
    }

    pub fn aabb(&self) -> Aabb {
        self.body.aabb()
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Fell below the respawn line or out of valid space.
    pub fn is_lost(&self, level: &Level) -> bool {
        !self.body.is_finite() || self.body.position.y > level.bounds().respawn_y
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

    /// One AI and physics step. Returns a hostile bullet when the enemy fires.
    pub fn tick(
        &mut self,
        dt: f32,
        player: Vec2,
        level: &Level,
        cfg: &EnemyConfig,
        params: &CollisionParams,
        events: &mut Vec<FeedbackEvent>,
    ) -> Option<SpawnRequest> {
        if dt <= 0.0 || !dt.is_finite() {
            return None;
        }
        self.timers.tick(dt);

        self.sees_player =
            level.line_of_sight(self.body.position, player, cfg.sight_range, cfg.sight_step);
        let mut shot = None;
        if self.sees_player {
            self.last_seen = Some(player);
            self.set_mode(EnemyMode::Attack);
            shot = self.attack(player, cfg, events);
        } else if self.last_seen.is_some() && self.mode != EnemyMode::Wander {
            self.set_mode(EnemyMode::Investigate);
            self.investigate(cfg);
        } else {
            self.set_mode(EnemyMode::Wander);
            self.wander(cfg);
        }

        if self.kind == EnemyKind::Ground {
            self.body.velocity.y =
                (self.body.velocity.y + cfg.gravity * dt).min(cfg.max_fall_speed);
        }
        move_and_collide(&mut self.body, dt, level.obstacles(), params, false);
        self.body.position = level.bounds().wrap(self.body.position);
        shot
    }

    fn set_mode(&mut self, mode: EnemyMode) {
        if self.mode != mode {
            tracing::debug!(id = self.id, from = ?self.mode, to = ?mode, "Enemy mode changed");
            self.mode = mode;
        }
    }

    fn speed(&self, cfg: &EnemyConfig) -> f32 {
        match self.kind {
            EnemyKind::Ground => cfg.ground_speed,
            EnemyKind::Flying => cfg.flying_speed,
        }
    }

    /// Offset to `point` along the axes this kind can steer. Walkers only
    /// steer horizontally.
    fn reach(&self, point: Vec2) -> Vec2 {
        let offset = point - self.body.position;
        match self.kind {
            EnemyKind::Ground => Vec2::new(offset.x, 0.0),
            EnemyKind::Flying => offset,
        }
    }

    /// Walkers keep their falling speed; flyers take the full velocity.
    fn steer(&mut self, velocity: Vec2) {
        match self.kind {
            EnemyKind::Ground => self.body.velocity.x = velocity.x,
            EnemyKind::Flying => self.body.velocity = velocity,
        }
    }

    fn attack(
        &mut self,
        player: Vec2,
        cfg: &EnemyConfig,
        events: &mut Vec<FeedbackEvent>,
    ) -> Option<SpawnRequest> {
        let offset = player - self.body.position;
        let distance = offset.length();
        let toward = offset.normalized();
        let speed = self.speed(cfg);
        let (retreat_distance, retreat_factor) = match self.kind {
            EnemyKind::Ground => (cfg.ground_retreat_distance, cfg.ground_retreat_factor),
            EnemyKind::Flying => (cfg.flying_retreat_distance, cfg.flying_retreat_factor),
        };
        let velocity = if distance > cfg.shoot_range {
            toward * speed
        } else if distance < retreat_distance {
            -toward * (speed * retreat_factor)
        } else {
            Vec2::ZERO
        };
        self.steer(velocity);

        if distance > cfg.shoot_range
            || distance == 0.0
            || self.timers.is_active(EnemyTimer::ShootCooldown)
        {
            return None;
        }
        self.timers
            .start(EnemyTimer::ShootCooldown, cfg.shoot_cooldown);
        events.push(FeedbackEvent::PlayCue(Cue::Fire));
        Some(SpawnRequest::Bullet {
            origin: self.body.position,
            direction: toward,
            owner: self.team,
        })
    }

    fn investigate(&mut self, cfg: &EnemyConfig) {
        let Some(spot) = self.last_seen else {
            return;
        };
        let offset = self.reach(spot);
        if offset.length() > cfg.arrive_distance {
            self.steer(offset.normalized() * (self.speed(cfg) * cfg.investigate_factor));
        } else {
            self.last_seen = None;
            self.steer(Vec2::ZERO);
        }
    }

    fn wander(&mut self, cfg: &EnemyConfig) {
        if !self.timers.is_active(EnemyTimer::WanderChange) {
            self.pick_heading(cfg);
        }
        let factor = match self.kind {
            EnemyKind::Ground => cfg.ground_wander_factor,
            EnemyKind::Flying => cfg.flying_wander_factor,
        };
        let speed = self.speed(cfg) * factor;
        let home = self.reach(self.patrol_center);
        let velocity = if home.length() > cfg.wander_range {
            home.normalized() * speed
        } else {
            self.wander_direction * speed
        };
        self.steer(velocity);
    }

    fn pick_heading(&mut self, cfg: &EnemyConfig) {
        let mut rng =
            StdRng::seed_from_u64(self.seed ^ self.decisions.wrapping_mul(DECISION_STRIDE));
        self.decisions = self.decisions.wrapping_add(1);

        let lo = cfg.wander_interval_min;
        let hi = cfg.wander_interval_max.max(lo);
        let interval = if lo.is_finite() && hi.is_finite() {
            rng.random_range(lo..=hi)
        } else {
            lo
        };
        self.timers.start(EnemyTimer::WanderChange, interval);

        self.wander_direction = if rng.random::<f32>() < cfg.wander_pause_chance {
            Vec2::ZERO
        } else {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            match self.kind {
                EnemyKind::Ground => Vec2::new(angle.cos(), 0.0).normalized(),
                EnemyKind::Flying => Vec2::new(angle.cos(), angle.sin()),
            }
        };
    }
}
