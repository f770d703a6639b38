pub mod abilities;
pub mod animation;
pub mod body;
pub mod character;
pub mod collision;
pub mod config;
pub mod enemy;
pub mod level;
pub mod projectile;
pub mod target;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pounce_core::feedback::{Cue, EntityId, FeedbackEvent};
use pounce_core::input::{InputLatch, InputSnapshot};
use pounce_core::math::Vec2;
use pounce_core::simulation::Simulation;
use pounce_core::time::FixedTimestep;

use character::{Character, SpawnRequest};
use collision::CollisionParams;
use config::SimConfig;
use enemy::Enemy;
use level::{Level, load_level};
use projectile::{DamageEvent, Hittable, ProjectileSet, Team};
use target::Target;

/// Serializable mutable state of one world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldState {
    pub player: Character,
    pub targets: Vec<Target>,
    pub enemies: Vec<Enemy>,
    pub projectiles: ProjectileSet,
    pub tick: u64,
}

impl WorldState {
    pub fn new(level: &Level, cfg: &SimConfig) -> Self {
        let targets = level
            .target_spawns()
            .iter()
            .enumerate()
            .map(|(i, &pos)| Target::new(i as u32, pos))
            .collect();
        let enemies = level
            .enemy_spawns()
            .iter()
            .enumerate()
            .map(|(i, &spawn)| Enemy::new(i as u32, spawn, cfg.world.seed, &cfg.enemies))
            .collect();
        Self {
            player: Character::player(level.spawn(), cfg),
            targets,
            enemies,
            projectiles: ProjectileSet::default(),
            tick: 0,
        }
    }
}

/// One player with its targets, enemies and projectiles over a shared
/// immutable level.
pub struct World {
    level: Arc<Level>,
    config: SimConfig,
    state: WorldState,
    paused: bool,
    timestep: FixedTimestep,
    latch: InputLatch,
}

impl World {
    pub fn new(level: Arc<Level>, config: SimConfig) -> Self {
        let state = WorldState::new(&level, &config);
        let timestep = FixedTimestep::new(config.world.tick_rate_hz)
            .with_max_steps(config.world.max_steps_per_frame);
        Self {
            level,
            config,
            state,
            paused: false,
            timestep,
            latch: InputLatch::new(),
        }
    }

    /// The showcase level with default tuning.
    pub fn demo() -> Self {
        Self::new(Arc::new(Level::demo()), SimConfig::default())
    }

    /// Level and config from `POUNCE_LEVEL` / `POUNCE_CONFIG`, with fallbacks.
    pub fn from_env() -> Self {
        let config = SimConfig::load();
        tracing::info!(
            tick_rate_hz = config.world.tick_rate_hz,
            "Loaded simulation config"
        );
        Self::new(Arc::new(load_level()), config)
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn player(&self) -> &Character {
        &self.state.player
    }

    /// Fraction of a fixed step left over, for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }

    /// Inject a bullet from outside the simulation.
    pub fn spawn_bullet(&mut self, origin: Vec2, direction: Vec2, owner: Team) {
        self.state
            .projectiles
            .spawn_bullet(origin, direction, owner, &self.config.projectiles);
    }

    /// Feed one measured frame. Runs as many fixed steps as are due; presses
    /// made in `frame` reach the first of them, or a later frame's first
    /// step when none is due yet.
    pub fn advance(&mut self, elapsed: f32, frame: &InputSnapshot) -> Vec<FeedbackEvent> {
        self.latch.record(frame);
        if self.paused {
            return Vec::new();
        }
        let mut events = Vec::new();
        let dt = self.timestep.step();
        for _ in 0..self.timestep.accumulate(elapsed) {
            let input = self.latch.take();
            self.step(dt, &input, &mut events);
        }
        events
    }

    fn step(&mut self, dt: f32, input: &InputSnapshot, events: &mut Vec<FeedbackEvent>) {
        let cfg = &self.config;
        let state = &mut self.state;

        let mut spawns = state.player.tick(dt, input, &self.level, cfg, events);

        // Enemies react to where the player ended this tick
        let player_position = state.player.body.position;
        let params = CollisionParams::from_controller(&cfg.controller);
        for enemy in &mut state.enemies {
            spawns.extend(enemy.tick(
                dt,
                player_position,
                &self.level,
                &cfg.enemies,
                &params,
                events,
            ));
        }
        for spawn in spawns {
            match spawn {
                SpawnRequest::Bullet {
                    origin,
                    direction,
                    owner,
                } => state
                    .projectiles
                    .spawn_bullet(origin, direction, owner, &cfg.projectiles),
                SpawnRequest::Grenade {
                    origin,
                    velocity,
                    owner,
                } => state
                    .projectiles
                    .spawn_grenade(origin, velocity, owner, &cfg.projectiles),
            }
        }

        let hittables: Vec<Hittable> = std::iter::once(state.player.hittable())
            .chain(state.targets.iter().filter(|t| t.is_alive()).map(Target::hittable))
            .chain(state.enemies.iter().filter(|e| e.is_alive()).map(Enemy::hittable))
            .collect();

        let mut damage = Vec::new();
        if let Some(strike) = state.player.dash_strike_box() {
            let player = &mut state.player;
            for hit in &hittables {
                if hit.team != player.team
                    && !player.abilities.struck.contains(&hit.entity)
                    && strike.intersects(&hit.aabb, collision::COLLISION_EPSILON)
                {
                    player.abilities.struck.push(hit.entity);
                    damage.push(DamageEvent {
                        target: hit.entity,
                        amount: cfg.controller.dash_strike_damage,
                    });
                }
            }
        }

        damage.extend(
            state
                .projectiles
                .update(dt, &self.level, &hittables, &cfg.projectiles, events),
        );

        for hit in damage {
            let remaining = match hit.target {
                EntityId::Player => {
                    state.player.take_damage(hit.amount, cfg, events);
                    continue;
                },
                EntityId::Target(id) => state
                    .targets
                    .iter_mut()
                    .find(|t| t.id == id && t.is_alive())
                    .map(|t| t.take_damage(hit.amount)),
                EntityId::Enemy(id) => state
                    .enemies
                    .iter_mut()
                    .find(|e| e.id == id && e.is_alive())
                    .map(|e| e.take_damage(hit.amount)),
            };
            let Some(remaining) = remaining else {
                continue;
            };
            events.push(FeedbackEvent::Damaged {
                entity: hit.target,
                amount: hit.amount,
                remaining,
            });
            events.push(FeedbackEvent::PlayCue(Cue::Hit));
            if remaining == 0 {
                tracing::debug!(entity = ?hit.target, "Destroyed");
                events.push(FeedbackEvent::Destroyed { entity: hit.target });
            }
        }

        state.targets.retain(Target::is_alive);
        let level = &self.level;
        state.enemies.retain(|e| {
            let lost = e.is_lost(level);
            if lost {
                tracing::debug!(id = e.id, "Enemy left the world");
            }
            e.is_alive() && !lost
        });
        state.projectiles.sweep_inactive();
        state.tick += 1;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::demo()
    }
}

impl Simulation for World {
    fn update(&mut self, dt: f32, input: &InputSnapshot) -> Vec<FeedbackEvent> {
        if self.paused || !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.step(dt, input, &mut events);
        events
    }

    fn reset(&mut self) {
        self.state = WorldState::new(&self.level, &self.config);
        self.latch = InputLatch::new();
        self.timestep = FixedTimestep::new(self.config.world.tick_rate_hz)
            .with_max_steps(self.config.world.max_steps_per_frame);
    }

    fn tick_rate(&self) -> f32 {
        self.config.world.tick_rate_hz
    }

    pounce_core::simulation_boilerplate!(state_type: WorldState);
}
