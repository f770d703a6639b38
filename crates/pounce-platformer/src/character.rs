use serde::{Deserialize, Serialize};

use pounce_core::feedback::{Ability, Cue, EntityId, FeedbackEvent, ParticleKind, Rejection};
use pounce_core::input::{Action, InputSnapshot, InputSource};
use pounce_core::math::{Aabb, Vec2};

use crate::abilities::{AbilityState, AbilityTimer, Controls, Exclusive, apply_gravity};
use crate::animation::MovementState;
use crate::body::{Facing, KinematicBody};
use crate::collision::{CollisionParams, MoveReport, move_and_collide};
use crate::config::{ControllerConfig, ProjectileConfig, SimConfig};
use crate::level::Level;
use crate::projectile::{Hittable, Team, throw_velocity};

/// Projectile the character asked to launch this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnRequest {
    Bullet {
        origin: Vec2,
        direction: Vec2,
        owner: Team,
    },
    Grenade {
        origin: Vec2,
        velocity: Vec2,
        owner: Team,
    },
}

/// A controllable character: body, abilities and vitals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Character {
    pub id: EntityId,
    pub team: Team,
    pub body: KinematicBody,
    pub abilities: AbilityState,
    pub health: i32,
    pub grenades: u8,
    pub spawn: Vec2,
    pub movement_state: MovementState,
}

impl Character {
    pub fn new(id: EntityId, team: Team, spawn: Vec2, cfg: &SimConfig) -> Self {
        Self {
            id,
            team,
            body: KinematicBody::new(
                spawn,
                cfg.controller.body_width,
                cfg.controller.body_height,
            ),
            abilities: AbilityState::default(),
            health: cfg.controller.max_health,
            grenades: cfg.projectiles.max_grenades,
            spawn,
            movement_state: MovementState::Idle,
        }
    }

    pub fn player(spawn: Vec2, cfg: &SimConfig) -> Self {
        Self::new(EntityId::Player, Team::Player, spawn, cfg)
    }

    pub fn is_invincible(&self) -> bool {
        self.abilities.is_invincible()
    }

    pub fn hittable(&self) -> Hittable {
        Hittable {
            entity: self.id,
            aabb: self.body.aabb(),
            team: self.team,
        }
    }

    /// The body's box while a dash is active.
    pub fn dash_strike_box(&self) -> Option<Aabb> {
        self.abilities.is_dashing().then(|| self.body.aabb())
    }

    /// Held 8-way direction, or facing without input.
    pub fn aim(&self, controls: &Controls) -> Vec2 {
        if controls.direction == Vec2::ZERO {
            Vec2::new(self.body.facing.sign(), 0.0)
        } else {
            controls.direction
        }
    }

    /// Run one fixed step. Returns the projectiles to spawn.
    pub fn tick(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        level: &Level,
        cfg: &SimConfig,
        events: &mut Vec<FeedbackEvent>,
    ) -> Vec<SpawnRequest> {
        let mut spawns = Vec::new();
        if dt <= 0.0 || !dt.is_finite() {
            return spawns;
        }
        let ctrl = &cfg.controller;

        if input.is_pressed_this_tick(Action::MoveUp) {
            self.abilities.unlock_movement(self.id, events);
        }
        let controls = if self.abilities.movement_locked {
            report_locked(input, events);
            Controls::locked(input)
        } else {
            Controls::from_input(input)
        };

        let was_grounded = self.body.on_ground;
        if self.abilities.exclusive == Exclusive::Idle
            && let Some(facing) = Facing::from_sign(controls.horizontal)
        {
            self.body.facing = facing;
        }

        // Precedence: dash, then ground pound, then ledge, then normal movement
        if controls.dash_pressed {
            self.abilities
                .try_dash(&mut self.body, &controls, ctrl, events);
        }
        if controls.ground_pound_pressed {
            self.abilities
                .try_ground_pound(&mut self.body, level, ctrl, events);
        }
        if controls.jump_pressed && !self.abilities.is_ledge_grabbing() {
            self.abilities.buffer_jump(ctrl);
        }

        let mut jumped = false;
        match self.abilities.exclusive {
            Exclusive::Dashing { .. } => self.abilities.hold_dash(&mut self.body, ctrl),
            Exclusive::GroundPounding => self.abilities.hold_ground_pound(&mut self.body, ctrl),
            Exclusive::LedgeGrabbing(_) => {
                self.abilities
                    .update_ledge(&mut self.body, &controls, ctrl, events);
            },
            Exclusive::Idle => {
                self.abilities
                    .apply_run(&mut self.body, &controls, dt, ctrl);
                jumped = self
                    .abilities
                    .update_jump(&mut self.body, &controls, ctrl, events);
                if !jumped {
                    apply_gravity(&mut self.body, &controls, dt, ctrl);
                }
                self.abilities
                    .apply_wall_slide(&mut self.body, ctrl, events);
            },
        }

        if controls.fire_pressed {
            self.try_fire(&controls, &cfg.projectiles, &mut spawns, events);
        }
        if controls.throw_pressed {
            self.try_throw(&cfg.projectiles, &mut spawns, events);
        }

        if !self.abilities.is_dashing() {
            self.clamp_velocity(ctrl);
        }

        if !self.abilities.is_ledge_grabbing() {
            let params = CollisionParams::from_controller(ctrl);
            let report = move_and_collide(
                &mut self.body,
                dt,
                level.obstacles(),
                &params,
                self.abilities.is_dashing(),
            );
            self.after_collision(&report, was_grounded, jumped, &controls, level, ctrl, events);
        }
        self.body.position = level.bounds().wrap(self.body.position);

        self.abilities
            .tick_timers(&mut self.body, dt, ctrl, events);
        self.abilities
            .update_watchdog(&self.body, self.id, dt, ctrl, events);
        if !self.abilities.is_dashing() {
            self.clamp_velocity(ctrl);
        }
        self.movement_state =
            MovementState::classify(&self.body, &self.abilities, self.movement_state);

        if !self.body.is_finite() || self.body.position.y > level.bounds().respawn_y {
            tracing::debug!(
                x = self.body.position.x,
                y = self.body.position.y,
                "Out of bounds, respawning"
            );
            self.respawn(cfg, events);
        }
        spawns
    }

    /// Post-collision hooks: pound impact, landing, coyote, wall stick.
    #[allow(clippy::too_many_arguments)]
    fn after_collision(
        &mut self,
        report: &MoveReport,
        was_grounded: bool,
        jumped: bool,
        controls: &Controls,
        level: &Level,
        ctrl: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) {
        if self.body.on_ground && self.abilities.is_ground_pounding() {
            self.abilities
                .ground_pound_impact(&mut self.body, controls, ctrl, events);
            return;
        }

        if self.body.on_ground {
            if was_grounded {
                self.abilities.jumps_used = 0;
            } else {
                self.abilities.on_landed();
                self.landing_feedback(report.impact_speed, ctrl, events);
                if let Some(platform) = report.floor.and_then(|i| level.obstacles().get(i)) {
                    self.abilities
                        .try_ledge_grab(&mut self.body, platform, ctrl, events);
                }
            }
        } else if was_grounded && !jumped {
            self.abilities.on_left_ground(ctrl);
        }

        self.abilities.on_wall_contact(&self.body, ctrl);
        if self.body.on_ceiling {
            self.abilities.jump_cut_armed = false;
        }
    }

    fn landing_feedback(
        &self,
        impact_speed: f32,
        ctrl: &ControllerConfig,
        events: &mut Vec<FeedbackEvent>,
    ) {
        events.push(FeedbackEvent::PlayCue(Cue::Land));
        if impact_speed > ctrl.landing_impact_speed {
            events.push(FeedbackEvent::particles(
                ParticleKind::Landing,
                Vec2::new(self.body.position.x, self.body.bottom()),
                Vec2::new(0.0, -1.0),
            ));
            events.push(FeedbackEvent::ScreenShake {
                intensity: (impact_speed * ctrl.landing_shake_scale).min(ctrl.landing_shake_max),
                duration: ctrl.landing_shake_duration,
            });
        }
    }

    /// Clamp to the active surface's horizontal maximum and terminal fall speed.
    fn clamp_velocity(&mut self, ctrl: &ControllerConfig) {
        let max_speed = if self.body.on_ground {
            ctrl.ground_max_speed
        } else {
            ctrl.air_max_speed
        };
        self.body.clamp_velocity(max_speed, ctrl.max_fall_speed);
    }

    fn try_fire(
        &mut self,
        controls: &Controls,
        cfg: &ProjectileConfig,
        spawns: &mut Vec<SpawnRequest>,
        events: &mut Vec<FeedbackEvent>,
    ) {
        let timers = &mut self.abilities.timers;
        if !cfg.fire_enabled {
            events.push(FeedbackEvent::rejected(Ability::Fire, Rejection::Disabled));
            return;
        }
        if timers.is_active(AbilityTimer::FireCooldown) {
            events.push(FeedbackEvent::rejected(Ability::Fire, Rejection::OnCooldown));
            return;
        }
        timers.start(AbilityTimer::FireCooldown, cfg.fire_cooldown);

        let direction = self.aim(controls);
        spawns.push(SpawnRequest::Bullet {
            origin: self.body.position + direction * self.body.half_extents.x,
            direction,
            owner: self.team,
        });
        events.push(FeedbackEvent::PlayCue(Cue::Fire));
    }

    fn try_throw(
        &mut self,
        cfg: &ProjectileConfig,
        spawns: &mut Vec<SpawnRequest>,
        events: &mut Vec<FeedbackEvent>,
    ) {
        let rejection = if !cfg.throw_enabled {
            Some(Rejection::Disabled)
        } else if self.abilities.timers.is_active(AbilityTimer::GrenadeCooldown) {
            Some(Rejection::OnCooldown)
        } else if self.grenades == 0 {
            Some(Rejection::NoAmmo)
        } else {
            None
        };
        if let Some(reason) = rejection {
            events.push(FeedbackEvent::rejected(Ability::Throw, reason));
            return;
        }

        let origin = self.body.position;
        let target = origin + Vec2::new(self.body.facing.sign() * cfg.throw_reach_x, cfg.throw_reach_y);
        spawns.push(SpawnRequest::Grenade {
            origin,
            velocity: throw_velocity(origin, target, cfg),
            owner: self.team,
        });
        self.grenades -= 1;
        self.abilities
            .timers
            .start(AbilityTimer::GrenadeCooldown, cfg.grenade_cooldown);
        events.push(FeedbackEvent::PlayCue(Cue::Throw));
    }

    /// Apply damage unless invincible. Returns whether it landed.
    ///
    /// Health reaching zero respawns the character.
    pub fn take_damage(
        &mut self,
        amount: i32,
        cfg: &SimConfig,
        events: &mut Vec<FeedbackEvent>,
    ) -> bool {
        if amount <= 0 || self.is_invincible() {
            return false;
        }
        self.health = self.health.saturating_sub(amount).max(0);
        events.push(FeedbackEvent::Damaged {
            entity: self.id,
            amount,
            remaining: self.health,
        });
        events.push(FeedbackEvent::PlayCue(Cue::Hurt));
        self.abilities.timers.extend(
            AbilityTimer::Invincibility,
            cfg.controller.hurt_invincibility_time,
        );
        if self.health == 0 {
            self.respawn(cfg, events);
        }
        true
    }

    /// Back to the spawn point at rest with fresh abilities and vitals.
    pub fn respawn(&mut self, cfg: &SimConfig, events: &mut Vec<FeedbackEvent>) {
        self.body.teleport(self.spawn);
        self.body.facing = Facing::default();
        self.abilities = AbilityState::default();
        self.health = cfg.controller.max_health;
        self.grenades = cfg.projectiles.max_grenades;
        self.movement_state = MovementState::Idle;
        events.push(FeedbackEvent::Respawned {
            entity: self.id,
            position: self.spawn,
        });
        events.push(FeedbackEvent::PlayCue(Cue::Respawn));
        tracing::info!(entity = ?self.id, "Respawned");
    }
}

/// Movement abilities pressed while the watchdog lock holds.
fn report_locked(input: &InputSnapshot, events: &mut Vec<FeedbackEvent>) {
    for (action, ability) in [
        (Action::Jump, Ability::Jump),
        (Action::Dash, Ability::Dash),
        (Action::GroundPound, Ability::GroundPound),
    ] {
        if input.is_pressed_this_tick(action) {
            events.push(FeedbackEvent::rejected(ability, Rejection::MovementLocked));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::WorldBounds;

    const DT: f32 = 1.0 / 60.0;
    /// Standing height on the test floor (top at 600).
    const STAND_Y: f32 = 576.0;

    fn level() -> Level {
        Level::new(
            vec![
                Aabb::from_rect(0.0, 600.0, 2000.0, 100.0),
                Aabb::from_rect(1200.0, 300.0, 20.0, 300.0),
            ],
            Vec2::new(500.0, STAND_Y),
            Vec::new(),
            WorldBounds::default(),
        )
    }

    fn standing(cfg: &SimConfig) -> Character {
        let mut c = Character::player(Vec2::new(500.0, STAND_Y), cfg);
        c.body.on_ground = true;
        c
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::default()
    }

    fn press(action: Action) -> InputSnapshot {
        InputSnapshot::default().with_pressed(action)
    }

    fn tick(c: &mut Character, input: &InputSnapshot, cfg: &SimConfig) -> Vec<FeedbackEvent> {
        let mut events = Vec::new();
        c.tick(DT, input, &level(), cfg, &mut events);
        events
    }

    // ================================================================
    // Core movement
    // ================================================================

    #[test]
    fn standing_body_stays_grounded() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        for _ in 0..30 {
            tick(&mut c, &idle(), &cfg);
        }
        assert!(c.body.on_ground);
        assert_eq!(c.body.position.y, STAND_Y);
        assert_eq!(c.body.velocity, Vec2::ZERO);
        assert_eq!(c.movement_state, MovementState::Idle);
    }

    #[test]
    fn jump_press_applies_full_strength_next_tick() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        let events = tick(&mut c, &press(Action::Jump), &cfg);
        assert_eq!(c.body.velocity.y, cfg.controller.jump_strength);
        assert_eq!(c.abilities.jumps_used, 1);
        assert!(!c.body.on_ground);
        assert!(events.contains(&FeedbackEvent::PlayCue(Cue::Jump)));
    }

    #[test]
    fn landing_resets_jump_count() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        tick(&mut c, &press(Action::Jump), &cfg);
        for _ in 0..10 {
            tick(&mut c, &InputSnapshot::default().with_held(Action::Jump), &cfg);
        }
        tick(&mut c, &press(Action::Jump), &cfg);
        assert_eq!(c.abilities.jumps_used, 2);

        let mut landed = false;
        for _ in 0..180 {
            let events = tick(&mut c, &idle(), &cfg);
            if events.contains(&FeedbackEvent::PlayCue(Cue::Land)) {
                landed = true;
                break;
            }
        }
        assert!(landed, "body never landed");
        assert_eq!(c.abilities.jumps_used, 0);
        assert!(!c.abilities.timers.is_active(AbilityTimer::Coyote));
    }

    #[test]
    fn long_frame_lands_on_thin_platform() {
        let cfg = SimConfig::default();
        let thin = Level::new(
            vec![Aabb::from_rect(0.0, 600.0, 2000.0, 20.0)],
            Vec2::new(500.0, STAND_Y),
            Vec::new(),
            WorldBounds::default(),
        );
        let mut c = Character::player(Vec2::new(500.0, 600.0 - 5.0 - 24.0), &cfg);
        c.body.velocity.y = cfg.controller.max_fall_speed;
        let mut events = Vec::new();
        c.tick(0.2, &idle(), &thin, &cfg, &mut events);
        assert!(c.body.on_ground, "tunneled to y={}", c.body.position.y);
        assert_eq!(c.body.bottom(), 600.0);
        assert!(events.contains(&FeedbackEvent::PlayCue(Cue::Land)));
    }

    #[test]
    fn running_into_wall_clamps_to_edge() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        c.body.position.x = 1150.0;
        let right = InputSnapshot::default().with_held(Action::MoveRight);
        for _ in 0..60 {
            tick(&mut c, &right, &cfg);
        }
        assert_eq!(c.body.position.x, 1200.0 - c.body.half_extents.x);
        assert_eq!(c.body.velocity.x, 0.0);
        assert!(c.body.on_wall);
        assert_eq!(c.body.wall_direction, 1);
    }

    #[test]
    fn horizontal_speed_respects_surface_max() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        let left = InputSnapshot::default().with_held(Action::MoveLeft);
        for _ in 0..60 {
            tick(&mut c, &left, &cfg);
            assert!(c.body.velocity.x >= -cfg.controller.ground_max_speed);
        }
        assert_eq!(c.body.velocity.x, -cfg.controller.ground_max_speed);
        assert_eq!(c.body.facing, Facing::Left);
        assert_eq!(c.movement_state, MovementState::Running);
    }

    #[test]
    fn walking_off_edge_grants_coyote_jump() {
        let cfg = SimConfig::default();
        let lvl = Level::new(
            vec![Aabb::from_rect(0.0, 600.0, 500.0, 100.0)],
            Vec2::new(480.0, STAND_Y),
            Vec::new(),
            WorldBounds::default(),
        );
        let mut c = Character::player(Vec2::new(520.0, STAND_Y), &cfg);
        c.body.on_ground = true;
        let mut events = Vec::new();
        c.tick(DT, &idle(), &lvl, &cfg, &mut events);
        assert!(!c.body.on_ground, "body should have left the edge");
        assert!(c.abilities.timers.is_active(AbilityTimer::Coyote));

        c.tick(DT, &press(Action::Jump), &lvl, &cfg, &mut events);
        assert_eq!(c.body.velocity.y, cfg.controller.jump_strength);
        assert_eq!(c.abilities.jumps_used, 1);
    }

    // ================================================================
    // Dash
    // ================================================================

    #[test]
    fn dash_iframes_last_exactly_their_duration() {
        let mut cfg = SimConfig::default();
        cfg.controller.dash_duration = 0.3;
        cfg.controller.dash_invincibility_time = 0.25;
        let dt = 1.0 / 64.0;
        let mut c = standing(&cfg);
        let lvl = level();
        let mut events = Vec::new();
        c.tick(dt, &press(Action::Dash), &lvl, &cfg, &mut events);
        assert!(c.is_invincible());
        for i in 2..=15 {
            // Re-pressing dash or pounding mid-dash must not disturb the i-frames
            let input = if i % 2 == 0 {
                press(Action::Dash)
            } else {
                press(Action::GroundPound)
            };
            c.tick(dt, &input, &lvl, &cfg, &mut events);
            assert!(c.is_invincible(), "should be invincible after update {i}");
        }
        c.tick(dt, &idle(), &lvl, &cfg, &mut events);
        assert!(!c.is_invincible(), "i-frames must end after 0.25s");
    }

    #[test]
    fn dash_moves_at_dash_speed_and_damps_at_end() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        tick(&mut c, &press(Action::Dash), &cfg);
        assert_eq!(c.body.velocity.x, cfg.controller.dash_speed);
        assert_eq!(c.movement_state, MovementState::Dashing);
        for _ in 0..20 {
            if !c.abilities.is_dashing() {
                break;
            }
            tick(&mut c, &idle(), &cfg);
        }
        assert!(!c.abilities.is_dashing());
        let damped = cfg.controller.dash_speed * cfg.controller.dash_end_damping;
        assert_eq!(c.body.velocity.x, damped, "dash end must damp, not stop");
        assert!(c.abilities.timers.is_active(AbilityTimer::DashJumpWindow));
    }

    // ================================================================
    // Ground pound
    // ================================================================

    /// Airborne character whose bottom edge sits `clearance` above the floor.
    fn airborne(clearance: f32, cfg: &SimConfig) -> Character {
        Character::player(Vec2::new(500.0, 600.0 - clearance - 24.0), cfg)
    }

    #[test]
    fn ground_pound_bounces_with_base_velocity() {
        let cfg = SimConfig::default();
        let mut c = airborne(200.0, &cfg);
        tick(&mut c, &press(Action::GroundPound), &cfg);
        assert!(c.abilities.is_ground_pounding());
        assert_eq!(c.body.velocity.y, cfg.controller.ground_pound_speed);

        let mut impact = None;
        for i in 0..60 {
            let events = tick(&mut c, &idle(), &cfg);
            if events
                .iter()
                .any(|e| matches!(e, FeedbackEvent::ScreenShake { .. }))
            {
                impact = Some(i);
                break;
            }
        }
        assert!(impact.is_some(), "pound never hit the floor");
        assert_eq!(c.body.velocity.y, cfg.controller.ground_pound_bounce);
        assert!(!c.abilities.is_ground_pounding());
        assert!(c.abilities.timers.is_active(AbilityTimer::GroundPoundCooldown));
    }

    #[test]
    fn ground_pound_with_buffered_jump_super_bounces() {
        let cfg = SimConfig::default();
        let mut c = airborne(200.0, &cfg);
        tick(&mut c, &press(Action::GroundPound), &cfg);
        // 200 units at 450/s is ~27 ticks; press jump a few ticks before impact
        for _ in 0..22 {
            tick(&mut c, &idle(), &cfg);
        }
        tick(&mut c, &press(Action::Jump), &cfg);
        for _ in 0..20 {
            if !c.abilities.is_ground_pounding() {
                break;
            }
            tick(&mut c, &idle(), &cfg);
        }
        let expected = cfg.controller.ground_pound_bounce * cfg.controller.super_bounce_multiplier;
        assert_eq!(c.body.velocity.y, expected);
    }

    #[test]
    fn ground_pound_at_exact_min_height_is_allowed() {
        let cfg = SimConfig::default();
        let mut c = airborne(cfg.controller.ground_pound_min_height, &cfg);
        let events = tick(&mut c, &press(Action::GroundPound), &cfg);
        assert!(c.abilities.is_ground_pounding(), "rejected: {events:?}");
        assert!(events.contains(&FeedbackEvent::PlayCue(Cue::GroundPound)));
    }

    #[test]
    fn ground_pound_below_min_height_changes_nothing() {
        let cfg = SimConfig::default();
        let mut pressed = airborne(60.0, &cfg);
        let mut control = airborne(60.0, &cfg);
        let events = tick(&mut pressed, &press(Action::GroundPound), &cfg);
        tick(&mut control, &idle(), &cfg);
        assert!(!pressed.abilities.is_ground_pounding());
        assert_eq!(pressed.body, control.body);
        assert!(matches!(
            events.as_slice(),
            [FeedbackEvent::AbilityRejected {
                ability: Ability::GroundPound,
                reason: Rejection::TooLow { .. },
            }]
        ));
    }

    // ================================================================
    // Respawn, damage, watchdog
    // ================================================================

    #[test]
    fn respawn_mid_dash_restores_spawn_exactly() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        tick(&mut c, &press(Action::Dash), &cfg);
        tick(&mut c, &idle(), &cfg);
        assert!(c.abilities.is_dashing());
        let mut events = Vec::new();
        c.respawn(&cfg, &mut events);
        assert_eq!(c.body.position, c.spawn);
        assert_eq!(c.body.velocity, Vec2::ZERO);
        assert_eq!(c.abilities, AbilityState::default());
    }

    #[test]
    fn falling_below_respawn_line_respawns() {
        let cfg = SimConfig::default();
        let mut c = Character::player(Vec2::new(1500.0, 100.0), &cfg);
        c.spawn = Vec2::new(100.0, STAND_Y);
        let lvl = Level::empty(c.spawn);
        let mut events = Vec::new();
        for _ in 0..600 {
            c.tick(DT, &idle(), &lvl, &cfg, &mut events);
            if !events.is_empty() {
                break;
            }
        }
        assert_eq!(c.body.position, Vec2::new(100.0, STAND_Y));
        assert!(events.contains(&FeedbackEvent::Respawned {
            entity: EntityId::Player,
            position: Vec2::new(100.0, STAND_Y),
        }));
    }

    #[test]
    fn non_finite_position_respawns() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        c.body.position.x = f32::NAN;
        let events = tick(&mut c, &idle(), &cfg);
        assert_eq!(c.body.position, c.spawn);
        assert!(events.contains(&FeedbackEvent::PlayCue(Cue::Respawn)));
    }

    #[test]
    fn damage_grants_iframes_and_zero_health_respawns() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        c.body.position.x = 800.0;
        let mut events = Vec::new();
        assert!(c.take_damage(60, &cfg, &mut events));
        assert_eq!(c.health, 40);
        assert!(!c.take_damage(60, &cfg, &mut events), "i-frames must block");

        c.abilities.timers.clear(AbilityTimer::Invincibility);
        assert!(c.take_damage(60, &cfg, &mut events));
        assert_eq!(c.health, cfg.controller.max_health);
        assert_eq!(c.body.position, c.spawn);
    }

    #[test]
    fn stuck_watchdog_locks_and_move_up_unlocks() {
        let cfg = SimConfig::default();
        let mut c = airborne(300.0, &cfg);
        let mut events = Vec::new();
        let lvl = level();
        // Hover artificially: cancel gravity each tick before the watchdog sees it
        for _ in 0..70 {
            c.body.velocity = Vec2::ZERO;
            c.abilities.update_watchdog(&c.body, c.id, DT, &cfg.controller, &mut events);
        }
        assert!(c.abilities.movement_locked);

        events.clear();
        c.tick(DT, &press(Action::Jump), &lvl, &cfg, &mut events);
        assert!(events.contains(&FeedbackEvent::rejected(
            Ability::Jump,
            Rejection::MovementLocked
        )));
        assert_eq!(c.abilities.jumps_used, 0);

        events.clear();
        c.tick(DT, &press(Action::MoveUp), &lvl, &cfg, &mut events);
        assert!(!c.abilities.movement_locked);
        assert!(events.contains(&FeedbackEvent::MovementUnlocked {
            entity: EntityId::Player
        }));
    }

    #[test]
    fn fire_respects_cooldown_and_aim() {
        let cfg = SimConfig::default();
        let mut c = standing(&cfg);
        c.body.facing = Facing::Left;
        let mut events = Vec::new();
        let spawns = c.tick(DT, &press(Action::Fire), &level(), &cfg, &mut events);
        assert!(matches!(
            spawns.as_slice(),
            [SpawnRequest::Bullet { direction, owner: Team::Player, .. }] if *direction == Vec2::new(-1.0, 0.0)
        ));
        let spawns = c.tick(DT, &press(Action::Fire), &level(), &cfg, &mut events);
        assert!(spawns.is_empty());
        assert!(events.contains(&FeedbackEvent::rejected(Ability::Fire, Rejection::OnCooldown)));
    }

    #[test]
    fn grenades_run_out() {
        let mut cfg = SimConfig::default();
        cfg.projectiles.grenade_cooldown = 0.0;
        let mut c = standing(&cfg);
        let mut events = Vec::new();
        let mut thrown = 0;
        for _ in 0..5 {
            thrown += c
                .tick(DT, &press(Action::Throw), &level(), &cfg, &mut events)
                .len();
        }
        assert_eq!(thrown, usize::from(cfg.projectiles.max_grenades));
        assert!(events.contains(&FeedbackEvent::rejected(Ability::Throw, Rejection::NoAmmo)));
    }

    #[test]
    fn zero_dt_is_noop() {
        let cfg = SimConfig::default();
        let mut c = airborne(100.0, &cfg);
        c.body.velocity = Vec2::new(50.0, 50.0);
        let before = c.clone();
        let mut events = Vec::new();
        for dt in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let spawns = c.tick(dt, &press(Action::Jump), &level(), &cfg, &mut events);
            assert!(spawns.is_empty());
        }
        assert_eq!(c, before);
        assert!(events.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_input() -> impl Strategy<Value = InputSnapshot> {
            (any::<u16>(), any::<u16>()).prop_map(|(held, pressed)| {
                InputSnapshot::new(
                    pounce_core::input::Actions::from_bits_truncate(held),
                    pounce_core::input::Actions::from_bits_truncate(pressed),
                )
            })
        }

        proptest! {
            #[test]
            fn horizontal_speed_clamped_outside_dash(
                script in prop::collection::vec(arb_input(), 1..200),
            ) {
                let cfg = SimConfig::default();
                let mut c = standing(&cfg);
                let lvl = level();
                let mut events = Vec::new();
                for input in &script {
                    c.tick(DT, input, &lvl, &cfg, &mut events);
                    if c.abilities.is_dashing() {
                        continue;
                    }
                    let max = if c.body.on_ground {
                        cfg.controller.ground_max_speed
                    } else {
                        cfg.controller.air_max_speed
                    };
                    prop_assert!(
                        c.body.velocity.x.abs() <= max,
                        "vx {} exceeds {} (on_ground={})",
                        c.body.velocity.x,
                        max,
                        c.body.on_ground
                    );
                    prop_assert!(c.body.velocity.y <= cfg.controller.max_fall_speed);
                }
            }

            #[test]
            fn pound_below_min_height_is_inert(frac in 0.0f32..0.999) {
                let cfg = SimConfig::default();
                let h = frac * cfg.controller.ground_pound_min_height;
                let lvl = level();
                let mut pressed = airborne(h, &cfg);
                let mut control = airborne(h, &cfg);
                pressed.tick(DT, &press(Action::GroundPound), &lvl, &cfg, &mut Vec::new());
                control.tick(DT, &idle(), &lvl, &cfg, &mut Vec::new());
                prop_assert!(!pressed.abilities.is_ground_pounding(), "pounded at h={}", h);
                prop_assert_eq!(&pressed.body, &control.body);
            }

            #[test]
            fn pound_from_min_height_bounces_exactly(
                extra in 0.0f32..280.0,
                buffered in any::<bool>(),
            ) {
                let cfg = SimConfig::default();
                let ctrl = &cfg.controller;
                let h = ctrl.ground_pound_min_height + extra;
                let lvl = level();
                let mut c = airborne(h, &cfg);
                let mut events = Vec::new();
                c.tick(DT, &press(Action::GroundPound), &lvl, &cfg, &mut events);
                prop_assert!(c.abilities.is_ground_pounding(), "rejected at h={}", h);

                let input = if buffered { press(Action::Jump) } else { idle() };
                for _ in 0..120 {
                    if !c.abilities.is_ground_pounding() {
                        break;
                    }
                    c.tick(DT, &input, &lvl, &cfg, &mut events);
                }
                prop_assert!(!c.abilities.is_ground_pounding(), "no impact from h={}", h);
                let expected = if buffered {
                    ctrl.ground_pound_bounce * ctrl.super_bounce_multiplier
                } else {
                    ctrl.ground_pound_bounce
                };
                prop_assert_eq!(c.body.velocity.y, expected);
            }

            #[test]
            fn default_iframes_cover_their_duration(
                dt in prop::sample::select(vec![1.0f32 / 30.0, 1.0 / 60.0, 1.0 / 64.0, 1.0 / 120.0]),
                repress in any::<bool>(),
            ) {
                let cfg = SimConfig::default();
                let duration = cfg.controller.dash_invincibility_time;
                let lvl = level();
                let mut c = standing(&cfg);
                let mut events = Vec::new();
                c.tick(dt, &press(Action::Dash), &lvl, &cfg, &mut events);
                prop_assert!(c.is_invincible());

                // Ticks from the dash press through the one that ends the i-frames
                let mut covered = dt;
                let input = if repress { press(Action::Dash) } else { idle() };
                for _ in 0..200 {
                    if !c.is_invincible() {
                        break;
                    }
                    c.tick(dt, &input, &lvl, &cfg, &mut events);
                    covered += dt;
                }
                prop_assert!(!c.is_invincible());
                prop_assert!(
                    covered >= duration - 1e-4 && covered < duration + dt + 1e-4,
                    "covered {} for duration {} at dt {}",
                    covered,
                    duration,
                    dt
                );
            }

            #[test]
            fn landing_always_resets_jumps(
                script in prop::collection::vec(arb_input(), 1..200),
            ) {
                let cfg = SimConfig::default();
                let mut c = standing(&cfg);
                let lvl = level();
                let mut events = Vec::new();
                for input in &script {
                    let was_grounded = c.body.on_ground;
                    c.tick(DT, input, &lvl, &cfg, &mut events);
                    if !was_grounded && c.body.on_ground {
                        prop_assert_eq!(c.abilities.jumps_used, 0);
                        prop_assert!(!c.abilities.timers.is_active(AbilityTimer::Coyote));
                    }
                }
            }
        }
    }
}
