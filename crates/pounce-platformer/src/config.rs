use serde::{Deserialize, Serialize};

/// Gravity acceleration (units/s^2, positive is down).
pub const GRAVITY: f32 = 1150.0;
/// Terminal downward speed.
pub const MAX_FALL_SPEED: f32 = 520.0;
/// Ground jump impulse (negative is up).
pub const JUMP_STRENGTH: f32 = -425.0;
/// Air jump impulse, weaker than the ground jump.
pub const DOUBLE_JUMP_STRENGTH: f32 = -400.0;
/// Fixed descent speed while ground-pounding.
pub const GROUND_POUND_SPEED: f32 = 450.0;
/// Base upward bounce after a ground-pound impact.
pub const GROUND_POUND_BOUNCE: f32 = -180.0;
/// Minimum clearance below the body to start a ground pound.
pub const GROUND_POUND_MIN_HEIGHT: f32 = 120.0;
/// Collision box width.
pub const BODY_WIDTH: f32 = 32.0;
/// Collision box height.
pub const BODY_HEIGHT: f32 = 48.0;

/// Movement and ability tunables for a controllable character.
///
/// All speeds are units/s, accelerations units/s^2 and durations seconds.
/// Upward impulses are negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    pub body_width: f32,
    pub body_height: f32,

    pub gravity: f32,
    pub max_fall_speed: f32,
    /// Gravity multiplier while falling with down held.
    pub fast_fall_multiplier: f32,

    pub ground_acceleration: f32,
    /// Deceleration toward zero on the ground with no horizontal input.
    pub ground_friction: f32,
    pub ground_max_speed: f32,
    pub air_acceleration: f32,
    pub air_friction: f32,
    pub air_max_speed: f32,

    pub jump_strength: f32,
    pub double_jump_strength: f32,
    /// Jumps available before landing, ground jump included. 1 disables double jump.
    pub max_jumps: u8,
    /// Fraction of upward velocity kept when jump is released early.
    pub jump_cut_multiplier: f32,
    /// Release window after a jump during which the cut applies.
    pub jump_cut_window: f32,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,

    pub wall_jump_enabled: bool,
    /// Cap on downward speed while sliding along a wall.
    pub wall_slide_speed: f32,
    pub wall_jump_x_force: f32,
    pub wall_jump_y_force: f32,
    /// Grace window after losing wall contact in which a wall jump still fires.
    pub wall_stick_time: f32,
    /// Input toward the wall just left is ignored for this long.
    pub wall_jump_lock_time: f32,

    pub dash_enabled: bool,
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    /// Capped to `dash_duration` by [`SimConfig::sanitized`].
    pub dash_invincibility_time: f32,
    /// Velocity multiplier applied when a dash ends.
    pub dash_end_damping: f32,
    pub dash_jump_window: f32,
    pub dash_jump_height_multiplier: f32,
    pub dash_jump_speed_multiplier: f32,
    pub dash_strike_damage: i32,

    pub ground_pound_enabled: bool,
    pub ground_pound_speed: f32,
    pub ground_pound_bounce: f32,
    /// Minimum clearance in world units between the body's bottom edge and the
    /// nearest obstacle below. Raising it makes the pound harder to trigger
    /// near the ground.
    pub ground_pound_min_height: f32,
    pub ground_pound_cooldown: f32,
    pub super_bounce_multiplier: f32,
    /// Window before impact in which a jump press upgrades the bounce.
    pub super_bounce_buffer: f32,
    /// Held direction at impact yields `boost * ground_max_speed` of momentum.
    pub ground_pound_momentum_boost: f32,
    pub ground_pound_max_momentum: f32,
    pub ground_pound_shake_intensity: f32,
    pub ground_pound_shake_duration: f32,
    /// Extra horizontal reach of the clearance scan on each side.
    pub height_probe_margin: f32,

    pub ledge_grab_enabled: bool,
    /// Distance beyond the facing edge of the body where the ledge sensor sits.
    pub ledge_probe_offset: f32,
    /// How far past the obstacle edge the sensor must be to grab.
    pub ledge_overhang: f32,
    /// How far inside the ledge the body is placed after climbing.
    pub ledge_climb_inset: f32,
    pub ledge_regrab_delay: f32,

    /// Thickness of the sensor below the body's bottom edge.
    pub ground_probe_depth: f32,
    /// Gap the ground sensor will snap across.
    pub collision_tolerance: f32,
    /// Overlap tolerated before penetration correction runs.
    pub penetration_tolerance: f32,

    /// Landing faster than this emits landing particles and shake.
    pub landing_impact_speed: f32,
    /// Shake intensity per unit of landing speed.
    pub landing_shake_scale: f32,
    pub landing_shake_max: f32,
    pub landing_shake_duration: f32,

    /// Per-axis speed below which an airborne body counts as stuck.
    pub stuck_speed_threshold: f32,
    /// How long the body must stay stuck before input locks.
    pub stuck_time_threshold: f32,

    pub max_health: i32,
    pub hurt_invincibility_time: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            body_width: BODY_WIDTH,
            body_height: BODY_HEIGHT,

            gravity: GRAVITY,
            max_fall_speed: MAX_FALL_SPEED,
            fast_fall_multiplier: 1.8,

            ground_acceleration: 1400.0,
            ground_friction: 1600.0,
            ground_max_speed: 240.0,
            air_acceleration: 900.0,
            air_friction: 300.0,
            air_max_speed: 280.0,

            jump_strength: JUMP_STRENGTH,
            double_jump_strength: DOUBLE_JUMP_STRENGTH,
            max_jumps: 2,
            jump_cut_multiplier: 0.4,
            jump_cut_window: 0.25,
            coyote_time: 0.12,
            jump_buffer_time: 0.18,

            wall_jump_enabled: true,
            wall_slide_speed: 100.0,
            wall_jump_x_force: 280.0,
            wall_jump_y_force: -380.0,
            wall_stick_time: 0.1,
            wall_jump_lock_time: 0.2,

            dash_enabled: true,
            dash_speed: 380.0,
            dash_duration: 0.18,
            dash_cooldown: 0.6,
            dash_invincibility_time: 0.15,
            dash_end_damping: 0.5,
            dash_jump_window: 0.25,
            dash_jump_height_multiplier: 1.1,
            dash_jump_speed_multiplier: 1.3,
            dash_strike_damage: 50,

            ground_pound_enabled: true,
            ground_pound_speed: GROUND_POUND_SPEED,
            ground_pound_bounce: GROUND_POUND_BOUNCE,
            ground_pound_min_height: GROUND_POUND_MIN_HEIGHT,
            ground_pound_cooldown: 0.3,
            super_bounce_multiplier: 1.5,
            super_bounce_buffer: 0.2,
            ground_pound_momentum_boost: 1.8,
            ground_pound_max_momentum: 280.0,
            ground_pound_shake_intensity: 8.0,
            ground_pound_shake_duration: 0.15,
            height_probe_margin: 8.0,

            ledge_grab_enabled: true,
            ledge_probe_offset: 8.0,
            ledge_overhang: 3.0,
            ledge_climb_inset: 4.0,
            ledge_regrab_delay: 0.2,

            ground_probe_depth: 3.0,
            collision_tolerance: 1.0,
            penetration_tolerance: 2.0,

            landing_impact_speed: 200.0,
            landing_shake_scale: 0.01,
            landing_shake_max: 6.0,
            landing_shake_duration: 0.1,

            stuck_speed_threshold: 5.0,
            stuck_time_threshold: 1.0,

            max_health: 100,
            hurt_invincibility_time: 1.0,
        }
    }
}

/// Bullet and grenade tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectileConfig {
    pub fire_enabled: bool,
    pub fire_cooldown: f32,
    pub bullet_speed: f32,
    pub bullet_lifetime: f32,
    pub bullet_damage: i32,
    pub bullet_size: f32,

    pub throw_enabled: bool,
    pub max_grenades: u8,
    pub grenade_cooldown: f32,
    pub grenade_size: f32,
    pub grenade_gravity: f32,
    /// Fraction of speed kept on a bounce.
    pub grenade_bounce: f32,
    /// Horizontal speed kept on each floor bounce.
    pub grenade_floor_friction: f32,
    /// Deceleration while rolling along a floor.
    pub grenade_rolling_drag: f32,
    /// Bounces slower than this come to rest.
    pub grenade_rest_speed: f32,
    pub grenade_fuse: f32,
    /// Touching an opposing entity detonates the grenade before its fuse runs out.
    pub grenade_contact_detonation: bool,
    /// Throw aim point relative to the thrower, mirrored by facing.
    pub throw_reach_x: f32,
    pub throw_reach_y: f32,
    pub throw_distance_scale: f32,
    pub throw_max_speed: f32,
    pub throw_upward_kick: f32,

    pub explosion_radius: f32,
    pub explosion_damage: i32,
    pub explosion_shake_intensity: f32,
    pub explosion_shake_duration: f32,

    /// Distance outside the level bounds a projectile may travel before it
    /// is discarded.
    pub bounds_margin: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            fire_enabled: true,
            fire_cooldown: 0.25,
            bullet_speed: 500.0,
            bullet_lifetime: 3.0,
            bullet_damage: 25,
            bullet_size: 6.0,

            throw_enabled: true,
            max_grenades: 3,
            grenade_cooldown: 1.0,
            grenade_size: 12.0,
            grenade_gravity: 500.0,
            grenade_bounce: 0.5,
            grenade_floor_friction: 0.8,
            grenade_rolling_drag: 120.0,
            grenade_rest_speed: 30.0,
            grenade_fuse: 3.0,
            grenade_contact_detonation: true,
            throw_reach_x: 250.0,
            throw_reach_y: -60.0,
            throw_distance_scale: 2.2,
            throw_max_speed: 350.0,
            throw_upward_kick: 120.0,

            explosion_radius: 85.0,
            explosion_damage: 75,
            explosion_shake_intensity: 10.0,
            explosion_shake_duration: 0.3,

            bounds_margin: 50.0,
        }
    }
}

/// Enemy AI tunables. Speeds are units/s, distances world units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnemyConfig {
    pub size: f32,
    pub health: i32,
    pub sight_range: f32,
    /// Spacing of the samples along a sight line.
    pub sight_step: f32,
    pub shoot_range: f32,
    pub shoot_cooldown: f32,
    pub ground_speed: f32,
    pub flying_speed: f32,

    /// Distance from the patrol centre beyond which a wanderer heads back.
    pub wander_range: f32,
    pub ground_wander_factor: f32,
    pub flying_wander_factor: f32,
    pub wander_interval_min: f32,
    pub wander_interval_max: f32,
    /// Chance a new wander heading is standing still.
    pub wander_pause_chance: f32,

    pub investigate_factor: f32,
    /// Investigation ends this close to the last sighting.
    pub arrive_distance: f32,

    pub ground_retreat_distance: f32,
    pub ground_retreat_factor: f32,
    pub flying_retreat_distance: f32,
    pub flying_retreat_factor: f32,

    /// Ground enemies only; flyers ignore gravity.
    pub gravity: f32,
    pub max_fall_speed: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            size: 32.0,
            health: 50,
            sight_range: 320.0,
            sight_step: 8.0,
            shoot_range: 280.0,
            shoot_cooldown: 1.5,
            ground_speed: 60.0,
            flying_speed: 90.0,

            wander_range: 150.0,
            ground_wander_factor: 0.5,
            flying_wander_factor: 0.3,
            wander_interval_min: 2.0,
            wander_interval_max: 6.0,
            wander_pause_chance: 0.3,

            investigate_factor: 0.7,
            arrive_distance: 30.0,

            ground_retreat_distance: 100.0,
            ground_retreat_factor: 0.5,
            flying_retreat_distance: 120.0,
            flying_retreat_factor: 0.6,

            gravity: 800.0,
            max_fall_speed: 500.0,
        }
    }
}

/// Driver settings for the fixed-step loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub tick_rate_hz: f32,
    pub max_steps_per_frame: u32,
    /// Seeds every enemy's wander decisions.
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            max_steps_per_frame: pounce_core::time::MAX_STEPS_PER_FRAME,
            seed: 0,
        }
    }
}

/// Reset each named field to its default when it is negative or non-finite.
macro_rules! non_negative {
    ($cfg:ident, $defaults:ident, $($field:ident),+ $(,)?) => {
        $(
            if !$cfg.$field.is_finite() || $cfg.$field < 0.0 {
                tracing::warn!(
                    "Invalid {} = {}, using default {}",
                    stringify!($field),
                    $cfg.$field,
                    $defaults.$field
                );
                $cfg.$field = $defaults.$field;
            }
        )+
    };
}

/// Reset each named upward impulse to its default when it points down or is
/// non-finite.
macro_rules! upward {
    ($cfg:ident, $defaults:ident, $($field:ident),+ $(,)?) => {
        $(
            if !$cfg.$field.is_finite() || $cfg.$field > 0.0 {
                tracing::warn!(
                    "Invalid {} = {} (upward impulses are negative), using default {}",
                    stringify!($field),
                    $cfg.$field,
                    $defaults.$field
                );
                $cfg.$field = $defaults.$field;
            }
        )+
    };
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub controller: ControllerConfig,
    pub projectiles: ProjectileConfig,
    pub enemies: EnemyConfig,
    pub world: WorldConfig,
}

impl SimConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path =
            std::env::var("POUNCE_CONFIG").unwrap_or_else(|_| "config/pounce.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => cfg.sanitized(),
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    SimConfig::default()
                },
            },
            Err(_) => SimConfig::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<SimConfig>(content)
    }

    /// The basic controller: run, jump, double jump, dash and shoot. No ground
    /// pound, ledge grab, wall jump or grenades.
    pub fn classic() -> Self {
        let mut cfg = SimConfig::default();
        cfg.controller.ground_pound_enabled = false;
        cfg.controller.ledge_grab_enabled = false;
        cfg.controller.wall_jump_enabled = false;
        cfg.controller.dash_jump_window = 0.0;
        cfg.projectiles.throw_enabled = false;
        cfg
    }

    /// Replace invalid tunables with their defaults, logging each fix.
    pub fn sanitized(mut self) -> Self {
        let d = ControllerConfig::default();
        let c = &mut self.controller;
        non_negative!(
            c,
            d,
            body_width,
            body_height,
            gravity,
            max_fall_speed,
            fast_fall_multiplier,
            ground_acceleration,
            ground_friction,
            ground_max_speed,
            air_acceleration,
            air_friction,
            air_max_speed,
            jump_cut_multiplier,
            jump_cut_window,
            coyote_time,
            jump_buffer_time,
            wall_slide_speed,
            wall_jump_x_force,
            wall_stick_time,
            wall_jump_lock_time,
            dash_speed,
            dash_duration,
            dash_cooldown,
            dash_invincibility_time,
            dash_end_damping,
            dash_jump_window,
            dash_jump_height_multiplier,
            dash_jump_speed_multiplier,
            ground_pound_speed,
            ground_pound_min_height,
            ground_pound_cooldown,
            super_bounce_multiplier,
            super_bounce_buffer,
            ground_pound_momentum_boost,
            ground_pound_max_momentum,
            ground_pound_shake_intensity,
            ground_pound_shake_duration,
            height_probe_margin,
            ledge_probe_offset,
            ledge_overhang,
            ledge_climb_inset,
            ledge_regrab_delay,
            ground_probe_depth,
            collision_tolerance,
            penetration_tolerance,
            landing_impact_speed,
            landing_shake_scale,
            landing_shake_max,
            landing_shake_duration,
            stuck_speed_threshold,
            stuck_time_threshold,
            hurt_invincibility_time,
        );
        upward!(
            c,
            d,
            jump_strength,
            double_jump_strength,
            wall_jump_y_force,
            ground_pound_bounce,
        );
        if c.body_width == 0.0 || c.body_height == 0.0 {
            tracing::warn!("Zero-sized body, using default extents");
            c.body_width = d.body_width;
            c.body_height = d.body_height;
        }
        if c.dash_invincibility_time > c.dash_duration {
            tracing::warn!(
                "dash_invincibility_time {} exceeds dash_duration {}, capping",
                c.dash_invincibility_time,
                c.dash_duration
            );
            c.dash_invincibility_time = c.dash_duration;
        }
        if c.max_health <= 0 {
            tracing::warn!("Invalid max_health = {}, using default", c.max_health);
            c.max_health = d.max_health;
        }

        let d = ProjectileConfig::default();
        let p = &mut self.projectiles;
        non_negative!(
            p,
            d,
            fire_cooldown,
            bullet_speed,
            bullet_lifetime,
            bullet_size,
            grenade_cooldown,
            grenade_size,
            grenade_gravity,
            grenade_bounce,
            grenade_floor_friction,
            grenade_rolling_drag,
            grenade_rest_speed,
            grenade_fuse,
            throw_distance_scale,
            throw_max_speed,
            throw_upward_kick,
            explosion_radius,
            explosion_shake_intensity,
            explosion_shake_duration,
            bounds_margin,
        );

        let d = EnemyConfig::default();
        let e = &mut self.enemies;
        non_negative!(
            e,
            d,
            size,
            sight_range,
            sight_step,
            shoot_range,
            shoot_cooldown,
            ground_speed,
            flying_speed,
            wander_range,
            ground_wander_factor,
            flying_wander_factor,
            wander_interval_min,
            wander_interval_max,
            wander_pause_chance,
            investigate_factor,
            arrive_distance,
            ground_retreat_distance,
            ground_retreat_factor,
            flying_retreat_distance,
            flying_retreat_factor,
            gravity,
            max_fall_speed,
        );
        if e.size == 0.0 || e.sight_step == 0.0 {
            tracing::warn!("Zero enemy size or sight step, using defaults");
            e.size = d.size;
            e.sight_step = d.sight_step;
        }
        if e.wander_interval_max < e.wander_interval_min {
            tracing::warn!(
                "wander_interval_max {} below wander_interval_min {}, raising",
                e.wander_interval_max,
                e.wander_interval_min
            );
            e.wander_interval_max = e.wander_interval_min;
        }
        if e.health <= 0 {
            tracing::warn!("Invalid enemy health = {}, using default", e.health);
            e.health = d.health;
        }

        if !self.world.tick_rate_hz.is_finite() || self.world.tick_rate_hz <= 0.0 {
            tracing::warn!(
                "Invalid tick_rate_hz = {}, using default",
                self.world.tick_rate_hz
            );
            self.world.tick_rate_hz = WorldConfig::default().tick_rate_hz;
        }
        self
    }
}
