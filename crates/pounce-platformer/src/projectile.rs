use serde::{Deserialize, Serialize};

use pounce_core::feedback::{EntityId, FeedbackEvent, ParticleKind};
use pounce_core::math::{Aabb, Vec2};

use crate::collision::{Axis, COLLISION_EPSILON, ContactKind, sweep_axis};
use crate::config::ProjectileConfig;
use crate::level::Level;

/// Damage allegiance. Projectiles never hurt their owner's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Player,
    Hostile,
}

/// Something projectiles can hit this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hittable {
    pub entity: EntityId,
    pub aabb: Aabb,
    pub team: Team,
}

/// Damage queued during the projectile pass, applied once it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    pub target: EntityId,
    pub amount: i32,
}

/// Straight-line shot with a lifetime and a single hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bullet {
    pub position: Vec2,
    pub velocity: Vec2,
    pub half_extents: Vec2,
    pub lifetime: f32,
    pub damage: i32,
    pub owner: Team,
    pub active: bool,
}

impl Bullet {
    pub fn new(origin: Vec2, direction: Vec2, owner: Team, cfg: &ProjectileConfig) -> Self {
        let half = cfg.bullet_size * 0.5;
        Self {
            position: origin,
            velocity: direction.normalized() * cfg.bullet_speed,
            half_extents: Vec2::new(half, half),
            lifetime: cfg.bullet_lifetime,
            damage: cfg.bullet_damage,
            owner,
            active: true,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    fn update(
        &mut self,
        dt: f32,
        level: &Level,
        hittables: &[Hittable],
        cfg: &ProjectileConfig,
        damage: &mut Vec<DamageEvent>,
        events: &mut Vec<FeedbackEvent>,
    ) {
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.active = false;
            return;
        }

        self.position = level.bounds().wrap(self.position + self.velocity * dt);
        if !self.position.is_finite() || !level.bounds().contains(self.position, cfg.bounds_margin)
        {
            self.active = false;
            return;
        }

        let aabb = self.aabb();
        if level.overlapping(&aabb, COLLISION_EPSILON).next().is_some() {
            self.active = false;
            events.push(FeedbackEvent::particles(
                ParticleKind::Spark,
                self.position,
                -self.velocity.normalized(),
            ));
            return;
        }

        if let Some(hit) = hittables
            .iter()
            .find(|h| h.team != self.owner && h.aabb.intersects(&aabb, COLLISION_EPSILON))
        {
            self.active = false;
            damage.push(DamageEvent {
                target: hit.entity,
                amount: self.damage,
            });
            events.push(FeedbackEvent::particles(
                ParticleKind::Spark,
                self.position,
                self.velocity.normalized(),
            ));
        }
    }
}

/// Ballistic explosive with a fuse and bounce restitution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grenade {
    pub position: Vec2,
    pub velocity: Vec2,
    pub half_extents: Vec2,
    pub fuse: f32,
    pub owner: Team,
    pub active: bool,
}

impl Grenade {
    pub fn new(origin: Vec2, velocity: Vec2, owner: Team, cfg: &ProjectileConfig) -> Self {
        let half = cfg.grenade_size * 0.5;
        Self {
            position: origin,
            velocity,
            half_extents: Vec2::new(half, half),
            fuse: cfg.grenade_fuse,
            owner,
            active: true,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    fn update(
        &mut self,
        dt: f32,
        level: &Level,
        hittables: &[Hittable],
        cfg: &ProjectileConfig,
        damage: &mut Vec<DamageEvent>,
        events: &mut Vec<FeedbackEvent>,
    ) {
        self.fuse -= dt;
        if self.fuse <= 0.0 {
            self.detonate(hittables, cfg, damage, events);
            return;
        }

        let last_valid = self.position;
        let obstacles = level.obstacles();
        self.velocity.y += cfg.grenade_gravity * dt;

        let sweep = sweep_axis(
            self.position,
            self.half_extents,
            self.velocity.x * dt,
            Axis::Horizontal,
            obstacles,
        );
        self.position.x = sweep.center;
        if sweep.contact.is_some() {
            self.velocity.x = -self.velocity.x * cfg.grenade_bounce;
        }

        let sweep = sweep_axis(
            self.position,
            self.half_extents,
            self.velocity.y * dt,
            Axis::Vertical,
            obstacles,
        );
        self.position.y = sweep.center;
        match sweep.contact.map(|c| c.kind) {
            Some(ContactKind::Floor) => {
                let bounce = -self.velocity.y * cfg.grenade_bounce;
                if bounce.abs() < cfg.grenade_rest_speed {
                    // Resting: roll with drag
                    self.velocity.y = 0.0;
                    let drag = cfg.grenade_rolling_drag * dt;
                    self.velocity.x = if self.velocity.x > 0.0 {
                        (self.velocity.x - drag).max(0.0)
                    } else {
                        (self.velocity.x + drag).min(0.0)
                    };
                } else {
                    self.velocity.y = bounce;
                    self.velocity.x *= cfg.grenade_floor_friction;
                }
            },
            Some(_) => self.velocity.y = -self.velocity.y * cfg.grenade_bounce,
            None => {},
        }
        self.position = level.bounds().wrap(self.position);

        if !self.position.is_finite() || !self.velocity.is_finite() {
            tracing::warn!("Grenade left valid space, detonating");
            self.position = last_valid;
            self.detonate(hittables, cfg, damage, events);
            return;
        }
        if !level.bounds().contains(self.position, cfg.bounds_margin) {
            self.detonate(hittables, cfg, damage, events);
            return;
        }

        if cfg.grenade_contact_detonation {
            let aabb = self.aabb();
            if hittables
                .iter()
                .any(|h| h.team != self.owner && h.aabb.intersects(&aabb, COLLISION_EPSILON))
            {
                self.detonate(hittables, cfg, damage, events);
            }
        }
    }

    /// One-shot blast against every opposing entity within the radius.
    fn detonate(
        &mut self,
        hittables: &[Hittable],
        cfg: &ProjectileConfig,
        damage: &mut Vec<DamageEvent>,
        events: &mut Vec<FeedbackEvent>,
    ) {
        self.active = false;
        damage.extend(
            hittables
                .iter()
                .filter(|h| {
                    h.team != self.owner
                        && h.aabb.center().distance(self.position) <= cfg.explosion_radius
                })
                .map(|h| DamageEvent {
                    target: h.entity,
                    amount: cfg.explosion_damage,
                }),
        );
        events.push(FeedbackEvent::Detonated {
            position: self.position,
            radius: cfg.explosion_radius,
        });
        events.push(FeedbackEvent::particles(
            ParticleKind::Explosion,
            self.position,
            Vec2::ZERO,
        ));
        events.push(FeedbackEvent::ScreenShake {
            intensity: cfg.explosion_shake_intensity,
            duration: cfg.explosion_shake_duration,
        });
        tracing::debug!(x = self.position.x, y = self.position.y, "Grenade detonated");
    }
}

/// Live bullets and grenades. Membership is unordered; dead entries are
/// flagged inactive during the update and swept out afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectileSet {
    pub bullets: Vec<Bullet>,
    pub grenades: Vec<Grenade>,
}

impl ProjectileSet {
    pub fn spawn_bullet(
        &mut self,
        origin: Vec2,
        direction: Vec2,
        owner: Team,
        cfg: &ProjectileConfig,
    ) {
        self.bullets.push(Bullet::new(origin, direction, owner, cfg));
    }

    pub fn spawn_grenade(
        &mut self,
        origin: Vec2,
        velocity: Vec2,
        owner: Team,
        cfg: &ProjectileConfig,
    ) {
        self.grenades.push(Grenade::new(origin, velocity, owner, cfg));
    }

    /// Advance every active projectile. Returns the damage to apply.
    pub fn update(
        &mut self,
        dt: f32,
        level: &Level,
        hittables: &[Hittable],
        cfg: &ProjectileConfig,
        events: &mut Vec<FeedbackEvent>,
    ) -> Vec<DamageEvent> {
        let mut damage = Vec::new();
        for bullet in self.bullets.iter_mut().filter(|b| b.active) {
            bullet.update(dt, level, hittables, cfg, &mut damage, events);
        }
        for grenade in self.grenades.iter_mut().filter(|g| g.active) {
            grenade.update(dt, level, hittables, cfg, &mut damage, events);
        }
        damage
    }

    /// Drop everything deactivated this tick.
    pub fn sweep_inactive(&mut self) {
        self.bullets.retain(|b| b.active);
        self.grenades.retain(|g| g.active);
    }

    pub fn len(&self) -> usize {
        self.bullets.len() + self.grenades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Launch velocity toward `target`, capped, with an upward kick.
pub fn throw_velocity(origin: Vec2, target: Vec2, cfg: &ProjectileConfig) -> Vec2 {
    let delta = target - origin;
    let speed = cfg
        .throw_max_speed
        .min(delta.length() * cfg.throw_distance_scale);
    let mut velocity = delta.normalized() * speed;
    velocity.y -= cfg.throw_upward_kick;
    velocity
}
