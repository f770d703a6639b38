use pounce_core::math::{Aabb, Vec2};

use crate::body::KinematicBody;
use crate::config::ControllerConfig;
use crate::level::Level;

/// Overlaps shallower than this are treated as touching, not intersecting.
pub const COLLISION_EPSILON: f32 = 1e-3;
/// Upper bound on penetration-correction pushes per move.
const MAX_CORRECTION_PASSES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Which face of the moving box made contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Floor,
    Ceiling,
    /// Obstacle on the left of the body.
    WallLeft,
    /// Obstacle on the right of the body.
    WallRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub kind: ContactKind,
    /// Index into the obstacle slice.
    pub obstacle: usize,
}

/// Result of sweeping one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSweep {
    /// New center coordinate on the swept axis.
    pub center: f32,
    pub contact: Option<Contact>,
}

/// Sensor and correction distances used by [`move_and_collide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionParams {
    pub probe_depth: f32,
    pub snap_tolerance: f32,
    pub penetration_tolerance: f32,
}

impl CollisionParams {
    pub fn from_controller(cfg: &ControllerConfig) -> Self {
        Self {
            probe_depth: cfg.ground_probe_depth,
            snap_tolerance: cfg.collision_tolerance,
            penetration_tolerance: cfg.penetration_tolerance,
        }
    }
}

/// Contacts found during one [`move_and_collide`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveReport {
    pub floor: Option<usize>,
    pub ceiling: Option<usize>,
    pub wall: Option<usize>,
    /// Downward speed just before the vertical pass.
    pub impact_speed: f32,
    /// The penetration pass had to move the body.
    pub corrected: bool,
}

/// Sweep a box centered at `center` by `delta` along one axis.
///
/// Among all obstacles the swept box would enter, the one allowing the least
/// travel wins; ties go to the obstacle with the largest overlap across the
/// axis, then to the lower index. The result never depends on storage order
/// except through that final index.
pub fn sweep_axis(
    center: Vec2,
    half_extents: Vec2,
    delta: f32,
    axis: Axis,
    obstacles: &[Aabb],
) -> AxisSweep {
    let along = match axis {
        Axis::Horizontal => center.x,
        Axis::Vertical => center.y,
    };
    if delta == 0.0 || !delta.is_finite() {
        return AxisSweep {
            center: along,
            contact: None,
        };
    }

    let aabb = Aabb::from_center(center, half_extents);
    let offset = match axis {
        Axis::Horizontal => Vec2::new(delta, 0.0),
        Axis::Vertical => Vec2::new(0.0, delta),
    };
    let swept = aabb.union(&aabb.translated(offset));
    let forward = delta > 0.0;

    // (travel, cross-axis overlap, index)
    let mut best: Option<(f32, f32, usize)> = None;
    for (i, o) in obstacles.iter().enumerate() {
        if !swept.intersects(o, COLLISION_EPSILON) {
            continue;
        }
        let (travel, cross) = match (axis, forward) {
            (Axis::Horizontal, true) => (o.left() - aabb.right(), aabb.overlap_y(o)),
            (Axis::Horizontal, false) => (aabb.left() - o.right(), aabb.overlap_y(o)),
            (Axis::Vertical, true) => (o.top() - aabb.bottom(), aabb.overlap_x(o)),
            (Axis::Vertical, false) => (aabb.top() - o.bottom(), aabb.overlap_x(o)),
        };
        // Facing edge already behind the leading edge; left to penetration correction
        if travel < -COLLISION_EPSILON {
            continue;
        }
        let travel = travel.max(0.0);
        let better = match best {
            None => true,
            Some((bt, bc, _)) => travel < bt || (travel == bt && cross > bc),
        };
        if better {
            best = Some((travel, cross, i));
        }
    }

    match best {
        None => AxisSweep {
            center: along + delta,
            contact: None,
        },
        Some((_, _, i)) => {
            let o = &obstacles[i];
            let (center, kind) = match (axis, forward) {
                (Axis::Horizontal, true) => (o.left() - half_extents.x, ContactKind::WallRight),
                (Axis::Horizontal, false) => (o.right() + half_extents.x, ContactKind::WallLeft),
                (Axis::Vertical, true) => (o.top() - half_extents.y, ContactKind::Floor),
                (Axis::Vertical, false) => (o.bottom() + half_extents.y, ContactKind::Ceiling),
            };
            AxisSweep {
                center,
                contact: Some(Contact { kind, obstacle: i }),
            }
        },
    }
}

/// Thin sensor under the box. Returns the supporting obstacle and its top edge
/// when one lies within `snap_tolerance` of the bottom edge.
pub fn probe_ground(
    aabb: &Aabb,
    obstacles: &[Aabb],
    probe_depth: f32,
    snap_tolerance: f32,
) -> Option<(usize, f32)> {
    let sensor = Aabb::new(
        Vec2::new(aabb.left(), aabb.bottom()),
        Vec2::new(aabb.right(), aabb.bottom() + probe_depth),
    );
    let mut best: Option<(f32, f32, usize)> = None;
    for (i, o) in obstacles.iter().enumerate() {
        if !sensor.intersects(o, COLLISION_EPSILON) {
            continue;
        }
        let gap = (o.top() - aabb.bottom()).abs();
        if gap > snap_tolerance {
            continue;
        }
        let cross = aabb.overlap_x(o);
        let better = match best {
            None => true,
            Some((bg, bc, _)) => gap < bg || (gap == bg && cross > bc),
        };
        if better {
            best = Some((gap, cross, i));
        }
    }
    best.map(|(_, _, i)| (i, obstacles[i].top()))
}

/// Clearance between the box's bottom edge and the nearest obstacle top below
/// it, scanning `margin` beyond each side. `None` when nothing is below.
pub fn height_above_ground(aabb: &Aabb, level: &Level, margin: f32) -> Option<f32> {
    level
        .nearest_top_below(aabb.left() - margin, aabb.right() + margin, aabb.bottom())
        .map(|top| top - aabb.bottom())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Push {
    Up,
    Down,
    Left,
    Right,
}

/// Push the body out of any obstacle it overlaps by more than `tolerance`,
/// always resolving the globally shallowest overlap first.
pub fn correct_penetration(
    body: &mut KinematicBody,
    obstacles: &[Aabb],
    tolerance: f32,
    report: &mut MoveReport,
) {
    for _ in 0..MAX_CORRECTION_PASSES {
        let aabb = body.aabb();
        let mut best: Option<(f32, Push, usize)> = None;
        for (i, o) in obstacles.iter().enumerate() {
            if !aabb.intersects(o, tolerance) {
                continue;
            }
            let candidates = [
                (aabb.bottom() - o.top(), Push::Up),
                (o.bottom() - aabb.top(), Push::Down),
                (aabb.right() - o.left(), Push::Left),
                (o.right() - aabb.left(), Push::Right),
            ];
            for (depth, push) in candidates {
                if best.is_none_or(|(d, _, _)| depth < d) {
                    best = Some((depth, push, i));
                }
            }
        }

        let Some((_, push, i)) = best else {
            return;
        };
        let o = &obstacles[i];
        let half = body.half_extents;
        match push {
            Push::Up => {
                body.position.y = o.top() - half.y;
                body.velocity.y = body.velocity.y.min(0.0);
                report.floor = Some(i);
            },
            Push::Down => {
                body.position.y = o.bottom() + half.y;
                body.velocity.y = body.velocity.y.max(0.0);
                report.ceiling = Some(i);
            },
            Push::Left => {
                body.position.x = o.left() - half.x;
                body.velocity.x = body.velocity.x.min(0.0);
                body.on_wall = true;
                body.wall_direction = 1;
                report.wall = Some(i);
            },
            Push::Right => {
                body.position.x = o.right() + half.x;
                body.velocity.x = body.velocity.x.max(0.0);
                body.on_wall = true;
                body.wall_direction = -1;
                report.wall = Some(i);
            },
        }
        report.corrected = true;
        tracing::trace!(obstacle = i, ?push, "Penetration corrected");
    }
}

/// Integrate the body by `dt` against static geometry.
///
/// The horizontal pass is fully resolved before the vertical pass. With
/// `preserve_horizontal_velocity` a wall contact clamps position only.
pub fn move_and_collide(
    body: &mut KinematicBody,
    dt: f32,
    obstacles: &[Aabb],
    params: &CollisionParams,
    preserve_horizontal_velocity: bool,
) -> MoveReport {
    body.clear_contacts();
    let mut report = MoveReport::default();

    let dx = body.velocity.x * dt;
    let sweep = sweep_axis(
        body.position,
        body.half_extents,
        dx,
        Axis::Horizontal,
        obstacles,
    );
    body.position.x = sweep.center;
    if let Some(contact) = sweep.contact {
        body.on_wall = true;
        body.wall_direction = if contact.kind == ContactKind::WallRight {
            1
        } else {
            -1
        };
        if !preserve_horizontal_velocity {
            body.velocity.x = 0.0;
        }
        report.wall = Some(contact.obstacle);
    }

    report.impact_speed = body.velocity.y;
    let dy = body.velocity.y * dt;
    let sweep = sweep_axis(
        body.position,
        body.half_extents,
        dy,
        Axis::Vertical,
        obstacles,
    );
    body.position.y = sweep.center;
    if let Some(contact) = sweep.contact {
        body.velocity.y = 0.0;
        match contact.kind {
            ContactKind::Floor => report.floor = Some(contact.obstacle),
            _ => report.ceiling = Some(contact.obstacle),
        }
    }

    if report.floor.is_none()
        && body.velocity.y >= 0.0
        && let Some((i, top)) = probe_ground(
            &body.aabb(),
            obstacles,
            params.probe_depth,
            params.snap_tolerance,
        )
    {
        body.position.y = top - body.half_extents.y;
        body.velocity.y = 0.0;
        report.floor = Some(i);
    }

    correct_penetration(body, obstacles, params.penetration_tolerance, &mut report);

    body.on_ground = report.floor.is_some();
    body.on_ceiling = report.ceiling.is_some();
    report
}
