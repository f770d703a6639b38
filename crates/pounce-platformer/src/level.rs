use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use pounce_core::math::{Aabb, Vec2};

use crate::enemy::{EnemyKind, EnemySpawn};

/// Play-area limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    /// Bodies whose center passes below this y respawn.
    pub respawn_y: f32,
    /// Horizontal positions wrap from `max_x` back to `min_x`.
    #[serde(default)]
    pub wrap_x: bool,
}

impl WorldBounds {
    /// Whether `p` lies inside the bounds grown by `margin` on every side.
    pub fn contains(&self, p: Vec2, margin: f32) -> bool {
        p.x >= self.min_x - margin
            && p.x <= self.max_x + margin
            && p.y >= self.min_y - margin
            && p.y <= self.max_y + margin
    }

    /// `p` with its x folded into `[min_x, max_x)` when wrapping is on.
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        let width = self.max_x - self.min_x;
        if !self.wrap_x || width.is_nan() || width <= 0.0 || !p.x.is_finite() {
            return p;
        }
        let x = self.min_x + (p.x - self.min_x).rem_euclid(width);
        // rem_euclid can round up to exactly `width`
        let x = if x >= self.max_x { self.min_x } else { x };
        Vec2::new(x, p.y)
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 2400.0,
            min_y: -400.0,
            max_y: 1200.0,
            respawn_y: 1000.0,
            wrap_x: false,
        }
    }
}

/// Rectangle as authored in level files: top-left corner plus size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RectDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// On-disk level description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelDef {
    pub obstacles: Vec<RectDef>,
    pub spawn: Vec2,
    #[serde(default)]
    pub targets: Vec<Vec2>,
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    #[serde(default)]
    pub bounds: WorldBounds,
}

/// Immutable static geometry plus spawn points.
///
/// Obstacles are fixed at construction; nothing can mutate them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    obstacles: Vec<Aabb>,
    spawn: Vec2,
    targets: Vec<Vec2>,
    enemies: Vec<EnemySpawn>,
    bounds: WorldBounds,
}

impl Level {
    /// Build a level, dropping degenerate obstacles (non-finite or empty).
    pub fn new(obstacles: Vec<Aabb>, spawn: Vec2, targets: Vec<Vec2>, bounds: WorldBounds) -> Self {
        let before = obstacles.len();
        let obstacles: Vec<Aabb> = obstacles
            .into_iter()
            .filter(|o| o.min.is_finite() && o.max.is_finite() && o.width() > 0.0 && o.height() > 0.0)
            .collect();
        if obstacles.len() != before {
            tracing::warn!(
                "Dropped {} degenerate obstacles",
                before - obstacles.len()
            );
        }
        Self {
            obstacles,
            spawn,
            targets,
            enemies: Vec::new(),
            bounds,
        }
    }

    /// Add enemy spawn points.
    pub fn with_enemies(mut self, enemies: Vec<EnemySpawn>) -> Self {
        self.enemies = enemies;
        self
    }

    pub fn from_def(def: LevelDef) -> Self {
        let obstacles = def
            .obstacles
            .iter()
            .map(|r| Aabb::from_rect(r.x, r.y, r.width, r.height))
            .collect();
        Self::new(obstacles, def.spawn, def.targets, def.bounds).with_enemies(def.enemies)
    }

    /// A level with no geometry. Bodies fall until they respawn.
    pub fn empty(spawn: Vec2) -> Self {
        Self::new(Vec::new(), spawn, Vec::new(), WorldBounds::default())
    }

    /// The hand-built showcase layout: four ground slabs with pits, floating
    /// platforms, three walls and an upper tier. One ground and one flying
    /// enemy patrol the far side.
    pub fn demo() -> Self {
        let rects: [(f32, f32, f32, f32); 17] = [
            // Ground
            (0.0, 600.0, 400.0, 100.0),
            (600.0, 600.0, 400.0, 100.0),
            (1200.0, 600.0, 400.0, 100.0),
            (1800.0, 600.0, 400.0, 100.0),
            // Floating
            (300.0, 500.0, 150.0, 20.0),
            (700.0, 450.0, 120.0, 20.0),
            (200.0, 350.0, 100.0, 20.0),
            (900.0, 400.0, 140.0, 20.0),
            (1300.0, 350.0, 100.0, 20.0),
            (1600.0, 500.0, 150.0, 20.0),
            (2000.0, 400.0, 120.0, 20.0),
            // Walls
            (550.0, 300.0, 20.0, 200.0),
            (1100.0, 200.0, 20.0, 250.0),
            (1800.0, 300.0, 20.0, 200.0),
            // Upper tier
            (100.0, 200.0, 200.0, 20.0),
            (800.0, 150.0, 180.0, 20.0),
            (1500.0, 200.0, 200.0, 20.0),
        ];
        let obstacles = rects
            .iter()
            .map(|&(x, y, w, h)| Aabb::from_rect(x, y, w, h))
            .collect();
        let targets = vec![
            Vec2::new(350.0, 570.0),
            Vec2::new(950.0, 570.0),
            Vec2::new(1350.0, 570.0),
            Vec2::new(350.0, 470.0),
            Vec2::new(950.0, 370.0),
        ];
        Self::new(
            obstacles,
            Vec2::new(200.0, 400.0),
            targets,
            WorldBounds::default(),
        )
        .with_enemies(vec![
            EnemySpawn::new(Vec2::new(1450.0, 584.0), EnemyKind::Ground),
            EnemySpawn::new(Vec2::new(1900.0, 250.0), EnemyKind::Flying),
        ])
    }

    pub fn obstacles(&self) -> &[Aabb] {
        &self.obstacles
    }

    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    pub fn target_spawns(&self) -> &[Vec2] {
        &self.targets
    }

    pub fn enemy_spawns(&self) -> &[EnemySpawn] {
        &self.enemies
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    /// Obstacles overlapping `area` by more than `epsilon`, with their indices.
    pub fn overlapping<'a>(
        &'a self,
        area: &'a Aabb,
        epsilon: f32,
    ) -> impl Iterator<Item = (usize, &'a Aabb)> + 'a {
        self.obstacles
            .iter()
            .enumerate()
            .filter(move |(_, o)| area.intersects(o, epsilon))
    }

    /// Smallest top edge at or below `y` among obstacles that horizontally
    /// overlap the span `[left, right]`.
    pub fn nearest_top_below(&self, left: f32, right: f32, y: f32) -> Option<f32> {
        self.obstacles
            .iter()
            .filter(|o| o.right() > left && o.left() < right && o.top() >= y)
            .map(|o| o.top())
            .min_by(f32::total_cmp)
    }

    /// Whether `to` is visible from `from`: no farther than `range`, and no
    /// obstacle touches any small sample box stepped `step` apart along the
    /// segment.
    pub fn line_of_sight(&self, from: Vec2, to: Vec2, range: f32, step: f32) -> bool {
        let distance = from.distance(to);
        if distance.is_nan() || distance > range {
            return false;
        }
        if distance == 0.0 {
            return true;
        }
        let step = step.max(1.0);
        let direction = (to - from).normalized();
        let half = Vec2::new(SIGHT_SAMPLE_HALF, SIGHT_SAMPLE_HALF);
        (0..(distance / step) as usize).all(|i| {
            let sample = Aabb::from_center(from + direction * (i as f32 * step), half);
            self.overlapping(&sample, 0.0).next().is_none()
        })
    }
}

/// Half edge of the boxes sampled along a sight line.
const SIGHT_SAMPLE_HALF: f32 = 2.0;

/// Number of floor sections in a generated level.
const SECTIONS: u32 = 12;
/// Width of one floor section.
const SECTION_WIDTH: f32 = 200.0;
/// Top edge of the generated floor.
const FLOOR_Y: f32 = 600.0;

/// Generate a deterministic level from a seed.
///
/// The first two sections are always solid floor under the spawn point.
pub fn generate_level(seed: u64) -> Level {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut obstacles = Vec::new();
    let mut targets = Vec::new();
    let mut enemies = Vec::new();

    for i in 0..SECTIONS {
        let base_x = i as f32 * SECTION_WIDTH;
        let safe = i < 2;

        // Floor, or a pit
        if safe || rng.random_range(0u8..4) != 0 {
            obstacles.push(Aabb::from_rect(base_x, FLOOR_Y, SECTION_WIDTH, 100.0));
            if !safe && rng.random_range(0u8..3) == 0 {
                targets.push(Vec2::new(base_x + SECTION_WIDTH * 0.5, FLOOR_Y - 30.0));
            }
            if !safe && rng.random_range(0u8..5) == 0 {
                enemies.push(EnemySpawn::new(
                    Vec2::new(base_x + SECTION_WIDTH * 0.8, FLOOR_Y - 16.0),
                    EnemyKind::Ground,
                ));
            }
        }

        if safe {
            continue;
        }

        // Floating platforms
        for _ in 0..rng.random_range(0u8..3) {
            let w = rng.random_range(80.0f32..180.0);
            let x = base_x + rng.random_range(0.0f32..(SECTION_WIDTH - 40.0));
            let y = rng.random_range(300.0f32..520.0);
            obstacles.push(Aabb::from_rect(x, y, w, 20.0));
        }

        // Flyers patrol above the platform band
        if rng.random_range(0u8..6) == 0 {
            enemies.push(EnemySpawn::new(
                Vec2::new(base_x + SECTION_WIDTH * 0.5, 250.0),
                EnemyKind::Flying,
            ));
        }

        // Occasional wall for wall jumps
        if rng.random_range(0u8..4) == 0 {
            let x = base_x + rng.random_range(20.0f32..(SECTION_WIDTH - 40.0));
            let h = rng.random_range(150.0f32..260.0);
            obstacles.push(Aabb::from_rect(x, FLOOR_Y - 40.0 - h, 20.0, h));
        }
    }

    Level::new(
        obstacles,
        Vec2::new(100.0, FLOOR_Y - 100.0),
        targets,
        WorldBounds {
            max_x: SECTIONS as f32 * SECTION_WIDTH,
            ..WorldBounds::default()
        },
    )
    .with_enemies(enemies)
}

/// Load a level from a JSON file. Returns `None` if missing or unparseable.
pub fn load_level_from_file(path: &str) -> Option<Level> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<LevelDef>(&content) {
            Ok(def) => Some(Level::from_def(def)),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}");
                None
            },
        },
        Err(_) => None,
    }
}

/// Load the level named by `POUNCE_LEVEL` (default `config/level.json`),
/// falling back to [`Level::demo`].
pub fn load_level() -> Level {
    let path = std::env::var("POUNCE_LEVEL").unwrap_or_else(|_| "config/level.json".to_string());
    load_level_from_file(&path).unwrap_or_else(Level::demo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_generation() {
        let l1 = generate_level(42);
        let l2 = generate_level(42);
        assert_eq!(l1, l2, "Same seed must produce same level");
    }

    #[test]
    fn different_seeds_different_levels() {
        let l1 = generate_level(42);
        let l2 = generate_level(123);
        assert_ne!(
            l1.obstacles(),
            l2.obstacles(),
            "Different seeds should produce different levels"
        );
    }

    #[test]
    fn spawn_has_floor_below() {
        for seed in 0..20 {
            let level = generate_level(seed);
            let spawn = level.spawn();
            let top = level.nearest_top_below(spawn.x - 16.0, spawn.x + 16.0, spawn.y);
            assert_eq!(top, Some(FLOOR_Y), "seed {seed} spawn must stand over floor");
            assert!(
                level.bounds().contains(spawn, 0.0),
                "seed {seed} spawn outside bounds"
            );
        }
    }

    #[test]
    fn degenerate_obstacles_are_dropped() {
        let level = Level::new(
            vec![
                Aabb::from_rect(0.0, 0.0, 10.0, 10.0),
                Aabb::from_rect(0.0, 0.0, 0.0, 10.0),
                Aabb::from_rect(f32::NAN, 0.0, 10.0, 10.0),
            ],
            Vec2::ZERO,
            Vec::new(),
            WorldBounds::default(),
        );
        assert_eq!(level.obstacles().len(), 1);
    }

    #[test]
    fn nearest_top_below_picks_closest_surface() {
        let level = Level::demo();
        // Above the floating platform at (300, 500) and the ground at 600
        assert_eq!(level.nearest_top_below(320.0, 352.0, 400.0), Some(500.0));
        // Below the platform only ground remains
        assert_eq!(level.nearest_top_below(320.0, 352.0, 550.0), Some(600.0));
        // Over the pit between 400 and 600
        assert_eq!(level.nearest_top_below(450.0, 482.0, 550.0), None);
    }

    #[test]
    fn nearest_top_below_ignores_touching_span() {
        let level = Level::new(
            vec![Aabb::from_rect(100.0, 200.0, 50.0, 20.0)],
            Vec2::ZERO,
            Vec::new(),
            WorldBounds::default(),
        );
        assert_eq!(level.nearest_top_below(50.0, 100.0, 0.0), None);
        assert_eq!(level.nearest_top_below(50.0, 101.0, 0.0), Some(200.0));
    }

    #[test]
    fn level_def_parses_json() {
        let json = r#"{
            "obstacles": [{"x": 0, "y": 600, "width": 400, "height": 100}],
            "spawn": {"x": 100, "y": 500}
        }"#;
        let def: LevelDef = serde_json::from_str(json).unwrap();
        let level = Level::from_def(def);
        assert_eq!(level.obstacles()[0], Aabb::from_rect(0.0, 600.0, 400.0, 100.0));
        assert_eq!(level.spawn(), Vec2::new(100.0, 500.0));
        assert!(level.target_spawns().is_empty());
        assert_eq!(*level.bounds(), WorldBounds::default());
    }

    #[test]
    fn level_def_reads_enemies_and_wrap() {
        let json = r#"{
            "obstacles": [],
            "spawn": {"x": 0, "y": 0},
            "enemies": [{"position": {"x": 40, "y": 50}, "kind": "Flying"}],
            "bounds": {"min_x": 0, "max_x": 800, "min_y": 0, "max_y": 600,
                       "respawn_y": 700, "wrap_x": true}
        }"#;
        let level = Level::from_def(serde_json::from_str(json).unwrap());
        assert_eq!(
            level.enemy_spawns(),
            &[EnemySpawn::new(Vec2::new(40.0, 50.0), EnemyKind::Flying)]
        );
        assert!(level.bounds().wrap_x);
    }

    #[test]
    fn wrap_folds_x_into_bounds() {
        let bounds = WorldBounds {
            wrap_x: true,
            ..WorldBounds::default()
        };
        assert_eq!(bounds.wrap(Vec2::new(2410.0, 5.0)), Vec2::new(10.0, 5.0));
        assert_eq!(bounds.wrap(Vec2::new(-10.0, 5.0)), Vec2::new(2390.0, 5.0));
        assert_eq!(bounds.wrap(Vec2::new(2400.0, 5.0)).x, 0.0);
        let fixed = WorldBounds::default();
        assert_eq!(fixed.wrap(Vec2::new(2410.0, 5.0)).x, 2410.0);
    }

    #[test]
    fn line_of_sight_respects_range_and_walls() {
        let level = Level::new(
            vec![Aabb::from_rect(100.0, 0.0, 20.0, 100.0)],
            Vec2::ZERO,
            Vec::new(),
            WorldBounds::default(),
        );
        let eye = Vec2::new(50.0, 50.0);
        assert!(!level.line_of_sight(eye, Vec2::new(200.0, 50.0), 320.0, 8.0));
        // Passing under the wall's bottom edge
        assert!(level.line_of_sight(Vec2::new(50.0, 150.0), Vec2::new(200.0, 150.0), 320.0, 8.0));
        assert!(!level.line_of_sight(Vec2::new(50.0, 150.0), Vec2::new(500.0, 150.0), 320.0, 8.0));
        assert!(level.line_of_sight(eye, eye, 320.0, 8.0));
    }

    #[test]
    fn missing_level_file_is_none() {
        assert!(load_level_from_file("/nonexistent/level.json").is_none());
    }
}
