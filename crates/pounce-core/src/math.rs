use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A 2D vector in world units. Screen convention: `y` grows downward.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or `ZERO` for a degenerate input.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > f32::EPSILON && len.is_finite() {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle stored as min/max corners.
///
/// With `y` down, `top()` is the smaller y and `bottom()` the larger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle from a top-left corner and a size.
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(x + width, y + height))
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn left(&self) -> f32 {
        self.min.x
    }

    pub fn right(&self) -> f32 {
        self.max.x
    }

    pub fn top(&self) -> f32 {
        self.min.y
    }

    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Self {
        Self::new(
            Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Overlap test that ignores contacts shallower than `epsilon`.
    ///
    /// Boxes resting flush against each other do not intersect.
    pub fn intersects(&self, other: &Aabb, epsilon: f32) -> bool {
        self.overlap_x(other) > epsilon && self.overlap_y(other) > epsilon
    }

    /// Signed horizontal overlap depth; negative when separated.
    pub fn overlap_x(&self, other: &Aabb) -> f32 {
        self.max.x.min(other.max.x) - self.min.x.max(other.min.x)
    }

    /// Signed vertical overlap depth; negative when separated.
    pub fn overlap_y(&self, other: &Aabb) -> f32 {
        self.max.y.min(other.max.y) - self.min.y.max(other.min.y)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_zero_vector_stays_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn flush_boxes_do_not_intersect() {
        let floor = Aabb::from_rect(0.0, 100.0, 200.0, 20.0);
        let body = Aabb::from_center(Vec2::new(50.0, 76.0), Vec2::new(16.0, 24.0));
        assert_eq!(body.bottom(), floor.top());
        assert!(!body.intersects(&floor, 1e-3));

        let sunk = body.translated(Vec2::new(0.0, 0.5));
        assert!(sunk.intersects(&floor, 1e-3));
    }

    #[test]
    fn overlap_depths_are_signed() {
        let a = Aabb::from_rect(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::from_rect(8.0, 12.0, 10.0, 10.0);
        assert_eq!(a.overlap_x(&b), 2.0);
        assert_eq!(a.overlap_y(&b), -2.0);
    }

    #[test]
    fn edges_follow_y_down_convention() {
        let r = Aabb::from_rect(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.top(), 20.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.center(), Vec2::new(25.0, 40.0));
        assert!(r.contains_point(Vec2::new(10.0, 60.0)));
    }

    #[test]
    fn union_spans_start_and_end_of_a_move() {
        let start = Aabb::from_center(Vec2::new(0.0, 0.0), Vec2::new(16.0, 24.0));
        let end = start.translated(Vec2::new(0.0, 70.0));
        let swept = start.union(&end);
        assert_eq!(swept.top(), -24.0);
        assert_eq!(swept.bottom(), 94.0);
        assert_eq!(swept.width(), 32.0);
        let between = Aabb::from_rect(-50.0, 30.0, 100.0, 20.0);
        assert!(!start.intersects(&between, 1e-3) && !end.intersects(&between, 1e-3));
        assert!(swept.intersects(&between, 1e-3));
    }
}
