//! Geometry primitives for the skirmish engine.
//!
//! All simulation math is plain `f32`: the engine is continuous-space
//! (gun bearings, lead prediction, flank cones) and trades bit-exact
//! cross-platform replay for seeded-RNG reproducibility on a single
//! platform.

use serde::{Deserialize, Serialize};

/// 2D map-space vector. No invariants beyond finiteness.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Squared length (avoids sqrt for comparisons).
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Squared distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Unit-length copy, or zero for degenerate input.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < 1e-6 {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// Perpendicular vector (rotated 90 degrees counter-clockwise).
    #[must_use]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Bearing of this vector in radians, in (-pi, pi].
    #[must_use]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Unit vector pointing along `angle` radians.
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Component-wise clamp into a rectangle.
    #[must_use]
    pub fn clamp_rect(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// Axis-aligned rectangle, stored as origin plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Rectangle grown by `pad` on every side.
    #[must_use]
    pub fn expanded(&self, pad: f32) -> Self {
        Self::new(self.x - pad, self.y - pad, self.w + pad * 2.0, self.h + pad * 2.0)
    }

    /// Whether a point lies inside (inclusive edges).
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Whether a circle overlaps this rectangle.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp_rect(
            Vec2::new(self.x, self.y),
            Vec2::new(self.x + self.w, self.y + self.h),
        );
        center.distance_squared(closest) <= radius * radius
    }

    /// Whether two rectangles overlap.
    #[must_use]
    pub fn intersects_rect(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Slab test: does segment `a`-`b` pass through this rectangle?
    ///
    /// Degenerate (zero-length) segments fall back to containment.
    #[must_use]
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        let d = b - a;
        if d.length_squared() < 1e-12 {
            return self.contains(a);
        }

        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for (origin, delta, lo, hi) in [
            (a.x, d.x, self.x, self.x + self.w),
            (a.y, d.y, self.y, self.y + self.h),
        ] {
            if delta.abs() < 1e-9 {
                if origin < lo || origin > hi {
                    return false;
                }
            } else {
                let inv = 1.0 / delta;
                let mut t0 = (lo - origin) * inv;
                let mut t1 = (hi - origin) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return false;
                }
            }
        }

        true
    }
}

/// Normalize an angle into (-pi, pi].
#[must_use]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Shortest signed arc from `from` to `to`, in (-pi, pi].
#[must_use]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Whether two circles overlap.
#[must_use]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalized_unit_length() {
        let v = Vec2::new(3.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-5);
        assert!((v.x - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_normalized_zero_vector() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
    }

    #[test]
    fn test_angle_roundtrip() {
        let v = Vec2::from_angle(1.2);
        assert!((v.angle() - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-4);
        assert!((normalize_angle(-3.0 * PI) - PI).abs() < 1e-4);
    }

    #[test]
    fn test_angle_delta_shortest_arc() {
        let d = angle_delta(0.9 * PI, -0.9 * PI);
        assert!((d - 0.2 * PI).abs() < 1e-4, "crossed the seam: {d}");
    }

    #[test]
    fn test_segment_slab_hit_and_miss() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.intersects_segment(Vec2::new(0.0, 20.0), Vec2::new(40.0, 20.0)));
        assert!(!r.intersects_segment(Vec2::new(0.0, 0.0), Vec2::new(40.0, 5.0)));
        // Parallel to an axis, outside the slab
        assert!(!r.intersects_segment(Vec2::new(0.0, 5.0), Vec2::new(40.0, 5.0)));
    }

    #[test]
    fn test_segment_degenerate_uses_containment() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let inside = Vec2::new(5.0, 5.0);
        let outside = Vec2::new(15.0, 5.0);
        assert!(r.intersects_segment(inside, inside));
        assert!(!r.intersects_segment(outside, outside));
    }

    #[test]
    fn test_circle_rect_overlap() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.intersects_circle(Vec2::new(-2.0, 5.0), 3.0));
        assert!(!r.intersects_circle(Vec2::new(-5.0, 5.0), 3.0));
    }
}
