//! Geometric queries shared by the vision and collision passes.
//!
//! All tests that decide "seen or not seen" are inclusive at the
//! boundary, while tests that decide "blocked or not blocked" against
//! obstacle rectangles are strict. The original field tuning depends
//! on this split; see the individual functions.

use serde::{Deserialize, Serialize};

use crate::math::{heading_vector, Vec2, EPSILON};

/// Axis-aligned rectangle in field units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner (minimum x and y).
    pub origin: Vec2,
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle from its top-left corner and extents.
    #[must_use]
    pub const fn new(origin: Vec2, width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Bottom-right corner (maximum x and y).
    #[must_use]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.origin.x + self.width, self.origin.y + self.height)
    }

    /// Point inside or on the rectangle closest to `p`.
    #[must_use]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let max = self.max();
        Vec2::new(p.x.clamp(self.origin.x, max.x), p.y.clamp(self.origin.y, max.y))
    }

    /// Whether a circle intersects the rectangle.
    ///
    /// Strict comparison: a circle exactly touching an edge does not
    /// count as overlapping, so an agent may rest flush against a wall.
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, radius: f64) -> bool {
        center.distance(self.closest_point(center)) < radius
    }
}

/// Whether two circles touch or overlap.
///
/// Inclusive comparison, and a circle always overlaps itself, so an
/// agent's own entry in a vision sweep comes out visible.
#[must_use]
pub fn circles_overlap(a: Vec2, radius_a: f64, b: Vec2, radius_b: f64) -> bool {
    a.distance(b) <= radius_a + radius_b
}

/// Whether `target` lies within the viewer's field of view cone.
///
/// The cone opens `fov_deg / 2` to either side of the heading and the
/// boundary counts as visible. A target coincident with the viewer is
/// treated as dead ahead rather than producing an undefined angle.
#[must_use]
pub fn in_field_of_view(viewer: Vec2, heading_deg: f64, fov_deg: f64, target: Vec2) -> bool {
    let offset = target - viewer;
    if offset.length() < EPSILON {
        return true;
    }
    let cos_angle = offset
        .normalize()
        .dot(heading_vector(heading_deg))
        .clamp(-1.0, 1.0);
    cos_angle.acos() <= (fov_deg / 2.0).to_radians()
}

/// Whether a ray starting at `origin` hits a circle.
///
/// Solves the quadratic for the ray/circle intersection and accepts a
/// hit when the far root lies at or past the origin. A ray cast from
/// inside the circle therefore hits, while a circle entirely behind
/// the origin does not.
#[must_use]
pub fn ray_hits_circle(origin: Vec2, direction: Vec2, center: Vec2, radius: f64) -> bool {
    let offset = origin - center;
    let a = direction.dot(direction);
    let b = 2.0 * direction.dot(offset);
    let c = offset.dot(offset) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return false;
    }
    let t = (-b + discriminant.sqrt()) / (2.0 * a);
    t >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_closest_point() {
        let rect = Rect::new(Vec2::new(10.0, 10.0), 10.0, 10.0);
        // Point inside maps to itself.
        assert_eq!(
            rect.closest_point(Vec2::new(15.0, 12.0)),
            Vec2::new(15.0, 12.0)
        );
        // Point left of the rect clamps to the left edge.
        assert_eq!(
            rect.closest_point(Vec2::new(0.0, 15.0)),
            Vec2::new(10.0, 15.0)
        );
        // Point past the far corner clamps to the corner.
        assert_eq!(
            rect.closest_point(Vec2::new(30.0, 30.0)),
            Vec2::new(20.0, 20.0)
        );
    }

    #[test]
    fn test_circle_rect_overlap_is_strict() {
        let rect = Rect::new(Vec2::new(10.0, 10.0), 10.0, 10.0);
        // Exactly touching the right edge: not an overlap.
        assert!(!rect.overlaps_circle(Vec2::new(30.0, 15.0), 10.0));
        // One unit closer: overlap.
        assert!(rect.overlaps_circle(Vec2::new(29.0, 15.0), 10.0));
        // Center inside the rect always overlaps.
        assert!(rect.overlaps_circle(Vec2::new(15.0, 15.0), 1.0));
    }

    #[test]
    fn test_circles_overlap_is_inclusive() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        // Exactly touching counts.
        assert!(circles_overlap(a, 4.0, b, 6.0));
        assert!(!circles_overlap(a, 4.0, b, 5.0));
        // Coincident circles always overlap.
        assert!(circles_overlap(a, 0.0, a, 0.0));
    }

    #[test]
    fn test_field_of_view_basic() {
        let viewer = Vec2::new(0.0, 0.0);
        // Heading north, 90 degree cone: up is visible, down is not.
        assert!(in_field_of_view(viewer, 0.0, 90.0, Vec2::new(0.0, -10.0)));
        assert!(!in_field_of_view(viewer, 0.0, 90.0, Vec2::new(0.0, 10.0)));
    }

    #[test]
    fn test_field_of_view_near_boundary() {
        let viewer = Vec2::new(0.0, 0.0);
        // Half angle is 45 degrees; probe just inside and just outside.
        let inside = heading_vector(44.9) * 10.0;
        let outside = heading_vector(45.1) * 10.0;
        assert!(in_field_of_view(viewer, 0.0, 90.0, inside));
        assert!(!in_field_of_view(viewer, 0.0, 90.0, outside));
    }

    #[test]
    fn test_field_of_view_coincident_target() {
        let viewer = Vec2::new(5.0, 5.0);
        assert!(in_field_of_view(viewer, 123.0, 10.0, viewer));
    }

    #[test]
    fn test_ray_hits_circle() {
        let center = Vec2::new(10.0, 0.0);
        // Straight at the circle.
        assert!(ray_hits_circle(
            Vec2::ZERO,
            Vec2::new(1.0, 0.0),
            center,
            2.0
        ));
        // Pointing away: the circle is behind the origin.
        assert!(!ray_hits_circle(
            Vec2::ZERO,
            Vec2::new(-1.0, 0.0),
            center,
            2.0
        ));
        // Parallel ray passing above the circle.
        assert!(!ray_hits_circle(
            Vec2::new(0.0, 5.0),
            Vec2::new(1.0, 0.0),
            center,
            2.0
        ));
        // Origin inside the circle still hits.
        assert!(ray_hits_circle(
            center,
            Vec2::new(0.0, 1.0),
            center,
            2.0
        ));
    }

    #[test]
    fn test_ray_grazing_circle() {
        // Ray along y = 2 grazes a circle of radius 2 at (10, 0).
        let hit = ray_hits_circle(
            Vec2::new(0.0, 2.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(10.0, 0.0),
            2.0,
        );
        assert!(hit);
    }
}
