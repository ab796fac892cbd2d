//! Exact overlap tests for the narrow phase.

use crate::collision::{Aabb, BoundarySide, Penetration};
use crate::math::vec2::Vec2;
use crate::shapes::Rect;

/// Distances below this are treated as coincident points.
pub const DISTANCE_EPSILON: f64 = 1e-10;

/// Normal used when two centers coincide and no direction can be derived.
pub const FALLBACK_NORMAL: Vec2 = Vec2::UP;

/// Checks a circle against one wall of the world box.
/// Returns the inward normal and how far the circle pokes through the wall.
pub fn check_circle_boundary(center: Vec2, radius: f64, bounds: &Aabb<2>, side: BoundarySide) -> Option<Penetration> {
    let depth = match side {
        BoundarySide::Left => bounds.min[0] - (center.x - radius),
        BoundarySide::Right => (center.x + radius) - bounds.max[0],
        BoundarySide::Bottom => bounds.min[1] - (center.y - radius),
        BoundarySide::Top => (center.y + radius) - bounds.max[1],
    };
    if depth > 0.0 {
        Some(Penetration { normal: side.inward_normal(), depth })
    } else {
        None
    }
}

/// Checks for overlap between two circles.
/// The normal points from circle A toward circle B.
pub fn check_circle_circle(center_a: Vec2, radius_a: f64, center_b: Vec2, radius_b: f64) -> Option<Penetration> {
    let dist_vec = center_b - center_a;
    let dist_sq = dist_vec.magnitude_squared();
    let radii_sum = radius_a + radius_b;

    // Strict: touching circles do not collide
    if dist_sq >= radii_sum * radii_sum {
        return None;
    }

    let distance = dist_sq.sqrt();
    let normal = if distance > DISTANCE_EPSILON {
        dist_vec * (1.0 / distance)
    } else {
        log::trace!("coincident circle centers at {:?}, using fallback normal", center_a);
        FALLBACK_NORMAL
    };
    Some(Penetration { normal, depth: radii_sum - distance })
}

/// Checks a circle against an axis-aligned rectangle centered at `rect_center`.
/// The normal points from the rectangle toward the circle's center.
///
/// When the center lies inside the rectangle the closest perimeter point is
/// undefined as a direction, so the nearest edge is used instead: the normal
/// is that edge's outward axis and the depth is the radius plus the distance
/// to the edge.
pub fn check_circle_rect(center: Vec2, radius: f64, rect_center: Vec2, rect: &Rect) -> Option<Penetration> {
    let [hw, hh] = rect.half_extents();
    let (left, right) = (rect_center.x - hw, rect_center.x + hw);
    let (bottom, top) = (rect_center.y - hh, rect_center.y + hh);

    let closest = Vec2::new(center.x.clamp(left, right), center.y.clamp(bottom, top));
    let dist_vec = center - closest;
    let distance = dist_vec.magnitude();

    if distance >= radius {
        return None;
    }

    if distance > DISTANCE_EPSILON {
        return Some(Penetration { normal: dist_vec * (1.0 / distance), depth: radius - distance });
    }

    // Center inside (or on) the rectangle: push out through the nearest edge
    let edges = [
        (center.x - left, Vec2::new(-1.0, 0.0)),
        (right - center.x, Vec2::new(1.0, 0.0)),
        (center.y - bottom, Vec2::new(0.0, -1.0)),
        (top - center.y, Vec2::new(0.0, 1.0)),
    ];
    let (edge_dist, normal) = edges
        .into_iter()
        .fold((f64::INFINITY, FALLBACK_NORMAL), |best, edge| if edge.0 < best.0 { edge } else { best });
    Some(Penetration { normal, depth: radius + edge_dist.max(0.0) })
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    fn world() -> Aabb<2> {
        Aabb::new([0.0, 0.0], [10.0, 10.0])
    }

    #[test]
    fn test_boundary_no_contact_inside() {
        for side in BoundarySide::ALL {
            assert!(check_circle_boundary(Vec2::new(5.0, 5.0), 1.0, &world(), side).is_none());
        }
    }

    #[test]
    fn test_boundary_floor_contact() {
        let p = check_circle_boundary(Vec2::new(5.0, 0.25), 0.5, &world(), BoundarySide::Bottom).unwrap();
        assert_eq!(p.normal, Vec2::new(0.0, 1.0));
        assert!((p.depth - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_boundary_corner_touches_two_walls() {
        let hits: Vec<BoundarySide> = BoundarySide::ALL
            .into_iter()
            .filter(|&side| check_circle_boundary(Vec2::new(9.8, 9.9), 0.5, &world(), side).is_some())
            .collect();
        assert_eq!(hits, vec![BoundarySide::Right, BoundarySide::Top]);
    }

    #[test]
    fn test_check_circle_circle_no_collision() {
        assert!(check_circle_circle(Vec2::ZERO, 1.0, Vec2::new(3.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_check_circle_circle_touching() {
        // Strict comparison: exactly touching is not a collision
        assert!(check_circle_circle(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_check_circle_circle_colliding() {
        let p = check_circle_circle(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 1.0).unwrap();
        assert!((p.normal.x - 1.0).abs() < EPSILON);
        assert!(p.normal.y.abs() < EPSILON);
        assert!((p.depth - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_check_circle_circle_concentric() {
        let p = check_circle_circle(Vec2::new(1.0, 1.0), 1.0, Vec2::new(1.0, 1.0), 0.5).unwrap();
        assert_eq!(p.normal, FALLBACK_NORMAL);
        assert!((p.depth - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_check_circle_rect_no_collision() {
        let rect = Rect::new(2.0, 2.0);
        assert!(check_circle_rect(Vec2::new(3.0, 0.0), 1.0, Vec2::ZERO, &rect).is_none());
    }

    #[test]
    fn test_check_circle_rect_face() {
        let rect = Rect::new(2.0, 2.0);
        let p = check_circle_rect(Vec2::new(1.5, 0.2), 1.0, Vec2::ZERO, &rect).unwrap();
        assert!((p.normal.x - 1.0).abs() < EPSILON);
        assert!(p.normal.y.abs() < EPSILON);
        assert!((p.depth - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_check_circle_rect_corner() {
        let rect = Rect::new(2.0, 2.0);
        let center = Vec2::new(1.5, 1.5);
        let p = check_circle_rect(center, 1.0, Vec2::ZERO, &rect).unwrap();
        let expected = Vec2::new(1.0, 1.0) * (1.0 / 2f64.sqrt());
        assert!((p.normal.x - expected.x).abs() < EPSILON);
        assert!((p.normal.y - expected.y).abs() < EPSILON);
        assert!((p.depth - (1.0 - 0.5f64.hypot(0.5))).abs() < EPSILON);
    }

    #[test]
    fn test_check_circle_rect_interior_uses_nearest_edge() {
        let rect = Rect::new(4.0, 2.0);
        let rect_center = Vec2::new(10.0, 10.0);
        // 0.3 below the top edge, far from the others
        let p = check_circle_rect(Vec2::new(10.5, 10.7), 0.5, rect_center, &rect).unwrap();
        assert_eq!(p.normal, Vec2::new(0.0, 1.0));
        assert!((p.depth - 0.8).abs() < EPSILON);

        // Near the left edge
        let p = check_circle_rect(Vec2::new(8.1, 10.0), 0.5, rect_center, &rect).unwrap();
        assert_eq!(p.normal, Vec2::new(-1.0, 0.0));
        assert!((p.depth - 0.6).abs() < EPSILON);
    }

    #[test]
    fn test_check_circle_rect_interior_at_center() {
        let rect = Rect::new(2.0, 2.0);
        let p = check_circle_rect(Vec2::ZERO, 0.25, Vec2::ZERO, &rect).unwrap();
        let axes = [
            Vec2::new(1.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, -1.0),
        ];
        assert!(axes.contains(&p.normal));
        assert!(p.depth > 0.0);
        assert!((p.depth - 1.25).abs() < EPSILON);
    }
}
