//! Collision detection for circles and axis-aligned boundary boxes
//!
//! Detection only; response lives in the physics step.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Unit normal pointing from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles
///
/// Normal points from `a` to `b`. Coincident centers get an arbitrary
/// upward normal so the pair still separates.
pub fn circle_circle(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let radii = a_radius + b_radius;
    let dist_sq = delta.length_squared();

    if dist_sq >= radii * radii {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 {
        delta / dist
    } else {
        Vec2::NEG_Y
    };

    CollisionResult {
        hit: true,
        point: a_pos + normal * (a_radius - (radii - dist) * 0.5),
        normal,
        penetration: radii - dist,
    }
}

/// Check overlap between a circle and an axis-aligned box
///
/// Normal points from the box toward the circle (the direction the circle
/// must move to separate).
pub fn circle_rect(
    circle_pos: Vec2,
    radius: f32,
    box_center: Vec2,
    half_extents: Vec2,
) -> CollisionResult {
    let local = circle_pos - box_center;
    let closest = local.clamp(-half_extents, half_extents);
    let inside = closest == local;

    if !inside {
        let delta = local - closest;
        let dist_sq = delta.length_squared();
        if dist_sq >= radius * radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        let normal = if dist > 1e-6 { delta / dist } else { Vec2::NEG_Y };
        return CollisionResult {
            hit: true,
            point: box_center + closest,
            normal,
            penetration: radius - dist,
        };
    }

    // Center is inside the box: push out through the nearest face
    let to_x = half_extents.x - local.x.abs();
    let to_y = half_extents.y - local.y.abs();
    let (normal, depth) = if to_x < to_y {
        (Vec2::new(local.x.signum(), 0.0), to_x)
    } else {
        (Vec2::new(0.0, local.y.signum()), to_y)
    };

    CollisionResult {
        hit: true,
        point: circle_pos - normal * radius,
        normal,
        penetration: depth + radius,
    }
}
