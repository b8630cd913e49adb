//! Circle-circle narrow phase

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Whether the circles overlap or touch within the slop
    pub hit: bool,
    /// Contact point on the surface of the first circle
    pub point: Vec2,
    /// Unit normal pointing from the first circle toward the second
    pub normal: Vec2,
    /// Overlap depth; negative while separated but inside the slop
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

/// Check two circles for contact.
///
/// `slop` lets resting bodies that were pushed exactly apart keep reporting
/// contact instead of flickering between touching and separated.
pub fn circle_circle(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32, slop: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    let penetration = a_radius + b_radius - dist;

    if penetration < -slop {
        return CollisionResult::miss();
    }

    // Coincident centers have no defined direction; push along +Y
    let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::Y };

    CollisionResult {
        hit: true,
        point: a_pos + normal * a_radius,
        normal,
        penetration,
    }
}
