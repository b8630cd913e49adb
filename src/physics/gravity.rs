//! Per-body gravity and player orientation
//!
//! Only the nearest celestial body pulls on the player. The player is kept
//! upright relative to that body's surface.

use glam::Vec2;

use super::{BodyHandle, PhysicsWorld};
use crate::galaxy::CelestialBody;

/// Angle of the vector from `origin` to `point`
#[inline]
pub fn polar_angle(origin: Vec2, point: Vec2) -> f32 {
    let d = point - origin;
    d.y.atan2(d.x)
}

/// Body angle that makes local up point away from the body's center
#[inline]
pub fn orientation_toward(position: Vec2, body: &CelestialBody) -> f32 {
    polar_angle(body.position(), position) - std::f32::consts::FRAC_PI_2
}

/// Rotate a body-local vector into the world frame
#[inline]
pub fn local_to_world(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Rotate a world vector into a body's local frame
#[inline]
pub fn world_to_local(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(-angle).rotate(v)
}

/// Orient and pull a body toward `nearest`.
///
/// Angular velocity is always zeroed so contact friction cannot spin the
/// body. Returns the applied angle, or `None` when there is no body to
/// orbit, in which case nothing else is touched.
pub fn apply_gravity<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    handle: BodyHandle,
    nearest: Option<&CelestialBody>,
    force: f32,
) -> Option<f32> {
    world.set_angular_velocity(handle, 0.0);

    let body = nearest?;
    let position = world.position(handle)?;

    let theta = polar_angle(body.position(), position);
    let angle = theta - std::f32::consts::FRAC_PI_2;
    world.set_angle(handle, angle);

    // Pull along local down, toward the body's center
    let down = -Vec2::from_angle(theta);
    world.apply_force(handle, down * force);
    Some(angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyDesc, Space};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn player_at(space: &mut Space, pos: Vec2) -> BodyHandle {
        space.add_body(BodyDesc::dynamic_circle(pos, 10.0, 1.0, 100.0))
    }

    #[test]
    fn test_orientation_above_body_is_upright() {
        let body = CelestialBody::new(0, 0, 100);
        let angle = orientation_toward(Vec2::new(0.0, 200.0), &body);
        assert!(angle.abs() < 1e-6);
        // Local up points away from the body
        let up = local_to_world(Vec2::Y, angle);
        assert!((up - Vec2::Y).length() < 1e-6);
    }

    #[test]
    fn test_orientation_right_of_body() {
        let body = CelestialBody::new(0, 0, 100);
        let angle = orientation_toward(Vec2::new(200.0, 0.0), &body);
        assert!((angle + FRAC_PI_2).abs() < 1e-6);
        let up = local_to_world(Vec2::Y, angle);
        assert!((up - Vec2::X).length() < 1e-6);
    }

    #[test]
    fn test_world_local_round_trip() {
        let v = Vec2::new(3.0, -4.0);
        let back = local_to_world(world_to_local(v, 1.2), 1.2);
        assert!((back - v).length() < 1e-5);
    }

    #[test]
    fn test_gravity_pulls_toward_body() {
        let mut space = Space::new();
        let handle = player_at(&mut space, Vec2::new(0.0, 500.0));
        let body = CelestialBody::new(0, 0, 100);

        let angle = apply_gravity(&mut space, handle, Some(&body), 1000.0).unwrap();
        assert!(angle.abs() < 1e-6);
        space.step(0.1);

        let velocity = space.velocity(handle).unwrap();
        assert!(velocity.y < 0.0);
        assert!(velocity.x.abs() < 1e-4);
    }

    #[test]
    fn test_gravity_zeroes_spin() {
        let mut space = Space::new();
        let handle = player_at(&mut space, Vec2::new(-500.0, 0.0));
        space.set_angular_velocity(handle, 5.0);
        let body = CelestialBody::new(0, 0, 100);

        let angle = apply_gravity(&mut space, handle, Some(&body), 1000.0).unwrap();
        assert!((angle - (PI - FRAC_PI_2)).abs() < 1e-5);
        space.step(0.1);
        assert!((space.angle(handle).unwrap() - angle).abs() < 1e-6);
    }

    #[test]
    fn test_no_body_skips_gravity() {
        let mut space = Space::new();
        let handle = player_at(&mut space, Vec2::ZERO);
        space.set_angular_velocity(handle, 2.0);

        assert_eq!(apply_gravity(&mut space, handle, None, 1000.0), None);
        space.step(0.1);
        assert_eq!(space.velocity(handle), Some(Vec2::ZERO));
        assert_eq!(space.angle(handle), Some(0.0));
    }
}
