//! Circle-only rigid-body space
//!
//! Semi-implicit Euler integration, circle-circle contacts with positional
//! correction, restitution and Coulomb friction. Bodies are stored in handle
//! order so every step iterates deterministically.

use std::collections::BTreeMap;

use glam::Vec2;

use super::collision::circle_circle;
use super::{BodyDesc, BodyHandle, BodyKind, ContactEvent, ContactPhase, PhysicsWorld};
use crate::error::PhysicsError;

/// Distance within which separated circles still count as touching
pub const CONTACT_SLOP: f32 = 0.5;

#[derive(Debug, Clone)]
struct RigidBody {
    kind: BodyKind,
    position: Vec2,
    velocity: Vec2,
    angle: f32,
    angular_velocity: f32,
    force: Vec2,
    radius: f32,
    inv_mass: f32,
    inv_moment: f32,
    friction: f32,
    elasticity: f32,
}

impl RigidBody {
    fn from_desc(desc: &BodyDesc) -> Self {
        let inverse = |v: f32| {
            if desc.kind == BodyKind::Static || !v.is_finite() || v <= 0.0 {
                0.0
            } else {
                1.0 / v
            }
        };
        Self {
            kind: desc.kind,
            position: desc.position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            radius: desc.radius,
            inv_mass: inverse(desc.mass),
            inv_moment: inverse(desc.moment),
            friction: desc.friction,
            elasticity: desc.elasticity,
        }
    }

    fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }
}

/// Data for a pair that is currently touching
#[derive(Debug, Clone)]
struct Arbiter {
    normal: Vec2,
    point: Vec2,
    total_impulse: Vec2,
    surface_velocity: Vec2,
}

/// The bundled physics world
#[derive(Debug, Default)]
pub struct Space {
    bodies: BTreeMap<BodyHandle, RigidBody>,
    arbiters: BTreeMap<(BodyHandle, BodyHandle), Arbiter>,
    /// Separate events produced by removals, flushed on the next step
    pending: Vec<ContactEvent>,
    next_id: u32,
}

impl Space {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Number of pairs currently in contact
    pub fn contact_count(&self) -> usize {
        self.arbiters.len()
    }

    pub fn body_kind(&self, handle: BodyHandle) -> Option<BodyKind> {
        self.bodies.get(&handle).map(|b| b.kind)
    }

    fn integrate(&mut self, dt: f32) {
        for body in self.bodies.values_mut().filter(|b| b.is_dynamic()) {
            body.velocity += body.force * body.inv_mass * dt;
            body.position += body.velocity * dt;
            body.angle += body.angular_velocity * dt;
            body.force = Vec2::ZERO;
        }
    }

    /// Detect and resolve every touching pair; returns the new arbiter set
    fn solve_contacts(&mut self) -> BTreeMap<(BodyHandle, BodyHandle), Arbiter> {
        let handles: Vec<BodyHandle> = self.bodies.keys().copied().collect();
        let mut arbiters = BTreeMap::new();

        for (i, &ha) in handles.iter().enumerate() {
            for &hb in &handles[i + 1..] {
                let (a, b) = (&self.bodies[&ha], &self.bodies[&hb]);
                if !a.is_dynamic() && !b.is_dynamic() {
                    continue;
                }

                let result = circle_circle(a.position, a.radius, b.position, b.radius, CONTACT_SLOP);
                if !result.hit {
                    continue;
                }

                let n = result.normal;
                let inv_mass_sum = a.inv_mass + b.inv_mass;
                let mut total_impulse = Vec2::ZERO;
                let mut a_vel = a.velocity;
                let mut b_vel = b.velocity;
                let mut a_pos = a.position;
                let mut b_pos = b.position;

                if result.penetration > 0.0 && inv_mass_sum > 0.0 {
                    // Push apart in proportion to inverse mass
                    let correction = n * (result.penetration / inv_mass_sum);
                    a_pos -= correction * a.inv_mass;
                    b_pos += correction * b.inv_mass;

                    let relative = b_vel - a_vel;
                    let vn = relative.dot(n);
                    if vn < 0.0 {
                        let restitution = a.elasticity.min(b.elasticity);
                        let jn = -(1.0 + restitution) * vn / inv_mass_sum;
                        a_vel -= n * jn * a.inv_mass;
                        b_vel += n * jn * b.inv_mass;

                        // Coulomb friction on the remaining tangential motion
                        let relative = b_vel - a_vel;
                        let tangential = relative - n * relative.dot(n);
                        let tangent = tangential.normalize_or_zero();
                        let mu = (a.friction * b.friction).max(0.0).sqrt();
                        let jt = (-relative.dot(tangent) / inv_mass_sum).clamp(-mu * jn, mu * jn);
                        a_vel -= tangent * jt * a.inv_mass;
                        b_vel += tangent * jt * b.inv_mass;

                        total_impulse = n * jn + tangent * jt;
                    }
                }

                let relative = b_vel - a_vel;
                let surface_velocity = relative - n * relative.dot(n);

                if let Some(body) = self.bodies.get_mut(&ha) {
                    body.position = a_pos;
                    body.velocity = a_vel;
                }
                if let Some(body) = self.bodies.get_mut(&hb) {
                    body.position = b_pos;
                    body.velocity = b_vel;
                }

                arbiters.insert(
                    (ha, hb),
                    Arbiter {
                        normal: n,
                        point: result.point,
                        total_impulse,
                        surface_velocity,
                    },
                );
            }
        }

        arbiters
    }
}

fn event(phase: ContactPhase, (a, b): (BodyHandle, BodyHandle), arbiter: &Arbiter) -> ContactEvent {
    ContactEvent {
        phase,
        a,
        b,
        normal: arbiter.normal,
        contact_points: vec![arbiter.point],
        total_impulse: arbiter.total_impulse,
        surface_velocity: arbiter.surface_velocity,
    }
}

impl PhysicsWorld for Space {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_id.max(1));
        self.next_id = handle.0 + 1;
        self.bodies.insert(handle, RigidBody::from_desc(&desc));
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        self.bodies
            .remove(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;

        // Removing a body ends all of its contacts
        let ended: Vec<_> = self
            .arbiters
            .keys()
            .filter(|(a, b)| *a == handle || *b == handle)
            .copied()
            .collect();
        for pair in ended {
            if let Some(arbiter) = self.arbiters.remove(&pair) {
                self.pending.push(event(ContactPhase::Separate, pair, &arbiter));
            }
        }
        Ok(())
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.force += force;
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2, local_point: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.velocity += impulse * body.inv_mass;
            let arm = Vec2::from_angle(body.angle).rotate(local_point);
            body.angular_velocity += arm.perp_dot(impulse) * body.inv_moment;
        }
    }

    fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        self.integrate(dt);
        let current = self.solve_contacts();

        let mut events = std::mem::take(&mut self.pending);
        for (pair, arbiter) in &self.arbiters {
            if !current.contains_key(pair) {
                events.push(event(ContactPhase::Separate, *pair, arbiter));
            }
        }
        for (pair, arbiter) in &current {
            if !self.arbiters.contains_key(pair) {
                events.push(event(ContactPhase::Begin, *pair, arbiter));
            }
        }
        self.arbiters = current;
        events
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.position)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.velocity)
    }

    fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|b| b.angle)
    }

    fn set_angle(&mut self, handle: BodyHandle, angle: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.angle = angle;
        }
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.position = position;
        }
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.angular_velocity = angular_velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet(space: &mut Space) -> BodyHandle {
        space.add_body(BodyDesc::static_circle(Vec2::ZERO, 100.0, 0.9, 0.0))
    }

    fn ball(space: &mut Space, pos: Vec2) -> BodyHandle {
        space.add_body(BodyDesc::dynamic_circle(pos, 10.0, 1.0, 100.0))
    }

    #[test]
    fn test_handles_are_unique() {
        let mut space = Space::new();
        let a = planet(&mut space);
        let b = planet(&mut space);
        assert_ne!(a, b);
        assert_eq!(space.body_count(), 2);
    }

    #[test]
    fn test_remove_unknown_body_is_error() {
        let mut space = Space::new();
        let a = planet(&mut space);
        assert!(space.remove_body(a).is_ok());
        assert_eq!(space.remove_body(a), Err(PhysicsError::UnknownBody(a)));
        assert_eq!(
            space.remove_body(BodyHandle(999)),
            Err(PhysicsError::UnknownBody(BodyHandle(999)))
        );
    }

    #[test]
    fn test_static_bodies_do_not_move() {
        let mut space = Space::new();
        let p = planet(&mut space);
        space.apply_force(p, Vec2::new(1e6, 0.0));
        space.step(1.0);
        assert_eq!(space.position(p), Some(Vec2::ZERO));
        assert_eq!(space.body_kind(p), Some(BodyKind::Static));
        let b = ball(&mut space, Vec2::new(500.0, 0.0));
        assert_eq!(space.body_kind(b), Some(BodyKind::Dynamic));
        assert_eq!(space.body_kind(BodyHandle(999)), None);
    }

    #[test]
    fn test_force_integrates_then_clears() {
        let mut space = Space::new();
        let b = ball(&mut space, Vec2::new(500.0, 0.0));
        space.apply_force(b, Vec2::new(10.0, 0.0));
        space.step(1.0);
        assert_eq!(space.velocity(b), Some(Vec2::new(10.0, 0.0)));
        space.step(1.0);
        assert_eq!(space.velocity(b), Some(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn test_contact_begin_and_separate() {
        let mut space = Space::new();
        let p = planet(&mut space);
        let b = ball(&mut space, Vec2::new(0.0, 109.0));

        let events = space.step(1.0 / 60.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ContactPhase::Begin);
        assert_eq!((events[0].a, events[0].b), (p, b));
        assert!((events[0].normal - Vec2::Y).length() < 1e-5);
        // Pushed back out to the surface
        assert!(space.position(b).unwrap().y >= 110.0 - 1e-3);

        // Still touching: no new events
        assert!(space.step(1.0 / 60.0).is_empty());
        assert_eq!(space.contact_count(), 1);

        space.apply_impulse(b, Vec2::new(0.0, 600.0), Vec2::ZERO);
        let events = space.step(1.0 / 60.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ContactPhase::Separate);
        assert_eq!(space.contact_count(), 0);
    }

    #[test]
    fn test_resting_contact_stays_on_surface() {
        let mut space = Space::new();
        planet(&mut space);
        let b = ball(&mut space, Vec2::new(0.0, 110.0));
        for _ in 0..120 {
            space.apply_force(b, Vec2::new(0.0, -1000.0));
            let events = space.step(1.0 / 60.0);
            assert!(events.iter().all(|e| e.phase == ContactPhase::Begin));
        }
        let y = space.position(b).unwrap().y;
        assert!((y - 110.0).abs() < 1.0, "ball sank or bounced: {y}");
        assert_eq!(space.contact_count(), 1);
    }

    #[test]
    fn test_inelastic_collision_stops_normal_velocity() {
        let mut space = Space::new();
        planet(&mut space);
        let b = ball(&mut space, Vec2::new(0.0, 112.0));
        space.apply_impulse(b, Vec2::new(0.0, -300.0), Vec2::ZERO);
        let events = space.step(1.0 / 60.0);
        assert_eq!(events[0].phase, ContactPhase::Begin);
        assert!(events[0].total_impulse.y > 0.0);
        assert!(space.velocity(b).unwrap().y.abs() < 1e-3);
    }

    #[test]
    fn test_removal_emits_separate() {
        let mut space = Space::new();
        let p = planet(&mut space);
        let b = ball(&mut space, Vec2::new(0.0, 110.0));
        space.step(1.0 / 60.0);
        assert_eq!(space.contact_count(), 1);

        space.remove_body(p).unwrap();
        let events = space.step(1.0 / 60.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ContactPhase::Separate);
        assert_eq!(events[0].other(b).map(|(h, _)| h), Some(p));
    }

    #[test]
    fn test_offset_impulse_spins() {
        let mut space = Space::new();
        let b = ball(&mut space, Vec2::new(500.0, 0.0));
        space.apply_impulse(b, Vec2::new(0.0, 10.0), Vec2::new(5.0, 0.0));
        space.step(0.1);
        assert!(space.angle(b).unwrap() > 0.0);
    }
}
