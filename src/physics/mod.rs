//! Physics capability
//!
//! The simulation drives a rigid-body engine only through [`PhysicsWorld`].
//! [`Space`] is the bundled circle-only implementation.

pub mod collision;
pub mod gravity;
pub mod space;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use collision::{CollisionResult, circle_circle};
pub use gravity::{apply_gravity, local_to_world, orientation_toward, polar_angle};
pub use space::Space;

use crate::error::PhysicsError;

/// Opaque handle for a body (and its single shape) in a physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves; infinite mass
    Static,
    /// Integrated every step
    Dynamic,
}

/// Everything needed to register a circular body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub moment: f32,
    pub friction: f32,
    pub elasticity: f32,
}

impl BodyDesc {
    /// Static circular collider
    pub fn static_circle(position: Vec2, radius: f32, friction: f32, elasticity: f32) -> Self {
        Self {
            kind: BodyKind::Static,
            position,
            radius,
            mass: f32::INFINITY,
            moment: f32::INFINITY,
            friction,
            elasticity,
        }
    }

    /// Dynamic circular body
    pub fn dynamic_circle(position: Vec2, radius: f32, mass: f32, moment: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position,
            radius,
            mass,
            moment,
            friction: 0.5,
            elasticity: 0.0,
        }
    }

    pub fn with_material(mut self, friction: f32, elasticity: f32) -> Self {
        self.friction = friction;
        self.elasticity = elasticity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPhase {
    /// Shapes started touching this step
    Begin,
    /// Shapes stopped touching this step (or one was removed)
    Separate,
}

/// A collision callback payload
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Unit normal pointing from `a` toward `b`
    pub normal: Vec2,
    pub contact_points: Vec<Vec2>,
    pub total_impulse: Vec2,
    /// Relative tangential velocity of the surfaces
    pub surface_velocity: Vec2,
}

impl ContactEvent {
    /// The other body and the normal pointing from it toward `handle`
    pub fn other(&self, handle: BodyHandle) -> Option<(BodyHandle, Vec2)> {
        if self.a == handle {
            Some((self.b, -self.normal))
        } else if self.b == handle {
            Some((self.a, self.normal))
        } else {
            None
        }
    }
}

/// Rigid-body engine operations the simulation relies on
pub trait PhysicsWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Remove a body. Unknown handles are reported, never fatal.
    fn remove_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError>;

    fn contains(&self, handle: BodyHandle) -> bool;

    fn body_count(&self) -> usize;

    /// World-frame force at the center of mass, cleared after each step
    fn apply_force(&mut self, handle: BodyHandle, force: Vec2);

    /// World-frame impulse applied at a point given in body-local coordinates
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2, local_point: Vec2);

    /// Advance the world and report contacts that began or ended
    fn step(&mut self, dt: f32) -> Vec<ContactEvent>;

    fn position(&self, handle: BodyHandle) -> Option<Vec2>;

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2>;

    fn angle(&self, handle: BodyHandle) -> Option<f32>;

    fn set_angle(&mut self, handle: BodyHandle, angle: f32);

    /// Teleport a body without touching its velocity
    fn set_position(&mut self, handle: BodyHandle, position: Vec2);

    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32);

    /// Force given in the body's rotated frame
    fn apply_force_local(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(angle) = self.angle(handle) {
            self.apply_force(handle, local_to_world(force, angle));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_event_other() {
        let event = ContactEvent {
            phase: ContactPhase::Begin,
            a: BodyHandle(1),
            b: BodyHandle(2),
            normal: Vec2::X,
            contact_points: vec![],
            total_impulse: Vec2::ZERO,
            surface_velocity: Vec2::ZERO,
        };
        assert_eq!(event.other(BodyHandle(1)), Some((BodyHandle(2), -Vec2::X)));
        assert_eq!(event.other(BodyHandle(2)), Some((BodyHandle(1), Vec2::X)));
        assert_eq!(event.other(BodyHandle(3)), None);
    }
}
