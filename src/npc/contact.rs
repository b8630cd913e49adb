//! Contact tracking and jump eligibility

use glam::Vec2;

use crate::physics::gravity::world_to_local;
use crate::physics::{BodyHandle, ContactEvent};
use crate::settings::JumpPolicy;

/// Snapshot of a contact taken when it began
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// The other shape touching this NPC
    pub shape: BodyHandle,
    /// World-frame unit normal pointing from the other shape toward the NPC
    pub normal: Vec2,
    pub total_impulse: Vec2,
    pub contact_points: Vec<Vec2>,
    pub surface_velocity: Vec2,
}

impl Collision {
    /// Build the record for `owner` from a physics event, if it is involved
    pub fn from_event(event: &ContactEvent, owner: BodyHandle) -> Option<Self> {
        let (shape, normal) = event.other(owner)?;
        Some(Self {
            shape,
            normal,
            total_impulse: event.total_impulse,
            contact_points: event.contact_points.clone(),
            surface_velocity: event.surface_velocity,
        })
    }

    /// True when the normal, seen from the NPC's rotated frame, is floor-like
    pub fn is_ground(&self, body_angle: f32, friction: f32) -> bool {
        let local = world_to_local(self.normal, body_angle);
        local.y > 0.0 && (local.x / local.y).abs() < friction
    }
}

/// Live contacts of one NPC plus the timing needed for coyote time
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    collisions: Vec<Collision>,
    elapsed: f32,
    last_separated_at: Option<f32>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn is_touching(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// Record a contact; a repeated shape replaces its older record
    pub fn add(&mut self, collision: Collision) {
        match self.collisions.iter_mut().find(|c| c.shape == collision.shape) {
            Some(existing) => *existing = collision,
            None => self.collisions.push(collision),
        }
    }

    /// Drop the contact with `shape`. Returns whether one was present.
    pub fn remove(&mut self, shape: BodyHandle) -> bool {
        let before = self.collisions.len();
        self.collisions.retain(|c| c.shape != shape);
        let removed = self.collisions.len() != before;
        if removed && self.collisions.is_empty() {
            self.last_separated_at = Some(self.elapsed);
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.collisions.is_empty() {
            self.last_separated_at = Some(self.elapsed);
        }
        self.collisions.clear();
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Seconds since the NPC last lost all contact, `None` if touching or never touched
    pub fn time_since_contact(&self) -> Option<f32> {
        if self.is_touching() {
            return None;
        }
        self.last_separated_at.map(|t| self.elapsed - t)
    }

    pub fn can_jump(&self, policy: JumpPolicy, body_angle: f32) -> bool {
        match policy {
            JumpPolicy::CoyoteTime { grace } => {
                self.is_touching() || self.time_since_contact().is_some_and(|t| t < grace)
            }
            JumpPolicy::GroundNormal { friction } => self
                .collisions
                .iter()
                .any(|c| c.is_ground(body_angle, friction)),
        }
    }
}
