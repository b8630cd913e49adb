//! NPCs: the player and every other actor
//!
//! Position and angle belong to the NPC's physics body; the NPC keeps a
//! snapshot refreshed after each physics step.

pub mod contact;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use contact::{Collision, ContactTracker};

use crate::consts::*;
use crate::physics::{BodyDesc, BodyHandle, ContactEvent, PhysicsWorld};
use crate::settings::JumpPolicy;

/// Stable identifier of an NPC within a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NpcId(pub u32);

/// Base stats and body shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcStats {
    pub hp: i32,
    pub attack_stat: i32,
    pub defense_stat: i32,
    pub radius: f32,
    pub mass: f32,
    pub moment: f32,
    pub friction: f32,
}

impl Default for NpcStats {
    fn default() -> Self {
        Self {
            hp: 1,
            attack_stat: 1,
            defense_stat: 0,
            radius: PLAYER_RADIUS,
            mass: PLAYER_MASS,
            moment: PLAYER_MOMENT,
            friction: PLAYER_FRICTION,
        }
    }
}

/// Animation the renderer should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Animation {
    #[default]
    Idle,
    Walk,
    Attack,
    Hurt,
}

impl Animation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Animation::Idle => "idle",
            Animation::Walk => "walk",
            Animation::Attack => "attack",
            Animation::Hurt => "hurt",
        }
    }

    /// Frame count of a one-shot animation
    pub fn frames(&self) -> u32 {
        match self {
            Animation::Attack => ATTACK_FRAMES,
            Animation::Hurt => HURT_FRAMES,
            Animation::Idle | Animation::Walk => 1,
        }
    }
}

/// What the render layer needs to draw an NPC
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NpcView {
    pub id: NpcId,
    pub position: Vec2,
    pub angle: f32,
    pub hp: i32,
    pub current_hp: i32,
    pub fainted: bool,
    pub animation: &'static str,
}

/// An actor with hit points, a physics body and contact state
#[derive(Debug, Clone)]
pub struct Npc {
    pub id: NpcId,
    pub hp: i32,
    pub current_hp: i32,
    pub attack_stat: i32,
    pub defense_stat: i32,
    stats: NpcStats,
    body: Option<BodyHandle>,
    position: Vec2,
    angle: f32,
    velocity: Vec2,
    animation: Animation,
    looping: bool,
    non_looped_frames_remaining: u32,
    contacts: ContactTracker,
}

impl Npc {
    pub fn new(id: NpcId, stats: NpcStats, position: Vec2) -> Self {
        Self {
            id,
            hp: stats.hp,
            current_hp: stats.hp,
            attack_stat: stats.attack_stat,
            defense_stat: stats.defense_stat,
            stats,
            body: None,
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            animation: Animation::Idle,
            looping: true,
            non_looped_frames_remaining: 0,
            contacts: ContactTracker::new(),
        }
    }

    pub fn stats(&self) -> &NpcStats {
        &self.stats
    }

    /// Dynamic circle at the NPC's current position
    pub fn body_desc(&self) -> BodyDesc {
        BodyDesc::dynamic_circle(self.position, self.stats.radius, self.stats.mass, self.stats.moment)
            .with_material(self.stats.friction, 0.0)
    }

    /// Register the NPC's body with a world
    pub fn spawn_in<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> BodyHandle {
        let handle = world.add_body(self.body_desc());
        self.body = Some(handle);
        handle
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Refresh the position/angle snapshot from the physics body
    pub fn sync_from<W: PhysicsWorld + ?Sized>(&mut self, world: &W) {
        let Some(handle) = self.body else { return };
        if let Some(position) = world.position(handle) {
            self.position = position;
        }
        if let Some(angle) = world.angle(handle) {
            self.angle = angle;
        }
        if let Some(velocity) = world.velocity(handle) {
            self.velocity = velocity;
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn radius(&self) -> f32 {
        self.stats.radius
    }

    pub fn fainted(&self) -> bool {
        self.current_hp <= 0
    }

    pub fn animation(&self) -> Animation {
        self.animation
    }

    pub fn is_attacking(&self) -> bool {
        self.animation == Animation::Attack
    }

    pub fn set_animation(&mut self, animation: Animation, looping: bool) {
        self.animation = animation;
        self.looping = looping;
        self.non_looped_frames_remaining = if looping { 0 } else { animation.frames() };
    }

    /// Swing at every target within reach.
    ///
    /// No-op while fainted or already attacking. Returns the number of
    /// targets hit. Targets are not filtered by side.
    pub fn attack<'a>(&mut self, targets: impl IntoIterator<Item = &'a mut Npc>) -> usize {
        if self.fainted() || self.is_attacking() {
            return 0;
        }
        self.set_animation(Animation::Attack, false);

        let mut hits = 0;
        for target in targets {
            if target.position.distance(self.position) < ATTACK_DISTANCE {
                target.take_damage(self.attack_stat - target.defense_stat);
                hits += 1;
            }
        }
        log::debug!("NPC {:?} attacked, {} hit", self.id, hits);
        hits
    }

    /// Apply raw damage; negative amounts do nothing and hp floors at 0
    pub fn take_damage(&mut self, amount: i32) {
        self.current_hp = (self.current_hp - amount.max(0)).max(0);
        if self.animation == Animation::Idle {
            self.set_animation(Animation::Hurt, false);
        }
    }

    /// Advance one frame of animation state
    pub fn update_animation(&mut self, moving: bool) {
        if !self.looping {
            self.non_looped_frames_remaining = self.non_looped_frames_remaining.saturating_sub(1);
            if self.non_looped_frames_remaining == 0 {
                self.set_animation(Animation::Idle, true);
            }
        }
        match self.animation {
            Animation::Idle if moving => self.set_animation(Animation::Walk, true),
            Animation::Walk if !moving => self.set_animation(Animation::Idle, true),
            _ => {}
        }
    }

    pub fn non_looped_frames_remaining(&self) -> u32 {
        self.non_looped_frames_remaining
    }

    // === Contacts ===

    pub fn collisions(&self) -> &[Collision] {
        self.contacts.collisions()
    }

    pub fn contacts(&self) -> &ContactTracker {
        &self.contacts
    }

    pub fn add_collision(&mut self, collision: Collision) {
        self.contacts.add(collision);
    }

    pub fn remove_collision(&mut self, shape: BodyHandle) -> bool {
        self.contacts.remove(shape)
    }

    /// Apply a physics event if it involves this NPC's body
    pub fn handle_contact(&mut self, event: &ContactEvent) {
        use crate::physics::ContactPhase;

        let Some(handle) = self.body else { return };
        match event.phase {
            ContactPhase::Begin => {
                if let Some(collision) = Collision::from_event(event, handle) {
                    log::debug!("NPC {:?} collision with {:?}", self.id, collision.shape);
                    self.add_collision(collision);
                }
            }
            ContactPhase::Separate => {
                if let Some((other, _)) = event.other(handle) {
                    log::debug!("NPC {:?} separation from {:?}", self.id, other);
                    self.remove_collision(other);
                }
            }
        }
    }

    /// Advance contact timing by one tick
    pub fn advance_time(&mut self, dt: f32) {
        self.contacts.advance(dt);
    }

    pub fn can_jump(&self, policy: JumpPolicy) -> bool {
        self.contacts.can_jump(policy, self.angle)
    }

    pub fn view(&self) -> NpcView {
        NpcView {
            id: self.id,
            position: self.position,
            angle: self.angle,
            hp: self.hp,
            current_hp: self.current_hp,
            fainted: self.fainted(),
            animation: self.animation.as_str(),
        }
    }
}
