//! Per-tick simulation driver
//!
//! Owns the galaxy, the physics world, the player and other NPCs. Each tick:
//! input forces, gravity, active-chunk reconciliation, physics step, contact
//! dispatch, then NPC logic.

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;

use crate::error::ConfigResult;
use crate::galaxy::{CelestialBody, Chunk, Galaxy, closest_body};
use crate::npc::{Npc, NpcId, NpcStats, NpcView};
use crate::physics::{
    BodyDesc, BodyHandle, ContactEvent, PhysicsWorld, Space, apply_gravity, local_to_world,
};
use crate::settings::Settings;

/// Player intent for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub moving_left: bool,
    pub moving_right: bool,
    pub moving_up: bool,
    pub moving_down: bool,
    pub attack: bool,
    pub jump: bool,
    /// Rebuild the world from scratch
    pub reset: bool,
}

impl TickInput {
    pub fn is_moving(&self) -> bool {
        self.moving_left || self.moving_right || self.moving_up || self.moving_down
    }

    /// Sum of held directions in the player's local frame
    pub fn move_direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.moving_left {
            dir.x -= 1.0;
        }
        if self.moving_right {
            dir.x += 1.0;
        }
        if self.moving_up {
            dir.y += 1.0;
        }
        if self.moving_down {
            dir.y -= 1.0;
        }
        dir
    }
}

/// What a physics handle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeOwner {
    Npc(NpcId),
    Celestial(CelestialBody),
}

/// Outcome of one active-chunk reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveSetChange {
    pub chunks_added: usize,
    pub chunks_removed: usize,
    pub bodies_added: usize,
    pub bodies_removed: usize,
}

impl ActiveSetChange {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

const PLAYER_ID: NpcId = NpcId(0);

/// Runs the simulation one tick at a time
pub struct Driver<W: PhysicsWorld = Space> {
    settings: Settings,
    seed: u64,
    galaxy: Galaxy,
    world: W,
    player: Npc,
    npcs: Vec<Npc>,
    active_chunks: Vec<Rc<Chunk>>,
    celestial_handles: HashMap<CelestialBody, BodyHandle>,
    owners: HashMap<BodyHandle, ShapeOwner>,
    next_npc_id: u32,
    time_ticks: u64,
}

impl Driver<Space> {
    /// Driver backed by the bundled physics space
    pub fn new(settings: Settings) -> ConfigResult<Self> {
        Self::with_world(settings, Space::new())
    }
}

impl<W: PhysicsWorld> Driver<W> {
    pub fn with_world(settings: Settings, world: W) -> ConfigResult<Self> {
        settings.validate()?;
        let seed = settings.resolve_seed();
        let mut galaxy = Galaxy::from_settings(&settings, seed)?;
        let spawn = spawn_point(&mut galaxy, settings.player.radius);

        let mut driver = Self {
            player: Npc::new(PLAYER_ID, settings.player, spawn),
            settings,
            seed,
            galaxy,
            world,
            npcs: Vec::new(),
            active_chunks: Vec::new(),
            celestial_handles: HashMap::new(),
            owners: HashMap::new(),
            next_npc_id: PLAYER_ID.0 + 1,
            time_ticks: 0,
        };
        driver.register_player();
        driver.update_active_chunks();

        log::info!(
            "Galaxy seed {} chunk width {}, player spawned at ({:.1}, {:.1})",
            driver.seed,
            driver.galaxy.chunk_width(),
            spawn.x,
            spawn.y
        );
        Ok(driver)
    }

    // === Accessors ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn galaxy(&self) -> &Galaxy {
        &self.galaxy
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn player(&self) -> &Npc {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Npc {
        &mut self.player
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        if id == self.player.id {
            return Some(&self.player);
        }
        self.npcs.iter().find(|n| n.id == id)
    }

    fn npc_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        if id == self.player.id {
            return Some(&mut self.player);
        }
        self.npcs.iter_mut().find(|n| n.id == id)
    }

    pub fn active_chunks(&self) -> &[Rc<Chunk>] {
        &self.active_chunks
    }

    /// Bodies of the active window, for drawing
    pub fn visible_bodies(&self) -> impl Iterator<Item = &CelestialBody> {
        self.active_chunks.iter().flat_map(|c| c.celestial_bodies.iter())
    }

    pub fn owner_of(&self, handle: BodyHandle) -> Option<ShapeOwner> {
        self.owners.get(&handle).copied()
    }

    pub fn celestial_handle(&self, body: &CelestialBody) -> Option<BodyHandle> {
        self.celestial_handles.get(body).copied()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn player_view(&self) -> NpcView {
        self.player.view()
    }

    /// Nearest body to the player within the active window
    pub fn closest_celestial_body(&mut self) -> Option<CelestialBody> {
        let pos = self.player.position();
        self.galaxy.closest_celestial_body(pos.x, pos.y)
    }

    // === Simulation ===

    /// Advance the simulation by one frame
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        if input.reset {
            if let Err(e) = self.reset() {
                log::error!("Reset failed: {}", e);
            }
            return;
        }

        let alive = !self.player.fainted();
        if alive {
            self.apply_player_intent(input);
            if input.jump {
                self.jump();
            }
        }

        self.apply_gravity_to_all();
        self.update_active_chunks();

        let events = self.world.step(dt);
        for event in &events {
            self.dispatch_contact(event);
        }

        self.player.sync_from(&self.world);
        self.player.advance_time(dt);
        for npc in &mut self.npcs {
            npc.sync_from(&self.world);
            npc.advance_time(dt);
        }

        if alive && input.attack {
            self.player.attack(self.npcs.iter_mut());
        }

        self.player.update_animation(alive && input.is_moving());
        for npc in &mut self.npcs {
            npc.update_animation(false);
        }

        self.time_ticks += 1;
    }

    fn apply_player_intent(&mut self, input: &TickInput) {
        let Some(handle) = self.player.body() else { return };
        let dir = input.move_direction();
        if dir != Vec2::ZERO {
            self.world
                .apply_force_local(handle, dir * self.settings.move_force);
        }
    }

    fn apply_gravity_to_all(&mut self) {
        let force = self.settings.gravity_force;

        if let Some(handle) = self.player.body() {
            let pos = self.player.position();
            let nearest = self.galaxy.closest_celestial_body(pos.x, pos.y);
            apply_gravity(&mut self.world, handle, nearest.as_ref(), force);
        }

        // Other NPCs only see the player's active window so the cache is
        // never churned on their behalf
        for npc in &self.npcs {
            let Some(handle) = npc.body() else { continue };
            let pos = npc.position();
            let nearest = closest_body(
                self.active_chunks.iter().flat_map(|c| c.celestial_bodies.iter()),
                pos.x,
                pos.y,
            );
            apply_gravity(&mut self.world, handle, nearest.as_ref(), force);
        }
    }

    /// Jump along the player's local up if the jump policy allows it
    pub fn jump(&mut self) -> bool {
        if self.player.fainted() || !self.player.can_jump(self.settings.jump_policy) {
            return false;
        }
        let Some(handle) = self.player.body() else {
            return false;
        };
        let up = local_to_world(Vec2::Y, self.player.angle());
        self.world
            .apply_impulse(handle, up * self.settings.jump_impulse, Vec2::ZERO);
        log::debug!("Player jumped");
        true
    }

    fn dispatch_contact(&mut self, event: &ContactEvent) {
        for handle in [event.a, event.b] {
            if let Some(ShapeOwner::Npc(id)) = self.owner_of(handle) {
                if let Some(npc) = self.npc_mut(id) {
                    npc.handle_contact(event);
                }
            }
        }
    }

    // === Active chunks ===

    /// Sync registered celestial colliders with the player's 3x3 window
    pub fn update_active_chunks(&mut self) -> ActiveSetChange {
        let pos = self.player.position();
        let next = self.galaxy.position_to_active_chunks(pos.x, pos.y);
        let previous = std::mem::replace(&mut self.active_chunks, next);
        let mut change = ActiveSetChange::default();

        // Membership is by coordinates; cached instances may have been replaced
        for chunk in &previous {
            if self.active_chunks.iter().any(|c| c.coord == chunk.coord) {
                continue;
            }
            for body in &chunk.celestial_bodies {
                if self.unregister_celestial_body(body) {
                    change.bodies_removed += 1;
                }
            }
            change.chunks_removed += 1;
            log::info!("Removed chunk ({}, {})", chunk.coord.x, chunk.coord.y);
        }

        let entering: Vec<Rc<Chunk>> = self
            .active_chunks
            .iter()
            .filter(|c| !previous.iter().any(|p| p.coord == c.coord))
            .cloned()
            .collect();
        for chunk in &entering {
            for body in &chunk.celestial_bodies {
                if self.register_celestial_body(body) {
                    change.bodies_added += 1;
                }
            }
            change.chunks_added += 1;
            log::info!("Added chunk ({}, {})", chunk.coord.x, chunk.coord.y);
        }

        change
    }

    /// Add a static collider for `body`. Already registered bodies are skipped.
    pub fn register_celestial_body(&mut self, body: &CelestialBody) -> bool {
        if self.celestial_handles.contains_key(body) {
            log::warn!("Duplicate registration of celestial body {:?}, ignoring", body);
            return false;
        }
        let desc = BodyDesc::static_circle(
            body.position(),
            body.radius as f32,
            self.settings.celestial_friction,
            self.settings.celestial_elasticity,
        );
        let handle = self.world.add_body(desc);
        self.celestial_handles.insert(*body, handle);
        self.owners.insert(handle, ShapeOwner::Celestial(*body));
        log::debug!("Created celestial body {:?} as {:?}", body, handle);
        true
    }

    /// Remove `body`'s collider. Missing registrations are logged and skipped.
    pub fn unregister_celestial_body(&mut self, body: &CelestialBody) -> bool {
        let Some(handle) = self.celestial_handles.remove(body) else {
            log::warn!("Celestial body {:?} was never registered, skipping removal", body);
            return false;
        };
        self.owners.remove(&handle);
        match self.world.remove_body(handle) {
            Ok(()) => {
                log::debug!("Removed celestial body {:?}", body);
                true
            }
            Err(e) => {
                log::warn!("Error removing celestial body {:?}: {}", body, e);
                false
            }
        }
    }

    // === NPCs ===

    fn register_player(&mut self) {
        let handle = self.player.spawn_in(&mut self.world);
        self.owners.insert(handle, ShapeOwner::Npc(self.player.id));
    }

    /// Add a non-player NPC with its own physics body
    pub fn spawn_npc(&mut self, stats: NpcStats, position: Vec2) -> NpcId {
        let id = NpcId(self.next_npc_id);
        self.next_npc_id += 1;
        let mut npc = Npc::new(id, stats, position);
        let handle = npc.spawn_in(&mut self.world);
        self.owners.insert(handle, ShapeOwner::Npc(id));
        self.npcs.push(npc);
        log::debug!("Spawned NPC {:?} at ({:.1}, {:.1})", id, position.x, position.y);
        id
    }

    /// Move the player's body and snapshot without a physics step
    pub fn teleport_player(&mut self, position: Vec2) {
        if let Some(handle) = self.player.body() {
            self.world.set_position(handle, position);
        }
        self.player.set_position(position);
    }

    /// Tear down every registered body and start over.
    ///
    /// Without a configured seed a new galaxy is drawn.
    pub fn reset(&mut self) -> ConfigResult<()> {
        for (handle, _) in self.owners.drain() {
            if let Err(e) = self.world.remove_body(handle) {
                log::warn!("Error removing body during reset: {}", e);
            }
        }
        self.celestial_handles.clear();
        self.active_chunks.clear();
        self.npcs.clear();

        self.seed = self.settings.resolve_seed();
        self.galaxy = Galaxy::from_settings(&self.settings, self.seed)?;
        let spawn = spawn_point(&mut self.galaxy, self.settings.player.radius);
        self.player = Npc::new(PLAYER_ID, self.settings.player, spawn);
        self.next_npc_id = PLAYER_ID.0 + 1;
        self.time_ticks = 0;

        self.register_player();
        self.update_active_chunks();
        log::info!("Reset with seed {}", self.seed);
        Ok(())
    }
}

/// Standing position on top of the body nearest the origin
fn spawn_point(galaxy: &mut Galaxy, radius: f32) -> Vec2 {
    match galaxy.closest_celestial_body(0.0, 0.0) {
        Some(body) => body.position() + Vec2::Y * (body.radius as f32 + radius),
        None => Vec2::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::JumpPolicy;

    fn driver() -> Driver {
        Driver::new(Settings::with_seed(42)).unwrap()
    }

    fn settle(driver: &mut Driver, ticks: usize) {
        for _ in 0..ticks {
            driver.tick(&TickInput::default(), SIM_DT);
        }
    }

    /// Distance from the player's center to the nearest body's surface
    fn altitude(driver: &mut Driver) -> f32 {
        let body = driver.closest_celestial_body().unwrap();
        body.surface_distance(driver.player().x(), driver.player().y()) as f32
            - driver.player().radius()
    }

    #[test]
    fn test_new_registers_active_window() {
        let d = driver();
        assert_eq!(d.active_chunks().len(), ACTIVE_WINDOW_SIZE);
        // 9 celestial colliders plus the player
        assert_eq!(d.world().body_count(), ACTIVE_WINDOW_SIZE + 1);
        assert_eq!(d.visible_bodies().count(), ACTIVE_WINDOW_SIZE);
        for body in d.visible_bodies() {
            let handle = d.celestial_handle(body).unwrap();
            assert_eq!(d.owner_of(handle), Some(ShapeOwner::Celestial(*body)));
        }
        let player_handle = d.player().body().unwrap();
        assert_eq!(d.owner_of(player_handle), Some(ShapeOwner::Npc(NpcId(0))));
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let mut d = driver();
        let count = d.world().body_count();
        assert!(d.update_active_chunks().is_empty());
        assert!(d.update_active_chunks().is_empty());
        assert_eq!(d.world().body_count(), count);
    }

    #[test]
    fn test_crossing_a_chunk_boundary_swaps_one_column() {
        let mut d = driver();
        let count = d.world().body_count();
        let width = d.galaxy().chunk_width() as f32;
        let pos = d.player().position();

        d.teleport_player(pos + Vec2::new(width, 0.0));
        let change = d.update_active_chunks();
        assert_eq!(change.chunks_added, 3);
        assert_eq!(change.chunks_removed, 3);
        assert_eq!(change.bodies_added, 3);
        assert_eq!(change.bodies_removed, 3);
        assert_eq!(d.world().body_count(), count);

        // Going back restores the initial set
        d.teleport_player(pos);
        let change = d.update_active_chunks();
        assert_eq!(change.chunks_added, 3);
        assert_eq!(change.chunks_removed, 3);
        assert_eq!(d.world().body_count(), count);
    }

    #[test]
    fn test_duplicate_registration_is_skipped() {
        let mut d = driver();
        let body = *d.visible_bodies().next().unwrap();
        let count = d.world().body_count();
        assert!(!d.register_celestial_body(&body));
        assert_eq!(d.world().body_count(), count);
    }

    #[test]
    fn test_unregistered_removal_is_skipped() {
        let mut d = driver();
        let stranger = CelestialBody::new(1, 2, 3);
        let count = d.world().body_count();
        assert!(!d.unregister_celestial_body(&stranger));
        assert_eq!(d.world().body_count(), count);
    }

    #[test]
    fn test_player_spawns_on_surface_and_stays_there() {
        let mut d = driver();
        assert!(altitude(&mut d).abs() < 1e-2);
        settle(&mut d, 120);
        assert!(altitude(&mut d).abs() < 1.0, "altitude {}", altitude(&mut d));
        assert!(!d.player().collisions().is_empty());
        // Upright relative to the body below
        let body = d.closest_celestial_body().unwrap();
        let up = local_to_world(Vec2::Y, d.player().angle());
        let outward = (d.player().position() - body.position()).normalize();
        assert!(up.dot(outward) > 0.999);
    }

    #[test]
    fn test_jump_leaves_ground_and_lands() {
        let mut d = driver();
        settle(&mut d, 10);
        assert!(d.jump());
        settle(&mut d, 5);
        assert!(altitude(&mut d) > 5.0);
        assert!(d.player().collisions().is_empty());

        settle(&mut d, 240);
        assert!(altitude(&mut d).abs() < 1.0);
        assert!(!d.player().collisions().is_empty());
    }

    #[test]
    fn test_coyote_time_expires_mid_air() {
        let mut d = driver();
        settle(&mut d, 10);
        assert!(d.jump());
        // Within a few frames of lift-off the grace window still applies
        settle(&mut d, 2);
        assert!(d.player().collisions().is_empty());
        assert!(d.player().can_jump(d.settings().jump_policy));
        // Well past the grace window
        settle(&mut d, 12);
        assert!(!d.jump());
    }

    #[test]
    fn test_ground_normal_policy_on_planet() {
        let settings = Settings {
            jump_policy: JumpPolicy::GroundNormal { friction: 0.5 },
            ..Settings::with_seed(42)
        };
        let mut d = Driver::new(settings).unwrap();
        settle(&mut d, 10);
        assert!(d.jump());
        settle(&mut d, 2);
        // No grace window under this policy
        assert!(!d.jump());
    }

    #[test]
    fn test_tick_input_jump() {
        let mut d = driver();
        settle(&mut d, 10);
        d.tick(&TickInput { jump: true, ..Default::default() }, SIM_DT);
        settle(&mut d, 5);
        assert!(altitude(&mut d) > 5.0);
    }

    #[test]
    fn test_walking_moves_along_surface() {
        let mut d = driver();
        settle(&mut d, 10);
        let start = d.player().position();
        let walk = TickInput { moving_right: true, ..Default::default() };
        for _ in 0..60 {
            d.tick(&walk, SIM_DT);
        }
        assert_eq!(d.player().animation(), crate::npc::Animation::Walk);
        assert!(d.player().position().distance(start) > 1.0);
        assert!(altitude(&mut d).abs() < 1.0);

        settle(&mut d, 1);
        assert_eq!(d.player().animation(), crate::npc::Animation::Idle);
    }

    #[test]
    fn test_attack_hits_nearby_npc() {
        let mut d = driver();
        let near = d.player().position() + Vec2::new(80.0, 0.0);
        let far = d.player().position() + Vec2::new(400.0, 400.0);
        let near_id = d.spawn_npc(NpcStats { hp: 5, ..NpcStats::default() }, near);
        let far_id = d.spawn_npc(NpcStats { hp: 5, ..NpcStats::default() }, far);

        d.tick(&TickInput { attack: true, ..Default::default() }, SIM_DT);
        assert_eq!(d.npc(near_id).unwrap().current_hp, 4);
        assert_eq!(d.npc(far_id).unwrap().current_hp, 5);
        assert!(d.player().is_attacking());

        // Mid-animation: no further damage
        d.tick(&TickInput { attack: true, ..Default::default() }, SIM_DT);
        assert_eq!(d.npc(near_id).unwrap().current_hp, 4);
    }

    #[test]
    fn test_fainted_player_ignores_input() {
        let mut d = driver();
        settle(&mut d, 10);
        d.player_mut().current_hp = 0;
        let npc = d.spawn_npc(NpcStats::default(), d.player().position() + Vec2::new(80.0, 0.0));
        d.tick(&TickInput { jump: true, attack: true, ..Default::default() }, SIM_DT);
        assert!(!d.jump());
        assert_eq!(d.npc(npc).unwrap().current_hp, 1);
        assert!(altitude(&mut d).abs() < 1.0);
    }

    #[test]
    fn test_reset_rebuilds_world() {
        let mut d = driver();
        let above = d.player().position() + Vec2::new(0.0, 600.0);
        d.spawn_npc(NpcStats::default(), above);
        settle(&mut d, 30);
        let spawn_count = ACTIVE_WINDOW_SIZE + 1;

        d.tick(&TickInput { reset: true, ..Default::default() }, SIM_DT);
        assert_eq!(d.seed(), 42);
        assert!(d.npcs().is_empty());
        assert_eq!(d.time_ticks(), 0);
        assert_eq!(d.world().body_count(), spawn_count);
        assert!(altitude(&mut d).abs() < 1e-2);

        // Stale separation events from the old bodies are harmless
        settle(&mut d, 10);
        assert!(!d.player().collisions().is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = driver();
        let mut b = driver();
        let walk = TickInput { moving_left: true, ..Default::default() };
        for _ in 0..90 {
            a.tick(&walk, SIM_DT);
            b.tick(&walk, SIM_DT);
        }
        assert_eq!(a.player().position(), b.player().position());
        assert_eq!(a.player().angle(), b.player().angle());
    }

    #[test]
    fn test_far_travel_keeps_cache_bounded() {
        let mut d = driver();
        let width = d.galaxy().chunk_width() as f32;
        for i in 1..=10 {
            d.teleport_player(Vec2::new(i as f32 * width * 3.0, 0.0));
            d.update_active_chunks();
        }
        assert!(d.galaxy().cache().len() <= d.settings().chunk_cache_capacity);
        assert_eq!(d.world().body_count(), ACTIVE_WINDOW_SIZE + 1);
    }
}
