//! Abbot - an infinite, chunked 2D galaxy with per-body gravity
//!
//! Core modules:
//! - `galaxy`: Deterministic chunk generation, LRU chunk cache, active window
//! - `physics`: Physics capability trait, reference circle space, gravity
//! - `npc`: Player/NPC combat, animation and contact state
//! - `driver`: Per-tick orchestration of input, gravity, chunks and physics
//! - `settings`: JSON-loadable configuration

pub mod driver;
pub mod error;
pub mod galaxy;
pub mod npc;
pub mod physics;
pub mod settings;

pub use driver::{ActiveSetChange, Driver, ShapeOwner, TickInput};
pub use error::{ConfigError, ConfigResult, PhysicsError};
pub use galaxy::{CelestialBody, Chunk, ChunkCoord, Galaxy};
pub use npc::{Animation, Npc, NpcStats};
pub use physics::{PhysicsWorld, Space};
pub use settings::{JumpPolicy, Settings};

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Default chunk side length in world units (2^14)
    pub const DEFAULT_CHUNK_WIDTH: i64 = 1 << 14;
    /// Default number of chunks kept in the LRU cache (active window + margin)
    pub const DEFAULT_CHUNK_CACHE_CAPACITY: usize = 18;
    /// Chunks in the 3x3 active window
    pub const ACTIVE_WINDOW_SIZE: usize = 9;
    /// Upper bound on the configurable chunk cache
    pub const MAX_CHUNK_CACHE_CAPACITY: usize = 4096;

    /// Max celestial body offset from its chunk center, per axis
    pub const BODY_MAX_JITTER: i64 = 1 << 9;
    /// Celestial body radius bounds (inclusive)
    pub const BODY_MIN_RADIUS: i64 = 1 << 9;
    pub const BODY_MAX_RADIUS: i64 = 1 << 11;
    /// Smallest chunk width that keeps every body inside its own chunk
    pub const MIN_CHUNK_WIDTH: i64 = 2 * (BODY_MAX_JITTER + BODY_MAX_RADIUS);

    /// Melee reach
    pub const ATTACK_DISTANCE: f32 = 100.0;
    /// Frames the attack animation runs before returning to idle
    pub const ATTACK_FRAMES: u32 = 12;
    /// Frames the hurt animation runs
    pub const HURT_FRAMES: u32 = 8;

    /// Constant gravity pull toward the nearest body
    pub const GRAVITY_FORCE: f32 = 1000.0;
    /// Player movement force on the ground
    pub const PLAYER_MOVE_FORCE: f32 = 1000.0;
    /// Impulse applied along local up when jumping
    pub const PLAYER_JUMP_IMPULSE: f32 = 400.0;
    /// Grace window after the last contact ends during which jumping is allowed
    pub const COYOTE_TIME: f32 = 0.1;

    /// Player body defaults
    pub const PLAYER_RADIUS: f32 = 32.0;
    pub const PLAYER_MASS: f32 = 1.0;
    pub const PLAYER_MOMENT: f32 = 1666.0;
    pub const PLAYER_FRICTION: f32 = 0.5;

    /// Celestial collider defaults
    pub const CELESTIAL_FRICTION: f32 = 0.9;
    pub const CELESTIAL_ELASTICITY: f32 = 0.0;
}
