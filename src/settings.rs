//! Simulation settings
//!
//! Loaded from JSON; every field falls back to its default when omitted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, ConfigResult};
use crate::npc::NpcStats;

/// Rule deciding whether a grounded jump is allowed.
///
/// Exactly one policy is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JumpPolicy {
    /// Any active contact, or a contact that ended less than `grace` seconds ago
    CoyoteTime { grace: f32 },
    /// An active contact whose local-frame normal satisfies `|n.x / n.y| < friction`
    GroundNormal { friction: f32 },
}

impl Default for JumpPolicy {
    fn default() -> Self {
        JumpPolicy::CoyoteTime { grace: COYOTE_TIME }
    }
}

impl JumpPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JumpPolicy::CoyoteTime { .. } => "coyote_time",
            JumpPolicy::GroundNormal { .. } => "ground_normal",
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Galaxy ===
    /// Global seed; a random one is drawn when absent
    pub seed: Option<u64>,
    /// Chunk side length in world units
    pub chunk_width: i64,
    /// Chunks kept in the LRU cache
    pub chunk_cache_capacity: usize,
    /// Celestial bodies generated per chunk
    pub bodies_per_chunk: usize,

    // === Celestial colliders ===
    pub celestial_friction: f32,
    pub celestial_elasticity: f32,

    // === Player physics ===
    /// Constant pull toward the nearest body
    pub gravity_force: f32,
    /// Force applied per held movement direction
    pub move_force: f32,
    /// Impulse along local up on jump
    pub jump_impulse: f32,
    pub jump_policy: JumpPolicy,

    // === Player stats ===
    pub player: NpcStats,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            chunk_width: DEFAULT_CHUNK_WIDTH,
            chunk_cache_capacity: DEFAULT_CHUNK_CACHE_CAPACITY,
            bodies_per_chunk: 1,

            celestial_friction: CELESTIAL_FRICTION,
            celestial_elasticity: CELESTIAL_ELASTICITY,

            gravity_force: GRAVITY_FORCE,
            move_force: PLAYER_MOVE_FORCE,
            jump_impulse: PLAYER_JUMP_IMPULSE,
            jump_policy: JumpPolicy::default(),

            player: NpcStats {
                hp: 100,
                ..NpcStats::default()
            },
        }
    }
}

impl Settings {
    /// Default settings with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse settings from a JSON document and validate them
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the galaxy invariants that generation relies on
    pub fn validate(&self) -> ConfigResult<()> {
        validate_chunk_width(self.chunk_width)?;
        validate_cache_capacity(self.chunk_cache_capacity)?;
        if self.bodies_per_chunk == 0 {
            return Err(ConfigError::NoBodiesPerChunk);
        }
        Ok(())
    }

    /// The configured seed, or a freshly drawn one
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::random::<u32>() as u64)
    }
}

/// Chunk width must leave room for max jitter plus max radius on each side
pub fn validate_chunk_width(width: i64) -> ConfigResult<()> {
    if width < MIN_CHUNK_WIDTH {
        return Err(ConfigError::InvalidChunkWidth {
            width,
            min: MIN_CHUNK_WIDTH,
        });
    }
    Ok(())
}

/// The cache must hold the whole active window without growing unbounded
pub fn validate_cache_capacity(capacity: usize) -> ConfigResult<()> {
    if capacity < ACTIVE_WINDOW_SIZE {
        return Err(ConfigError::CacheTooSmall {
            capacity,
            min: ACTIVE_WINDOW_SIZE,
        });
    }
    if capacity > MAX_CHUNK_CACHE_CAPACITY {
        return Err(ConfigError::CacheTooLarge {
            capacity,
            max: MAX_CHUNK_CACHE_CAPACITY,
        });
    }
    Ok(())
}
