//! Error types
//!
//! Configuration problems are fatal and surface at construction time.
//! Physics registration problems are recoverable; callers log and skip them.

use thiserror::Error;

use crate::physics::BodyHandle;

/// Fatal configuration errors raised while building a galaxy or loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Chunk width is non-positive or too small to keep bodies inside their chunk
    #[error("invalid chunk width {width}: must be at least {min}")]
    InvalidChunkWidth { width: i64, min: i64 },
    /// Cache cannot hold the whole active window
    #[error("chunk cache capacity {capacity} is smaller than the active window ({min})")]
    CacheTooSmall { capacity: usize, min: usize },
    #[error("chunk cache capacity {capacity} exceeds the maximum of {max}")]
    CacheTooLarge { capacity: usize, max: usize },
    /// Generation would produce empty chunks
    #[error("bodies per chunk must be at least 1")]
    NoBodiesPerChunk,
    /// Settings JSON could not be parsed
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// Settings file could not be read
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Recoverable physics world errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhysicsError {
    /// Handle was never added or has already been removed
    #[error("unknown physics body {0:?}")]
    UnknownBody(BodyHandle),
}
