//! Chunk generation
//!
//! A chunk is one square cell of the galaxy grid. Its content is a pure
//! function of the global seed, its grid coordinates and the chunk width, so
//! it can be thrown away and regenerated identically at any time.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Integer grid coordinates of a chunk (can be negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i64,
    pub y: i64,
}

impl ChunkCoord {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Chunk containing a world position. Floors toward negative infinity.
    pub fn from_position(x: f32, y: f32, chunk_width: i64) -> Self {
        let w = chunk_width as f64;
        Self {
            x: (x as f64 / w).floor() as i64,
            y: (y as f64 / w).floor() as i64,
        }
    }

    /// Chunk containing an integer world position
    pub fn from_world(x: i64, y: i64, chunk_width: i64) -> Self {
        Self {
            x: x.div_euclid(chunk_width),
            y: y.div_euclid(chunk_width),
        }
    }

    /// World-space anchor of this chunk. Clamps at the edge of the `i64` grid.
    pub fn center(&self, chunk_width: i64) -> (i64, i64) {
        (
            self.x.saturating_mul(chunk_width),
            self.y.saturating_mul(chunk_width),
        )
    }

    /// Neighbouring coordinates. Saturates, so at the grid edge neighbours
    /// collapse onto the edge chunk.
    pub fn offset(&self, dx: i64, dy: i64) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

impl From<(i64, i64)> for ChunkCoord {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// Seed for one chunk's generator: `seed + chunk_y * chunk_width + chunk_x`
pub fn chunk_seed(seed: u64, coord: ChunkCoord, chunk_width: i64) -> u64 {
    (seed as i64)
        .wrapping_add(coord.y.wrapping_mul(chunk_width))
        .wrapping_add(coord.x) as u64
}

/// A static circular gravity source, in absolute world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CelestialBody {
    pub x: i64,
    pub y: i64,
    pub radius: i64,
}

impl CelestialBody {
    pub const fn new(x: i64, y: i64, radius: i64) -> Self {
        Self { x, y, radius }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Distance from a point to this body's surface (negative when inside)
    pub fn surface_distance(&self, x: f32, y: f32) -> f64 {
        let dx = x as f64 - self.x as f64;
        let dy = y as f64 - self.y as f64;
        (dx * dx + dy * dy).sqrt() - self.radius as f64
    }
}

/// One generated grid cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub chunk_width: i64,
    pub seed: u64,
    pub center: (i64, i64),
    pub celestial_bodies: Vec<CelestialBody>,
}

impl Chunk {
    /// Generate a chunk with a single celestial body
    pub fn generate(seed: u64, coord: ChunkCoord, chunk_width: i64) -> Self {
        Self::generate_with(seed, coord, chunk_width, 1)
    }

    /// Generate a chunk with `body_count` celestial bodies.
    ///
    /// Uses its own generator seeded from [`chunk_seed`]; nothing leaks
    /// between chunks regardless of generation order.
    pub fn generate_with(seed: u64, coord: ChunkCoord, chunk_width: i64, body_count: usize) -> Self {
        let center = coord.center(chunk_width);
        let mut rng = Pcg32::seed_from_u64(chunk_seed(seed, coord, chunk_width));

        let celestial_bodies = (0..body_count)
            .map(|_| {
                let x = center.0.saturating_add(rng.random_range(-BODY_MAX_JITTER..=BODY_MAX_JITTER));
                let y = center.1.saturating_add(rng.random_range(-BODY_MAX_JITTER..=BODY_MAX_JITTER));
                let radius = rng.random_range(BODY_MIN_RADIUS..=BODY_MAX_RADIUS);
                CelestialBody::new(x, y, radius)
            })
            .collect();

        Self {
            coord,
            chunk_width,
            seed,
            center,
            celestial_bodies,
        }
    }

    pub fn chunk_seed(&self) -> u64 {
        chunk_seed(self.seed, self.coord, self.chunk_width)
    }
}
