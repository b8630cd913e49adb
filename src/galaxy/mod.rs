//! Galaxy: the chunk manager
//!
//! Chunks form an infinite integer grid. Coordinates originate at 0,0 and
//! can be negative. Any chunk can be dropped from the cache when the player
//! moves away and regenerated on demand from the seed and its coordinates.
//! Around the player a 3x3 window of chunks is kept active.

pub mod cache;
pub mod chunk;

use std::rc::Rc;

pub use cache::ChunkCache;
pub use chunk::{CelestialBody, Chunk, ChunkCoord, chunk_seed};

use crate::consts::*;
use crate::error::ConfigResult;
use crate::settings::{Settings, validate_cache_capacity, validate_chunk_width};

/// Procedurally generated galaxy with a bounded chunk cache
pub struct Galaxy {
    seed: u64,
    chunk_width: i64,
    bodies_per_chunk: usize,
    cache: ChunkCache,
}

impl Galaxy {
    /// Create a galaxy with the default cache capacity
    pub fn new(seed: u64, chunk_width: i64) -> ConfigResult<Self> {
        Self::with_capacity(seed, chunk_width, DEFAULT_CHUNK_CACHE_CAPACITY)
    }

    pub fn with_capacity(seed: u64, chunk_width: i64, capacity: usize) -> ConfigResult<Self> {
        validate_chunk_width(chunk_width)?;
        validate_cache_capacity(capacity)?;
        Ok(Self {
            seed,
            chunk_width,
            bodies_per_chunk: 1,
            cache: ChunkCache::new(capacity),
        })
    }

    /// Build from settings with an already resolved seed
    pub fn from_settings(settings: &Settings, seed: u64) -> ConfigResult<Self> {
        settings.validate()?;
        let mut galaxy =
            Self::with_capacity(seed, settings.chunk_width, settings.chunk_cache_capacity)?;
        galaxy.bodies_per_chunk = settings.bodies_per_chunk;
        Ok(galaxy)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn chunk_width(&self) -> i64 {
        self.chunk_width
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    /// Chunk coordinates containing the absolute position
    pub fn position_to_chunk_coordinates(&self, x: f32, y: f32) -> ChunkCoord {
        ChunkCoord::from_position(x, y, self.chunk_width)
    }

    pub fn chunk_center(&self, coord: ChunkCoord) -> (i64, i64) {
        coord.center(self.chunk_width)
    }

    /// Cached chunk, generated on first access
    pub fn chunk_from_coordinates(&mut self, coord: ChunkCoord) -> Rc<Chunk> {
        let (seed, width, count) = (self.seed, self.chunk_width, self.bodies_per_chunk);
        self.cache
            .get_or_insert_with(coord, || Chunk::generate_with(seed, coord, width, count))
    }

    /// The 3x3 neighborhood around the chunk containing (x, y), row-major
    /// from offset (-1, -1) to (1, 1). The containing chunk is at index 4.
    pub fn position_to_active_chunk_coordinates(&self, x: f32, y: f32) -> [ChunkCoord; ACTIVE_WINDOW_SIZE] {
        let center = self.position_to_chunk_coordinates(x, y);
        let mut coords = [center; ACTIVE_WINDOW_SIZE];
        let mut i = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                coords[i] = center.offset(dx, dy);
                i += 1;
            }
        }
        coords
    }

    /// Chunks of the active window, in the same order as the coordinates
    pub fn position_to_active_chunks(&mut self, x: f32, y: f32) -> Vec<Rc<Chunk>> {
        // Resolve every coordinate before touching the cache
        let coords = self.position_to_active_chunk_coordinates(x, y);
        coords
            .iter()
            .map(|&coord| self.chunk_from_coordinates(coord))
            .collect()
    }

    /// Body in the active window with the nearest surface to (x, y)
    pub fn closest_celestial_body(&mut self, x: f32, y: f32) -> Option<CelestialBody> {
        let chunks = self.position_to_active_chunks(x, y);
        closest_body(chunks.iter().flat_map(|c| c.celestial_bodies.iter()), x, y)
    }
}

/// Body minimizing surface distance to (x, y); earlier bodies win ties
pub fn closest_body<'a>(
    bodies: impl IntoIterator<Item = &'a CelestialBody>,
    x: f32,
    y: f32,
) -> Option<CelestialBody> {
    let mut best: Option<(f64, CelestialBody)> = None;
    for body in bodies {
        let distance = body.surface_distance(x, y);
        match best {
            Some((best_distance, _)) if distance >= best_distance => {}
            _ => best = Some((distance, *body)),
        }
    }
    best.map(|(_, body)| body)
}
