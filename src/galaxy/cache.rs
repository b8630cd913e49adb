//! Fixed-capacity LRU cache of generated chunks

use std::collections::HashMap;
use std::rc::Rc;

use super::chunk::{Chunk, ChunkCoord};

struct Entry {
    chunk: Rc<Chunk>,
    last_used: u64,
}

/// LRU keyed by chunk coordinates.
///
/// Capacity is small (active window plus a margin), so eviction scans for
/// the oldest entry rather than maintaining a linked list.
pub struct ChunkCache {
    capacity: usize,
    entries: HashMap<ChunkCoord, Entry>,
    clock: u64,
    evictions: u64,
}

impl ChunkCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            clock: 0,
            evictions: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries evicted since creation
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.entries.contains_key(&coord)
    }

    /// Look up a chunk and mark it most recently used
    pub fn get(&mut self, coord: ChunkCoord) -> Option<Rc<Chunk>> {
        self.clock += 1;
        let clock = self.clock;
        self.entries.get_mut(&coord).map(|entry| {
            entry.last_used = clock;
            Rc::clone(&entry.chunk)
        })
    }

    /// Return the cached chunk, or build, insert and return it
    pub fn get_or_insert_with(
        &mut self,
        coord: ChunkCoord,
        generate: impl FnOnce() -> Chunk,
    ) -> Rc<Chunk> {
        if let Some(chunk) = self.get(coord) {
            return chunk;
        }
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        let chunk = Rc::new(generate());
        self.entries.insert(
            coord,
            Entry {
                chunk: Rc::clone(&chunk),
                last_used: self.clock,
            },
        );
        chunk
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(coord, _)| *coord);
        if let Some(coord) = oldest {
            self.entries.remove(&coord);
            self.evictions += 1;
            log::debug!("Evicted chunk ({}, {})", coord.x, coord.y);
        }
    }
}
