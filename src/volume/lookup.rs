//! Lookup cache for finding which tile holds a voxel.
//!
//! Consecutive line reads usually land in the same tile, or in one of a few
//! neighbours, so checking recently used tiles first avoids scanning every
//! tile's ROI. The cache is owned by the caller and passed into each lookup.

use std::num::NonZeroUsize;

use lru::LruCache;

/// Default number of recently used tiles to remember
pub const DEFAULT_LOOKUP_ENTRIES: usize = 8;

/// Remembers the tiles that most recently matched a lookup.
pub struct TileLookupCache {
    /// Tile positions, most recently used first
    recent: LruCache<usize, ()>,

    hits: u64,
    misses: u64,
}

impl TileLookupCache {
    /// Create a cache remembering [`DEFAULT_LOOKUP_ENTRIES`] tiles.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOOKUP_ENTRIES)
    }

    /// Create a cache remembering up to `entries` tiles (at least one).
    pub fn with_capacity(entries: usize) -> Self {
        Self {
            recent: LruCache::new(NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN)),
            hits: 0,
            misses: 0,
        }
    }

    /// Find a tile position in `0..num_tiles` for which `matches` holds.
    ///
    /// Recently matched tiles are tried first, most recent first; the rest
    /// are scanned in order. The matching tile becomes the most recent.
    pub fn find<F>(&mut self, num_tiles: usize, matches: F) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        let cached = self
            .recent
            .iter()
            .map(|(&index, _)| index)
            .find(|&index| index < num_tiles && matches(index));
        if let Some(index) = cached {
            self.recent.get(&index);
            self.hits += 1;
            return Some(index);
        }

        let found = (0..num_tiles)
            .filter(|index| !self.recent.contains(index))
            .find(|&index| matches(index))?;
        self.recent.put(found, ());
        self.misses += 1;
        Some(found)
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that needed a scan and found a tile.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }
}

impl Default for TileLookupCache {
    fn default() -> Self {
        Self::new()
    }
}
