//! Bounded cache of materialized segment buffers.

use crate::error::{CoreError, CoreResult};
use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::trace;

/// Counters describing cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that missed.
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
}

/// Least-recently-used cache mapping segment index to segment bytes.
///
/// Buffers are reference counted: evicting an entry only drops the cache's
/// reference, so bytes already handed to a caller stay valid.
#[derive(Debug)]
pub struct SegmentCache {
    entries: LruCache<usize, Bytes>,
    stats: CacheStats,
}

impl SegmentCache {
    /// Creates a cache holding at most `capacity` buffers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedValue`] if `capacity` is zero.
    pub fn new(capacity: usize) -> CoreResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            CoreError::unsupported_value("unable to create data cache: capacity must be at least 1")
        })?;

        Ok(Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        })
    }

    /// Returns the cached bytes for `index` and marks them recently used.
    pub fn get(&mut self, index: usize) -> Option<Bytes> {
        match self.entries.get(&index) {
            Some(data) => {
                self.stats.hits += 1;
                trace!(index, "segment cache hit");
                Some(data.clone())
            }
            None => {
                self.stats.misses += 1;
                trace!(index, "segment cache miss");
                None
            }
        }
    }

    /// Inserts bytes for `index`.
    ///
    /// When the cache is full exactly one entry, the least recently used, is
    /// evicted and its index returned.
    pub fn insert(&mut self, index: usize, data: Bytes) -> Option<usize> {
        // `push` also hands back the old value when `index` was already cached.
        let (victim, _) = self.entries.push(index, data)?;
        if victim == index {
            return None;
        }

        self.stats.evictions += 1;
        trace!(index = victim, "segment cache eviction");
        Some(victim)
    }

    /// Returns true if `index` is cached, without affecting recency.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains(&index)
    }

    /// Returns the number of cached buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of cached buffers.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Returns hit, miss and eviction counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
