//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, writes and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Running counters owned by the store.
///
/// Counters only ever grow; the only way to reset them is to build a new store.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Lookups that returned a live entry
    hits: u64,
    /// Lookups on absent or expired keys
    misses: u64,
    /// Successful writes
    sets: u64,
    /// Caller-requested removals that removed something
    deletes: u64,
    /// Capacity evictions plus sweeper removals
    evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_evictions(&mut self, count: u64) {
        self.evictions += count;
    }

    // == Snapshot ==
    /// Freezes the counters together with the store's current size.
    pub fn snapshot(&self, entry_count: usize, max_entries: usize) -> StatsSnapshot {
        StatsSnapshot {
            entry_count,
            max_entries,
            hits: self.hits,
            misses: self.misses,
            sets: self.sets,
            deletes: self.deletes,
            evictions: self.evictions,
            hit_rate: hit_rate(self.hits, self.misses),
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the store's metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub entry_count: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    /// `hits / (hits + misses)`, or 0.0 before any lookup
    pub hit_rate: f64,
}

// == Hit Rate ==
/// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
