//! Cache Store Module
//!
//! Main cache engine combining an entry arena with pluggable eviction and TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::cache::{
    expiry_after, generate_key, validate_key, CacheEntry, CacheStats, EntryHandle, EvictionPolicy,
    EvictionStrategy, StatsSnapshot, MAX_VALUE_SIZE,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Capacity-bounded cache of serializable values with TTL expiry.
///
/// Entries are kept in a flat arena of slots. `index` maps keys to slot
/// handles and the eviction strategy orders handles; freed slots are reused.
///
/// This type is not synchronized. Wrap it in
/// [`SharedCache`](crate::cache::SharedCache) to share it between tasks.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Entry arena, `None` marks a free slot
    slots: Vec<Option<CacheEntry<V>>>,
    /// Free slot indices available for reuse
    free: Vec<usize>,
    /// Key -> slot handle
    index: HashMap<String, EntryHandle>,
    /// Victim selection for over-capacity inserts
    strategy: Box<dyn EvictionStrategy>,
    /// Performance statistics
    stats: CacheStats,
    clock: Arc<dyn Clock>,
    max_entries: usize,
    default_ttl: Duration,
    policy: EvictionPolicy,
}

impl<V> CacheStore<V>
where
    V: Clone + Serialize,
{
    // == Constructor ==
    /// Creates a store from a validated configuration, using the system clock.
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration fails validation.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a store reading time from `clock`.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            strategy: config.eviction_policy.strategy(),
            stats: CacheStats::new(),
            clock,
            max_entries: config.max_entries,
            default_ttl: config.default_ttl,
            policy: config.eviction_policy,
        })
    }

    // == Set ==
    /// Stores a value, returning the key it was stored under.
    ///
    /// A `None` key stores the value under a freshly generated random key.
    /// If the key already holds a live entry the value and TTL are replaced
    /// and `created_at` is kept. If the store is full and the key is new,
    /// exactly one entry is evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store, or `None` to generate one
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    ///
    /// # Errors
    /// `InvalidKey`, `InvalidTtl`, `SizeLimitExceeded` or `Serialization`.
    /// On error the store is unchanged.
    pub fn set(&mut self, key: Option<String>, value: V, ttl: Option<Duration>) -> Result<String> {
        if let Some(key) = &key {
            validate_key(key)?;
        }

        let size = serde_json::to_vec(&value)?.len();
        if size > MAX_VALUE_SIZE {
            warn!(size, limit = MAX_VALUE_SIZE, "Rejected oversized value");
            return Err(CacheError::SizeLimitExceeded {
                size,
                limit: MAX_VALUE_SIZE,
            });
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = self.clock.now();
        expiry_after(now, ttl)?;

        let key = match key {
            Some(key) => key,
            None => self.unused_key(),
        };

        if let Some(handle) = self.index.get(&key).copied() {
            if !self.is_expired(handle, now) {
                if let Some(entry) = self.entry_mut(handle) {
                    entry.replace(value, now, ttl)?;
                    let meta = entry.meta();
                    self.strategy.on_update(handle, meta);
                }
                self.stats.record_set();
                trace!(key = %key, size, "Overwrote cache entry");
                return Ok(key);
            }

            // Stale entry: the new write starts a brand-new lifecycle
            self.remove_handle(handle);
            debug!(key = %key, "Discarded expired entry before rewrite");
        }

        let entry = CacheEntry::new(key.clone(), value, now, ttl)?;

        if self.index.len() >= self.max_entries {
            // Dead entries go before any live one is evicted
            let reclaimed = self.sweep_expired();
            if reclaimed > 0 {
                debug!(reclaimed, "Reclaimed expired entries at capacity");
            }
            if self.index.len() >= self.max_entries {
                self.evict_one();
            }
        }

        self.insert_entry(entry);
        self.stats.record_set();
        trace!(key = %key, size, entries = self.index.len(), "Inserted cache entry");

        Ok(key)
    }

    // == Set Generated ==
    /// Stores a value built from a freshly generated, currently unused key.
    ///
    /// Useful when the value must carry its own key, as session records do.
    pub fn set_generated<F>(&mut self, build: F, ttl: Option<Duration>) -> Result<String>
    where
        F: FnOnce(&str) -> V,
    {
        let key = self.unused_key();
        let value = build(&key);
        self.set(Some(key), value, ttl)
    }

    // == Get ==
    /// Retrieves a copy of the value stored under `key`.
    ///
    /// Absent and expired keys count as misses; expired entries are removed.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let handle = self.lookup(key)?;
        self.entry(handle).map(|entry| entry.value.clone())
    }

    // == Exists ==
    /// Same as `get(key).is_some()`, including its effect on metrics and recency.
    pub fn exists(&mut self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    // == Delete ==
    /// Removes a live entry by key, returning whether one was removed.
    ///
    /// An expired entry is dropped as well but reported as absent, and does
    /// not count as a delete.
    pub fn delete(&mut self, key: &str) -> bool {
        let now = self.clock.now();

        let Some(handle) = self.index.get(key).copied() else {
            return false;
        };

        if self.is_expired(handle, now) {
            self.remove_handle(handle);
            debug!(key = %key, "Removed expired entry on delete");
            return false;
        }

        self.remove_handle(handle);
        self.stats.record_delete();
        debug!(key = %key, "Deleted cache entry");
        true
    }

    // == Touch ==
    /// Pushes the expiry of a live entry to `now + ttl` without changing its value.
    ///
    /// Returns `false` if the key is absent or already expired. Hit and miss
    /// counters are not affected.
    pub fn touch(&mut self, key: &str, ttl: Option<Duration>) -> Result<bool> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = self.clock.now();
        expiry_after(now, ttl)?;

        let Some(handle) = self.index.get(key).copied() else {
            return Ok(false);
        };

        if self.is_expired(handle, now) {
            self.remove_handle(handle);
            debug!(key = %key, "Removed expired entry on touch");
            return Ok(false);
        }

        if let Some(entry) = self.entry_mut(handle) {
            entry.extend(now, ttl)?;
            let meta = entry.meta();
            self.strategy.on_update(handle, meta);
        }
        trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "Extended cache entry");

        Ok(true)
    }

    // == Clear ==
    /// Removes every entry. Metrics counters are left as they are.
    pub fn clear(&mut self) {
        let removed = self.index.len();
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.strategy.clear();
        debug!(removed, "Cleared cache");
    }

    // == Stats ==
    /// Returns a snapshot of the current cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.index.len(), self.max_entries)
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Removals are counted as evictions. Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now();
        let expired: Vec<EntryHandle> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Some(entry) if entry.is_expired_at(now) => Some(EntryHandle::new(index)),
                _ => None,
            })
            .collect();

        let count = expired.len();
        for handle in expired {
            self.remove_handle(handle);
        }

        self.stats.record_evictions(count as u64);
        count
    }

    // == TTL Remaining ==
    /// Returns the time left before `key` expires, without counting as an access.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        let handle = self.index.get(key).copied()?;
        self.entry(handle)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Length ==
    /// Returns the current number of entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    // == Internal Helpers ==

    /// Resolves a key for a read, applying lazy expiry and hit/miss accounting.
    fn lookup(&mut self, key: &str) -> Option<EntryHandle> {
        let now = self.clock.now();

        let Some(handle) = self.index.get(key).copied() else {
            self.stats.record_miss();
            trace!(key = %key, "Cache miss");
            return None;
        };

        if self.is_expired(handle, now) {
            self.remove_handle(handle);
            self.stats.record_miss();
            debug!(key = %key, "Removed expired entry on read");
            return None;
        }

        if let Some(entry) = self.entry_mut(handle) {
            entry.record_access(now);
            let meta = entry.meta();
            self.strategy.on_access(handle, meta);
        }
        self.stats.record_hit();
        trace!(key = %key, "Cache hit");

        Some(handle)
    }

    /// Drops the strategy's chosen victim to make room for one insert.
    fn evict_one(&mut self) {
        if let Some(victim) = self.strategy.victim() {
            if let Some(entry) = self.remove_handle(victim) {
                self.stats.record_evictions(1);
                debug!(key = %entry.key, policy = %self.policy, "Evicted cache entry");
            }
        }
    }

    fn unused_key(&self) -> String {
        loop {
            let key = generate_key();
            if !self.index.contains_key(&key) {
                return key;
            }
        }
    }

    fn insert_entry(&mut self, entry: CacheEntry<V>) -> EntryHandle {
        let key = entry.key.clone();
        let meta = entry.meta();

        let handle = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(entry);
                EntryHandle::new(index)
            }
            None => {
                self.slots.push(Some(entry));
                EntryHandle::new(self.slots.len() - 1)
            }
        };

        self.index.insert(key, handle);
        self.strategy.on_insert(handle, meta);
        handle
    }

    fn remove_handle(&mut self, handle: EntryHandle) -> Option<CacheEntry<V>> {
        let entry = self.slots.get_mut(handle.index())?.take()?;
        self.free.push(handle.index());
        self.index.remove(&entry.key);
        self.strategy.on_remove(handle);
        Some(entry)
    }

    fn entry(&self, handle: EntryHandle) -> Option<&CacheEntry<V>> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    fn entry_mut(&mut self, handle: EntryHandle) -> Option<&mut CacheEntry<V>> {
        self.slots.get_mut(handle.index()).and_then(Option::as_mut)
    }

    fn is_expired(&self, handle: EntryHandle, now: DateTime<Utc>) -> bool {
        self.entry(handle)
            .map_or(true, |entry| entry.is_expired_at(now))
    }
}
