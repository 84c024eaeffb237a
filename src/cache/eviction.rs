//! Eviction Strategy Module
//!
//! Pluggable policies that pick which entry to drop when the store is full.
//!
//! Entries live in a flat arena owned by the store and are referred to by
//! [`EntryHandle`]. Strategies keep their own ordering of handles in ordered
//! maps, updated through the `on_*` callbacks, and never hold entry data.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Entry Handle ==
/// Index of an entry slot in the store's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryHandle(usize);

impl EntryHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

// == Entry Meta ==
/// Entry data a strategy may order by.
///
/// Recency is not included: the LRU strategy orders by its own operation
/// tick, which stays deterministic when several accesses share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub expires_at: DateTime<Utc>,
}

// == Eviction Strategy Trait ==
/// Bookkeeping and victim selection for one eviction policy.
///
/// The store calls exactly one `on_*` hook for every change to an entry it
/// holds, always under its own lock, so implementations need no locking.
pub trait EvictionStrategy: Send + Sync + Debug {
    /// A new entry was admitted.
    fn on_insert(&mut self, handle: EntryHandle, meta: EntryMeta);

    /// An existing entry was read.
    fn on_access(&mut self, handle: EntryHandle, meta: EntryMeta);

    /// An existing entry was rewritten or had its TTL extended.
    fn on_update(&mut self, handle: EntryHandle, meta: EntryMeta);

    /// An entry left the store for any reason.
    fn on_remove(&mut self, handle: EntryHandle);

    /// Forgets every tracked handle.
    fn clear(&mut self);

    /// Returns the entry that should be evicted next, without removing it.
    fn victim(&self) -> Option<EntryHandle>;

    /// Number of tracked handles.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Eviction Policy ==
/// Configurable choice of eviction strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Evict the least recently used entry
    #[default]
    Lru,
    /// Evict the entry closest to expiring
    Ttl,
}

impl EvictionPolicy {
    /// Builds a fresh strategy for this policy.
    pub fn strategy(self) -> Box<dyn EvictionStrategy> {
        match self {
            EvictionPolicy::Lru => Box::new(LruStrategy::new()),
            EvictionPolicy::Ttl => Box::new(TtlStrategy::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Ttl => "ttl",
        }
    }
}

impl Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "ttl" => Ok(EvictionPolicy::Ttl),
            other => Err(CacheError::InvalidConfig(format!(
                "Unsupported eviction policy '{}', expected 'lru' or 'ttl'",
                other
            ))),
        }
    }
}

// == LRU Strategy ==
/// Least-recently-used ordering.
///
/// Every insert, read or update stamps the handle with a fresh tick from a
/// monotonically increasing counter. The smallest tick is the oldest access,
/// and ties in wall-clock access time resolve in operation order.
#[derive(Debug, Default)]
pub struct LruStrategy {
    /// Access tick -> handle, oldest first
    order: BTreeMap<u64, EntryHandle>,
    /// Handle -> its current tick
    ticks: HashMap<EntryHandle, u64>,
    next_tick: u64,
}

impl LruStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    // == Promote ==
    /// Marks a handle as most recently used.
    fn promote(&mut self, handle: EntryHandle) {
        if let Some(old) = self.ticks.remove(&handle) {
            self.order.remove(&old);
        }
        let tick = self.next_tick;
        self.next_tick += 1;
        self.order.insert(tick, handle);
        self.ticks.insert(handle, tick);
    }
}

impl EvictionStrategy for LruStrategy {
    fn on_insert(&mut self, handle: EntryHandle, _meta: EntryMeta) {
        self.promote(handle);
    }

    fn on_access(&mut self, handle: EntryHandle, _meta: EntryMeta) {
        self.promote(handle);
    }

    fn on_update(&mut self, handle: EntryHandle, _meta: EntryMeta) {
        self.promote(handle);
    }

    fn on_remove(&mut self, handle: EntryHandle) {
        if let Some(tick) = self.ticks.remove(&handle) {
            self.order.remove(&tick);
        }
    }

    fn clear(&mut self) {
        self.order.clear();
        self.ticks.clear();
    }

    fn victim(&self) -> Option<EntryHandle> {
        self.order.values().next().copied()
    }

    fn len(&self) -> usize {
        self.ticks.len()
    }
}

// == TTL Strategy ==
/// Soonest-to-expire ordering.
///
/// Handles are ordered by `(expires_at, tick)`; the tick is assigned when the
/// expiry is (re)written, so equal expiries resolve in write order. Reads do
/// not change the order.
#[derive(Debug, Default)]
pub struct TtlStrategy {
    order: BTreeMap<(DateTime<Utc>, u64), EntryHandle>,
    positions: HashMap<EntryHandle, (DateTime<Utc>, u64)>,
    next_tick: u64,
}

impl TtlStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn reposition(&mut self, handle: EntryHandle, expires_at: DateTime<Utc>) {
        if let Some(old) = self.positions.remove(&handle) {
            self.order.remove(&old);
        }
        let position = (expires_at, self.next_tick);
        self.next_tick += 1;
        self.order.insert(position, handle);
        self.positions.insert(handle, position);
    }
}

impl EvictionStrategy for TtlStrategy {
    fn on_insert(&mut self, handle: EntryHandle, meta: EntryMeta) {
        self.reposition(handle, meta.expires_at);
    }

    fn on_access(&mut self, _handle: EntryHandle, _meta: EntryMeta) {}

    fn on_update(&mut self, handle: EntryHandle, meta: EntryMeta) {
        self.reposition(handle, meta.expires_at);
    }

    fn on_remove(&mut self, handle: EntryHandle) {
        if let Some(position) = self.positions.remove(&handle) {
            self.order.remove(&position);
        }
    }

    fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }

    fn victim(&self) -> Option<EntryHandle> {
        self.order.values().next().copied()
    }

    fn len(&self) -> usize {
        self.positions.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn meta(expires_in_secs: i64) -> EntryMeta {
        let now = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        EntryMeta {
            expires_at: now + chrono::Duration::seconds(expires_in_secs),
        }
    }

    fn h(index: usize) -> EntryHandle {
        EntryHandle::new(index)
    }

    #[test]
    fn test_lru_new() {
        let lru = LruStrategy::new();
        assert!(lru.is_empty());
        assert_eq!(lru.victim(), None);
    }

    #[test]
    fn test_lru_insert_order() {
        let mut lru = LruStrategy::new();

        lru.on_insert(h(1), meta(60));
        lru.on_insert(h(2), meta(60));
        lru.on_insert(h(3), meta(60));

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.victim(), Some(h(1)));
    }

    #[test]
    fn test_lru_ignores_expiry() {
        let mut lru = LruStrategy::new();

        lru.on_insert(h(1), meta(600));
        lru.on_insert(h(2), meta(5));
        lru.on_access(h(1), meta(600));

        assert_eq!(lru.victim(), Some(h(2)));
        lru.on_access(h(2), meta(5));
        assert_eq!(lru.victim(), Some(h(1)));
    }

    #[test]
    fn test_lru_access_promotes() {
        let mut lru = LruStrategy::new();

        lru.on_insert(h(1), meta(60));
        lru.on_insert(h(2), meta(60));
        lru.on_insert(h(3), meta(60));

        lru.on_access(h(1), meta(60));

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.victim(), Some(h(2)));
    }

    #[test]
    fn test_lru_update_promotes() {
        let mut lru = LruStrategy::new();

        lru.on_insert(h(1), meta(60));
        lru.on_insert(h(2), meta(60));
        lru.on_update(h(1), meta(120));

        assert_eq!(lru.victim(), Some(h(2)));
    }

    #[test]
    fn test_lru_order_after_multiple_accesses() {
        let mut lru = LruStrategy::new();

        lru.on_insert(h(0), meta(60));
        lru.on_insert(h(1), meta(60));
        lru.on_insert(h(2), meta(60));

        lru.on_access(h(0), meta(60));
        lru.on_access(h(2), meta(60));
        lru.on_access(h(1), meta(60));

        // Oldest to newest: 0, 2, 1
        assert_eq!(lru.victim(), Some(h(0)));
        lru.on_remove(h(0));
        assert_eq!(lru.victim(), Some(h(2)));
        lru.on_remove(h(2));
        assert_eq!(lru.victim(), Some(h(1)));
        lru.on_remove(h(1));
        assert_eq!(lru.victim(), None);
    }

    #[test]
    fn test_lru_remove_untracked_handle() {
        let mut lru = LruStrategy::new();

        lru.on_insert(h(1), meta(60));
        lru.on_remove(h(42));

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.victim(), Some(h(1)));
    }

    #[test]
    fn test_lru_repeated_access_tracks_once() {
        let mut lru = LruStrategy::new();

        lru.on_insert(h(1), meta(60));
        lru.on_access(h(1), meta(60));
        lru.on_access(h(1), meta(60));

        assert_eq!(lru.len(), 1);
        lru.on_remove(h(1));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_ttl_picks_soonest_expiry() {
        let mut ttl = TtlStrategy::new();

        ttl.on_insert(h(1), meta(300));
        ttl.on_insert(h(2), meta(10));
        ttl.on_insert(h(3), meta(60));

        assert_eq!(ttl.victim(), Some(h(2)));
    }

    #[test]
    fn test_ttl_access_does_not_reorder() {
        let mut ttl = TtlStrategy::new();

        ttl.on_insert(h(1), meta(10));
        ttl.on_insert(h(2), meta(20));
        ttl.on_access(h(1), meta(10));

        assert_eq!(ttl.victim(), Some(h(1)));
    }

    #[test]
    fn test_ttl_update_reorders() {
        let mut ttl = TtlStrategy::new();

        ttl.on_insert(h(1), meta(10));
        ttl.on_insert(h(2), meta(20));
        ttl.on_update(h(1), meta(30));

        assert_eq!(ttl.victim(), Some(h(2)));
        assert_eq!(ttl.len(), 2);
    }

    #[test]
    fn test_ttl_ties_resolve_in_write_order() {
        let mut ttl = TtlStrategy::new();

        ttl.on_insert(h(7), meta(10));
        ttl.on_insert(h(3), meta(10));

        assert_eq!(ttl.victim(), Some(h(7)));
    }

    #[test]
    fn test_clear() {
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Ttl] {
            let mut strategy = policy.strategy();
            strategy.on_insert(h(1), meta(10));
            strategy.on_insert(h(2), meta(20));

            strategy.clear();

            assert!(strategy.is_empty(), "{} strategy not cleared", policy);
            assert_eq!(strategy.victim(), None);
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("lru".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Lru);
        assert_eq!(" TTL ".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Ttl);
        assert!(matches!(
            "lfu".parse::<EvictionPolicy>(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_policy_serde() {
        let json = serde_json::to_string(&EvictionPolicy::Ttl).unwrap();
        assert_eq!(json, "\"ttl\"");
        let policy: EvictionPolicy = serde_json::from_str("\"lru\"").unwrap();
        assert_eq!(policy, EvictionPolicy::Lru);
    }
}
