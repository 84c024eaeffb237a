//! Shared Cache Handle
//!
//! Thread-safe, cloneable handle over a [`CacheStore`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::cache::{CacheStore, EvictionPolicy, StatsSnapshot};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;

// == Shared Cache ==
/// Cloneable handle to a store guarded by a single `RwLock`.
///
/// Every operation that can change an entry, the recency order or the
/// counters takes the write lock. That includes `get` and `exists`, which
/// update recency and may remove an expired entry, so capacity checks,
/// eviction and insertion always see one consistent state. Only `stats`,
/// `len` and `ttl_remaining` share the read lock.
///
/// Clones refer to the same store. To re-initialize, build a new
/// `SharedCache` and drop the old handles.
pub struct SharedCache<V> {
    inner: Arc<RwLock<CacheStore<V>>>,
}

impl<V> SharedCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    /// Creates a new shared store from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::from_store(CacheStore::new(config)?))
    }

    /// Creates a new shared store reading time from `clock`.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self::from_store(CacheStore::with_clock(config, clock)?))
    }

    /// Wraps an existing store.
    pub fn from_store(store: CacheStore<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// See [`CacheStore::set`].
    pub async fn set(&self, key: Option<String>, value: V, ttl: Option<Duration>) -> Result<String> {
        self.inner.write().await.set(key, value, ttl)
    }

    /// See [`CacheStore::set_generated`].
    pub async fn set_generated<F>(&self, build: F, ttl: Option<Duration>) -> Result<String>
    where
        F: FnOnce(&str) -> V,
    {
        self.inner.write().await.set_generated(build, ttl)
    }

    /// See [`CacheStore::get`].
    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.write().await.get(key)
    }

    /// See [`CacheStore::exists`].
    pub async fn exists(&self, key: &str) -> bool {
        self.inner.write().await.exists(key)
    }

    /// See [`CacheStore::delete`].
    pub async fn delete(&self, key: &str) -> bool {
        self.inner.write().await.delete(key)
    }

    /// See [`CacheStore::touch`].
    pub async fn touch(&self, key: &str, ttl: Option<Duration>) -> Result<bool> {
        self.inner.write().await.touch(key, ttl)
    }

    /// See [`CacheStore::clear`].
    pub async fn clear(&self) {
        self.inner.write().await.clear()
    }

    /// See [`CacheStore::sweep_expired`].
    pub async fn sweep_expired(&self) -> usize {
        self.inner.write().await.sweep_expired()
    }

    /// See [`CacheStore::stats`].
    pub async fn stats(&self) -> StatsSnapshot {
        self.inner.read().await.stats()
    }

    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.inner.read().await.ttl_remaining(key)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn policy(&self) -> EvictionPolicy {
        self.inner.read().await.policy()
    }

    pub async fn default_ttl(&self) -> Duration {
        self.inner.read().await.default_ttl()
    }
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
