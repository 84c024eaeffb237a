//! Session Lifecycle Module
//!
//! Thin create/load/save/destroy conveniences over a [`SharedCache`] of
//! [`SessionRecord`]s.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::SharedCache;
use crate::clock::Clock;
use crate::error::Result;
use crate::models::SessionRecord;

/// Creates, saves and destroys session records.
///
/// The manager and the cache should share one clock so the timestamps
/// written into records match the cache's own expiry bookkeeping.
#[derive(Clone)]
pub struct SessionManager {
    cache: SharedCache<SessionRecord>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(cache: SharedCache<SessionRecord>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { cache, clock, ttl }
    }

    /// Returns the underlying cache handle.
    pub fn cache(&self) -> &SharedCache<SessionRecord> {
        &self.cache
    }

    // == Create ==
    /// Stores a new empty session under a fresh random id and returns it.
    pub async fn create(&self) -> Result<SessionRecord> {
        let now = self.clock.now();
        // Validate the TTL before a key is reserved
        let template = SessionRecord::new(String::new(), now, self.ttl)?;

        let id = self
            .cache
            .set_generated(
                |key| SessionRecord {
                    id: key.to_string(),
                    ..template.clone()
                },
                Some(self.ttl),
            )
            .await?;

        debug!(session_id = %id, "Created session");
        Ok(SessionRecord { id, ..template })
    }

    // == Load ==
    /// Fetches a copy of a live session.
    pub async fn load(&self, id: &str) -> Option<SessionRecord> {
        self.cache.get(id).await
    }

    // == Save ==
    /// Writes a mutated record back under its id with a fresh TTL.
    ///
    /// `updated_at` and `expires_at` on `record` are refreshed only once the
    /// write succeeded. A record whose entry expired in the meantime is
    /// stored again as a new entry.
    pub async fn save(&self, record: &mut SessionRecord) -> Result<()> {
        let mut stamped = record.clone();
        stamped.stamp(self.clock.now(), self.ttl)?;
        let (updated_at, expires_at) = (stamped.updated_at, stamped.expires_at);

        self.cache
            .set(Some(stamped.id.clone()), stamped, Some(self.ttl))
            .await?;

        record.updated_at = updated_at;
        record.expires_at = expires_at;
        debug!(session_id = %record.id, "Saved session");
        Ok(())
    }

    // == Destroy ==
    /// Removes a session, returning whether a live one existed.
    pub async fn destroy(&self, id: &str) -> bool {
        let removed = self.cache.delete(id).await;
        if removed {
            debug!(session_id = %id, "Destroyed session");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::error::CacheError;

    fn manager(ttl: Duration) -> (SessionManager, ManualClock) {
        let clock = ManualClock::default();
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let cache = SharedCache::with_clock(&Config::default(), shared.clone()).unwrap();
        (SessionManager::new(cache, shared, ttl), clock)
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let (sessions, clock) = manager(Duration::from_secs(60));

        let record = sessions.create().await.unwrap();

        assert_eq!(record.id.len(), 32);
        assert_eq!(record.created_at, clock.now());
        let loaded = sessions.load(&record.id).await.unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_save_persists_changes() {
        let (sessions, clock) = manager(Duration::from_secs(60));
        let mut record = sessions.create().await.unwrap();

        clock.advance(Duration::from_secs(30));
        record.inputs = json!({ "step": 3, "company": "Acme" });
        sessions.save(&mut record).await.unwrap();

        let loaded = sessions.load(&record.id).await.unwrap();
        assert_eq!(loaded.inputs["company"], "Acme");
        assert_eq!(loaded.updated_at, clock.now());
        assert_eq!(loaded.created_at, record.created_at);
    }

    #[tokio::test]
    async fn test_save_extends_lifetime() {
        let (sessions, clock) = manager(Duration::from_secs(60));
        let mut record = sessions.create().await.unwrap();

        clock.advance(Duration::from_secs(50));
        sessions.save(&mut record).await.unwrap();
        clock.advance(Duration::from_secs(50));

        assert!(sessions.load(&record.id).await.is_some());
    }

    #[tokio::test]
    async fn test_session_expires() {
        let (sessions, clock) = manager(Duration::from_secs(60));
        let record = sessions.create().await.unwrap();

        clock.advance(Duration::from_secs(60));

        assert!(sessions.load(&record.id).await.is_none());
    }

    #[tokio::test]
    async fn test_destroy() {
        let (sessions, _) = manager(Duration::from_secs(60));
        let record = sessions.create().await.unwrap();

        assert!(sessions.destroy(&record.id).await);
        assert!(!sessions.destroy(&record.id).await);
        assert!(sessions.load(&record.id).await.is_none());
        assert_eq!(sessions.cache().stats().await.deletes, 1);
    }

    #[tokio::test]
    async fn test_destroy_expired_session() {
        let (sessions, clock) = manager(Duration::from_secs(60));
        let record = sessions.create().await.unwrap();

        clock.advance(Duration::from_secs(61));

        assert!(!sessions.destroy(&record.id).await);
        assert_eq!(sessions.cache().stats().await.deletes, 0);
        assert!(sessions.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_zero_ttl() {
        let (sessions, _) = manager(Duration::ZERO);

        let result = sessions.create().await;

        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
        assert!(sessions.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_oversized_session_rejected() {
        let (sessions, clock) = manager(Duration::from_secs(60));
        let mut record = sessions.create().await.unwrap();

        let (updated_at, expires_at) = (record.updated_at, record.expires_at);

        clock.advance(Duration::from_secs(10));
        record.results = json!({ "report": "x".repeat(crate::cache::MAX_VALUE_SIZE) });
        let result = sessions.save(&mut record).await;

        assert!(matches!(result, Err(CacheError::SizeLimitExceeded { .. })));
        assert_eq!(record.updated_at, updated_at, "failed save must not restamp");
        assert_eq!(record.expires_at, expires_at);
        let stored = sessions.load(&record.id).await.unwrap();
        assert_eq!(stored.results, json!({}));
        assert_eq!(stored.updated_at, updated_at);
    }
}
