//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::EntryMeta;
use crate::error::{CacheError, Result};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value
    pub value: V,
    /// When the entry was first inserted
    pub created_at: DateTime<Utc>,
    /// When the value or TTL was last written
    pub updated_at: DateTime<Utc>,
    /// When the entry stops being retrievable, always after `updated_at`
    pub expires_at: DateTime<Utc>,
    /// When the entry was last read or written
    pub last_accessed_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` after `now`.
    ///
    /// # Errors
    /// `InvalidTtl` if `ttl` is zero or pushes the expiry out of range.
    pub fn new(key: String, value: V, now: DateTime<Utc>, ttl: Duration) -> Result<Self> {
        let expires_at = expiry_after(now, ttl)?;

        Ok(Self {
            key,
            value,
            created_at: now,
            updated_at: now,
            expires_at,
            last_accessed_at: now,
        })
    }

    // == Replace ==
    /// Overwrites the value and restarts the TTL, keeping `created_at`.
    pub fn replace(&mut self, value: V, now: DateTime<Utc>, ttl: Duration) -> Result<()> {
        let expires_at = expiry_after(now, ttl)?;
        self.value = value;
        self.updated_at = now;
        self.expires_at = expires_at;
        self.last_accessed_at = now;
        Ok(())
    }

    // == Extend ==
    /// Pushes the expiry to `now + ttl` without altering the value.
    pub fn extend(&mut self, now: DateTime<Utc>, ttl: Duration) -> Result<()> {
        self.expires_at = expiry_after(now, ttl)?;
        self.updated_at = now;
        self.last_accessed_at = now;
        Ok(())
    }

    // == Record Access ==
    pub fn record_access(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
    }

    /// Timestamps handed to the eviction strategy.
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            expires_at: self.expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so a
    /// TTL of `t` makes the entry unreadable at exactly `t` after the write.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the time left before expiry, `Duration::ZERO` once expired.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

// == Utility Functions ==
/// Computes `now + ttl`, rejecting zero and out-of-range durations.
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidTtl("TTL must be greater than zero".to_string()));
    }

    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| CacheError::InvalidTtl(format!("TTL of {:?} is out of range", ttl)))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Duration) -> (CacheEntry<String>, DateTime<Utc>) {
        let now = Utc::now();
        let entry = CacheEntry::new("key".to_string(), "test_value".to_string(), now, ttl).unwrap();
        (entry, now)
    }

    #[test]
    fn test_entry_creation() {
        let (entry, now) = entry(Duration::from_secs(60));

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.created_at, now);
        assert_eq!(entry.updated_at, now);
        assert_eq!(entry.last_accessed_at, now);
        assert!(entry.expires_at > entry.updated_at);
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_entry_zero_ttl_rejected() {
        let result = CacheEntry::new("key".to_string(), 1u8, Utc::now(), Duration::ZERO);
        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
    }

    #[test]
    fn test_entry_huge_ttl_rejected() {
        let result = CacheEntry::new("key".to_string(), 1u8, Utc::now(), Duration::MAX);
        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let (entry, now) = entry(Duration::from_millis(100));

        assert!(!entry.is_expired_at(now + chrono::Duration::milliseconds(99)));
        assert!(entry.is_expired_at(now + chrono::Duration::milliseconds(100)));
    }

    #[test]
    fn test_ttl_remaining() {
        let (entry, now) = entry(Duration::from_secs(10));

        assert_eq!(entry.ttl_remaining(now), Duration::from_secs(10));
        assert_eq!(
            entry.ttl_remaining(now + chrono::Duration::seconds(4)),
            Duration::from_secs(6)
        );
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let (entry, now) = entry(Duration::from_secs(1));

        assert_eq!(
            entry.ttl_remaining(now + chrono::Duration::seconds(5)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_replace_preserves_created_at() {
        let (mut entry, created) = entry(Duration::from_secs(1));
        let later = created + chrono::Duration::seconds(30);

        entry
            .replace("new_value".to_string(), later, Duration::from_secs(1))
            .unwrap();

        assert_eq!(entry.value, "new_value");
        assert_eq!(entry.created_at, created);
        assert_eq!(entry.updated_at, later);
        assert_eq!(entry.expires_at, later + chrono::Duration::seconds(1));
    }

    #[test]
    fn test_extend_keeps_value() {
        let (mut entry, created) = entry(Duration::from_secs(1));
        let later = created + chrono::Duration::milliseconds(500);

        entry.extend(later, Duration::from_secs(10)).unwrap();

        assert_eq!(entry.value, "test_value");
        assert!(!entry.is_expired_at(created + chrono::Duration::seconds(5)));
    }

    #[test]
    fn test_failed_replace_leaves_entry_untouched() {
        let (mut entry, created) = entry(Duration::from_secs(1));
        let expires = entry.expires_at;

        let result = entry.replace("other".to_string(), created, Duration::ZERO);

        assert!(result.is_err());
        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.expires_at, expires);
    }
}
