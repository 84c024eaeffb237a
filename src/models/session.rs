//! Session record stored in the cache
//!
//! Defines the conventional shape of a session value. The cache itself treats
//! it as opaque and only serializes it to measure its size.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::expiry_after;
use crate::error::Result;

/// Current schema version written into new records.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// A user session as stored by the application layer.
///
/// The five sub-records are free-form JSON objects owned by the collaborators
/// that fill them in (form steps, generation settings, LLM output, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session identifier, equal to the cache key
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Schema version of this record
    pub version: u32,
    #[serde(default = "empty_object")]
    pub user: Value,
    #[serde(default = "empty_object")]
    pub inputs: Value,
    #[serde(default = "empty_object")]
    pub config: Value,
    #[serde(default = "empty_object")]
    pub results: Value,
    #[serde(default = "empty_object")]
    pub meta: Value,
}

impl SessionRecord {
    /// Creates an empty record expiring `ttl` after `now`.
    pub fn new(id: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Result<Self> {
        let expires_at = expiry_after(now, ttl)?;

        Ok(Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            expires_at,
            version: SESSION_SCHEMA_VERSION,
            user: empty_object(),
            inputs: empty_object(),
            config: empty_object(),
            results: empty_object(),
            meta: empty_object(),
        })
    }

    /// Marks the record as written at `now` with a fresh TTL.
    pub fn stamp(&mut self, now: DateTime<Utc>, ttl: Duration) -> Result<()> {
        self.expires_at = expiry_after(now, ttl)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
