//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::EvictionPolicy;
use crate::error::{CacheError, Result};

/// Default maximum number of entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default TTL applied when a write does not carry one (24 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of live entries the cache can hold
    pub max_entries: usize,
    /// TTL for writes that do not specify one
    pub default_ttl: Duration,
    /// Strategy used when an insert would exceed `max_entries`
    pub eviction_policy: EvictionPolicy,
    /// Interval between background expiry sweeps
    pub sweep_interval: Duration,
}

impl Config {
    /// Loads the configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10000)
    /// - `CACHE_DEFAULT_TTL_SECS` - Default TTL in seconds (default: 86400)
    /// - `CACHE_EVICTION_POLICY` - `lru` or `ttl` (default: lru)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    ///
    /// Unset variables fall back to their defaults. A variable that is set but
    /// cannot be parsed is an error, as is any value rejected by [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            max_entries: parse_var(&lookup, "CACHE_MAX_ENTRIES")?.unwrap_or(defaults.max_entries),
            default_ttl: parse_var(&lookup, "CACHE_DEFAULT_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
            eviction_policy: parse_var(&lookup, "CACHE_EVICTION_POLICY")?
                .unwrap_or(defaults.eviction_policy),
            sweep_interval: parse_var(&lookup, "CACHE_SWEEP_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    // == Validate ==
    /// Checks that every value can back a working store.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be a positive integer".to_string(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default_ttl must be greater than zero".to_string(),
            ));
        }
        if chrono::Duration::from_std(self.default_ttl).is_err() {
            return Err(CacheError::InvalidConfig(format!(
                "default_ttl of {:?} is out of range",
                self.default_ttl
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            default_ttl: DEFAULT_TTL,
            eviction_policy: EvictionPolicy::Lru,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Parses an optional variable, turning parse failures into config errors.
fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            CacheError::InvalidConfig(format!("{}='{}' is invalid: {}", name, raw, e))
        }),
    }
}
