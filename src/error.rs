//! Error types for the session cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the session cache.
///
/// Missing or expired keys are not errors: lookups report them as `None`
/// or `false`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Serialized value is larger than the configured ceiling
    #[error("Value of {size} bytes exceeds maximum size of {limit} bytes")]
    SizeLimitExceeded { size: usize, limit: usize },

    /// Key is empty or too long
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// TTL is zero or out of the representable range
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Value could not be serialized for size measurement
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the session cache.
pub type Result<T> = std::result::Result<T, CacheError>;
