//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, bounded capacity and
//! pluggable eviction.

mod entry;
mod eviction;
mod key;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{expiry_after, CacheEntry};
pub use eviction::{
    EntryHandle, EntryMeta, EvictionPolicy, EvictionStrategy, LruStrategy, TtlStrategy,
};
pub use key::{generate_key, validate_key};
pub use shared::SharedCache;
pub use stats::{hit_rate, CacheStats, StatsSnapshot};
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed serialized value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MiB
