//! Session Cache - An in-memory keyed cache for session storage
//!
//! Provides a capacity-bounded cache with TTL expiration, pluggable LRU or
//! soonest-to-expire eviction, a background expiry sweeper and hit/miss metrics.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod sessions;
pub mod tasks;

pub use cache::{CacheStore, EvictionPolicy, SharedCache, StatsSnapshot};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use models::SessionRecord;
pub use sessions::SessionManager;
pub use tasks::{spawn_sweeper, SweeperHandle};
