//! Data models stored in the cache
//!
//! Record shapes the application layer keeps in the session store.

mod session;

pub use session::{SessionRecord, SESSION_SCHEMA_VERSION};
