//! Key Module
//!
//! Key validation and random key generation.

use uuid::Uuid;

use crate::cache::MAX_KEY_LENGTH;
use crate::error::{CacheError, Result};

// == Generate Key ==
/// Returns a fresh random key.
///
/// Keys are the 32-character hex form of a v4 UUID, drawn from the
/// operating system's CSPRNG (122 random bits).
pub fn generate_key() -> String {
    Uuid::new_v4().simple().to_string()
}

// == Validate Key ==
/// Rejects empty keys and keys longer than `MAX_KEY_LENGTH` bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
