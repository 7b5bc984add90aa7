//! API key material: secret generation and the one-way hash used for storage.
//!
//! A key looks like `sk-` followed by 64 lowercase hex characters (32 random
//! bytes), 67 characters in total. Only `hash(key)` is ever persisted.

use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Literal tag in front of every generated key.
pub const KEY_PREFIX: &str = "sk-";

/// Number of random bytes behind each key.
pub const KEY_BYTES: usize = 32;

/// Total length of a generated key.
pub const KEY_LENGTH: usize = KEY_PREFIX.len() + KEY_BYTES * 2;

/// Generate a new API key from the operating system's secure random source.
///
/// # Errors
///
/// `AppError::Internal` if the OS random source is unavailable. This is not
/// retried.
pub fn generate() -> Result<String, AppError> {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "Secure random source unavailable");
        AppError::Internal("failed to generate API key".to_string())
    })?;

    let mut key = String::with_capacity(KEY_LENGTH);
    key.push_str(KEY_PREFIX);
    key.push_str(&hex::encode(bytes));
    Ok(key)
}

/// SHA-256 of the key's UTF-8 bytes, hex-encoded.
///
/// Unsalted: every request re-hashes the presented key and searches for the
/// digest, so the output must be stable across restarts.
pub fn hash(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_prefix_and_length() {
        let key = generate().unwrap();

        assert_eq!(key.len(), 67);
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.starts_with("sk-"));
        assert!(
            key[KEY_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn generated_keys_differ() {
        let first = generate().unwrap();
        let second = generate().unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash("sk-abc"), hash("sk-abc"));
    }

    #[test]
    fn hash_separates_distinct_inputs() {
        assert_ne!(hash("sk-abc"), hash("sk-abd"));
        assert_ne!(hash("sk-abc"), hash("sk-abc "));
    }

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash("").len(), 64);
    }

    #[test]
    fn hash_never_equals_key() {
        let key = generate().unwrap();
        assert_ne!(hash(&key), key);
    }
}
