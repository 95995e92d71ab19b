//! Stable hashing for deterministic stub values

use sha2::{Digest, Sha256};

/// First 16 hex chars of the SHA-256 of `input`. Stable across runs and builds.
pub fn stable_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}
