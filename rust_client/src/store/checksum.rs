//! Snapshot integrity checksums.

use sha2::{Digest, Sha256};

/// SHA-256 of `content`, hex encoded.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `checksum` was computed from `content`.
pub fn verify_checksum(content: &str, checksum: &str) -> bool {
    calculate_checksum(content).eq_ignore_ascii_case(checksum)
}
