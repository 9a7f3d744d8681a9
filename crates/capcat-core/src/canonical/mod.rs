//! Canonical forms for request URLs and bodies.
//!
//! Both canonicalizers are total: when input cannot be parsed they hand back
//! the raw value (or a plain-text normalization of it) so a single odd record
//! only weakens deduplication for itself.

mod body;
mod url;

pub use self::body::{canonicalize_body, CanonicalBody};
pub use self::url::canonicalize_url;

use sha2::{Digest, Sha256};

/// Length in hex chars of the short content hashes used in signatures.
pub const SHORT_HASH_LEN: usize = 16;

/// First [`SHORT_HASH_LEN`] hex chars of the SHA-256 of `data`.
pub fn short_hash(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(SHORT_HASH_LEN);
    hex
}
