//! Deduplication signature for a capture record.
//!
//! A signature is `METHOD|canonical-url|body-hash|header-fingerprint`. Only
//! headers that stay constant across logically identical requests take part:
//! the base media type of `Content-Type` and an `Authorization` value that
//! looks long-lived. Timestamps, nonces and request IDs are left out.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical::{canonicalize_body, canonicalize_url, short_hash};
use crate::record::CaptureRecord;

/// Bearer credentials at or above this length are treated as rotating tokens.
const STABLE_BEARER_MAX_LEN: usize = 100;
/// Authorization values are truncated to this many chars in the fingerprint.
const AUTH_FINGERPRINT_LEN: usize = 50;

const BODY_METHODS: [&str; 4] = ["POST", "PUT", "PATCH", "DELETE"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the signature of a record.
pub fn signature(record: &CaptureRecord) -> Signature {
    let method = record.method.trim().to_ascii_uppercase();
    let url = canonicalize_url(&record.full_url);
    let content_type = record.header("Content-Type");

    let body_hash = if !record.body.is_empty() && BODY_METHODS.contains(&method.as_str()) {
        let canonical = canonicalize_body(&record.body, content_type);
        short_hash(canonical.as_str())
    } else {
        String::new()
    };

    let fingerprint = header_fingerprint(content_type, record.header("Authorization"));

    Signature([method, url, body_hash, fingerprint].join("|"))
}

fn header_fingerprint(content_type: Option<&str>, authorization: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(2);

    if let Some(ct) = content_type {
        let base = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if !base.is_empty() {
            parts.push(format!("ct:{base}"));
        }
    }

    if let Some(auth) = authorization.filter(|a| is_stable_authorization(a)) {
        let truncated: String = auth.chars().take(AUTH_FINGERPRINT_LEN).collect();
        parts.push(format!("auth:{truncated}"));
    }

    parts.join("|")
}

/// Basic credentials, or a Bearer token short enough to be a static key.
fn is_stable_authorization(value: &str) -> bool {
    value.starts_with("Basic ")
        || (value.starts_with("Bearer ") && value.chars().count() < STABLE_BEARER_MAX_LEN)
}
