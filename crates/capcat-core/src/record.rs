//! Capture records: one HTTP request recovered from a capture file.
//!
//! Header-map keys always use the canonical casing produced by
//! [`canonical_header_name`]; every producer normalizes names on the way in
//! and every lookup uses the canonical form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header map keyed by canonical header name.
pub type HeaderMap = BTreeMap<String, String>;

/// One request as recovered by extraction. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub method: String,
    /// Request target as seen on the wire (path plus query).
    pub uri: String,
    pub host: String,
    pub headers: HeaderMap,
    pub body: String,
    pub scheme: String,
    pub port: u16,
    /// Absolute URL of the request.
    pub full_url: String,
    /// File name of the capture the record came from.
    pub source_file: String,
}

impl CaptureRecord {
    /// Header value by name (any casing).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&canonical_header_name(name))
            .map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// Builds `scheme://host[:port]uri`, omitting the port for 80 and 443.
pub fn compose_full_url(scheme: &str, host: &str, port: u16, uri: &str) -> String {
    let port_part = if port == 80 || port == 443 {
        String::new()
    } else {
        format!(":{port}")
    };
    format!("{scheme}://{host}{port_part}{uri}")
}

/// Canonical header casing: `x-csrf-token` -> `X-Csrf-Token`.
pub fn canonical_header_name(name: &str) -> String {
    name.trim()
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Inserts `(name, value)` under the canonical name unless that name is already present.
pub fn insert_header_first_wins(headers: &mut HeaderMap, name: &str, value: &str) {
    let key = canonical_header_name(name);
    if key.is_empty() {
        return;
    }
    headers.entry(key).or_insert_with(|| value.to_string());
}
