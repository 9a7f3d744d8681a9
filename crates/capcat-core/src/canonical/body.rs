//! Request body canonical form.

use serde_json::Value;
use url::form_urlencoded;

use super::short_hash;

/// How many leading chars are sampled when sniffing for binary payloads.
const BINARY_SAMPLE_CHARS: usize = 100;
/// More control chars than this in the sample marks the body as opaque.
const BINARY_CONTROL_THRESHOLD: usize = 10;

/// Canonical body, tagged with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalBody {
    Empty,
    /// Compact JSON with object keys sorted.
    Json(String),
    /// Form pairs sorted by key then value.
    Form(String),
    /// Short content hash of a binary/opaque payload.
    Digest(String),
    /// Text with whitespace runs collapsed.
    Text(String),
}

impl CanonicalBody {
    pub fn as_str(&self) -> &str {
        match self {
            CanonicalBody::Empty => "",
            CanonicalBody::Json(s)
            | CanonicalBody::Form(s)
            | CanonicalBody::Digest(s)
            | CanonicalBody::Text(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// Canonicalizes a raw body given its declared content type.
///
/// Checks, in order: JSON (by content type or a leading `{`/`[`), form
/// encoding (by content type or the presence of both `=` and `&`), binary
/// sniffing, then whitespace collapsing.
pub fn canonicalize_body(body: &str, content_type: Option<&str>) -> CanonicalBody {
    if body.is_empty() {
        return CanonicalBody::Empty;
    }
    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    let trimmed = body.trim();

    if content_type.contains("application/json")
        || trimmed.starts_with('{')
        || trimmed.starts_with('[')
    {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return CanonicalBody::Json(sorted(value).to_string());
        }
    }

    if content_type.contains("application/x-www-form-urlencoded")
        || (body.contains('=') && body.contains('&'))
    {
        return CanonicalBody::Form(canonical_form(body));
    }

    let control_chars = body
        .chars()
        .take(BINARY_SAMPLE_CHARS)
        .filter(|c| (*c as u32) < 32 && !matches!(c, '\t' | '\r' | '\n'))
        .count();
    if control_chars > BINARY_CONTROL_THRESHOLD {
        return CanonicalBody::Digest(short_hash(body));
    }

    CanonicalBody::Text(body.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Rebuilds objects with keys in sorted order regardless of map backing.
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

fn canonical_form(body: &str) -> String {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(body.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
