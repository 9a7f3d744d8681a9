//! URL canonical form used for request equality.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::{form_urlencoded, Url};

/// Characters left unescaped when re-encoding a decoded path segment.
/// `/` is not among them: an encoded separator stays encoded.
const SEGMENT_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b':')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

const DEFAULT_SCHEME: &str = "https";

/// Canonical string form of an absolute URL.
///
/// - scheme and host lower-cased; a missing scheme becomes `https`
/// - each path segment percent-decoded and re-encoded on its own, empty
///   segments dropped (so repeated and trailing slashes go away, root stays
///   `/`), segments decoding to `.` or `..` resolved
/// - query pairs sorted by key then value, blank values kept
/// - fragment dropped
///
/// Returns `raw` unchanged when it cannot be parsed.
pub fn canonicalize_url(raw: &str) -> String {
    try_canonicalize(raw).unwrap_or_else(|| raw.to_string())
}

fn try_canonicalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return None;
    }
    let candidate: Cow<'_, str> = if trimmed.contains("://") {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("{DEFAULT_SCHEME}://{trimmed}"))
    };
    let parsed = Url::parse(&candidate).ok()?;

    let scheme = parsed.scheme().to_ascii_lowercase();
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let netloc = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };

    let path = canonical_path(parsed.path());
    match canonical_query(parsed.query()) {
        Some(query) => Some(format!("{scheme}://{netloc}{path}?{query}")),
        None => Some(format!("{scheme}://{netloc}{path}")),
    }
}

fn canonical_path(path: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    for raw in path.split('/') {
        let decoded = percent_decode_str(raw).decode_utf8_lossy();
        match decoded.as_ref() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(utf8_percent_encode(segment, SEGMENT_SAFE).to_string()),
        }
    }
    format!("/{}", segments.join("/"))
}

fn canonical_query(query: Option<&str>) -> Option<String> {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query?.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    pairs.sort();
    Some(
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish(),
    )
}
