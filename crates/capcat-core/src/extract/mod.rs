//! Extraction boundary: raw requests from a capture become capture records.
//!
//! Decoding a capture is delegated to a [`PacketExtractor`]. What it yields is
//! normalized here one record at a time into an explicit [`RecordOutcome`];
//! outcomes are tallied into [`SkipCounts`] rather than silently discarded.

mod error;
mod layers;
mod tshark;

pub use error::ExtractError;
pub use layers::requests_from_tshark_json;
pub use tshark::TsharkExtractor;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::filter::AnalyticsFilter;
use crate::pairing::FilePair;
use crate::record::{compose_full_url, insert_header_first_wins, CaptureRecord, HeaderMap};

const DEFAULT_PORT: u16 = 443;
const DEFAULT_SCHEME: &str = "https";

/// One request as decoded from a capture, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRequest {
    pub method: Option<String>,
    pub uri: String,
    pub host: Option<String>,
    /// Header name/value pairs in wire order; names in any casing.
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub scheme: Option<String>,
    pub port: Option<u16>,
    pub full_url: Option<String>,
}

/// Packet extraction service: decodes one (capture, key file) pair.
pub trait PacketExtractor: Send + Sync + 'static {
    fn extract(
        &self,
        pair: &FilePair,
    ) -> impl Future<Output = Result<Vec<RawRequest>, ExtractError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingMethod,
    MissingHost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Kept(CaptureRecord),
    /// Matched the analytics filter.
    Filtered,
    Dropped(DropReason),
}

/// Aggregate per-record outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub kept: usize,
    pub filtered: usize,
    pub dropped: usize,
}

impl SkipCounts {
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Kept(_) => self.kept += 1,
            RecordOutcome::Filtered => self.filtered += 1,
            RecordOutcome::Dropped(_) => self.dropped += 1,
        }
    }

    pub fn absorb(&mut self, other: SkipCounts) {
        self.kept += other.kept;
        self.filtered += other.filtered;
        self.dropped += other.dropped;
    }
}

/// Validates a raw request, applies the analytics filter and builds the record.
pub fn normalize_raw(raw: RawRequest, source_file: &str, filter: &AnalyticsFilter) -> RecordOutcome {
    let Some(method) = raw.method.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) else {
        return RecordOutcome::Dropped(DropReason::MissingMethod);
    };
    let Some(host) = raw.host.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()) else {
        return RecordOutcome::Dropped(DropReason::MissingHost);
    };

    if filter.is_noise(&host, &raw.uri) {
        return RecordOutcome::Filtered;
    }

    let port = raw.port.unwrap_or(DEFAULT_PORT);
    let scheme = if port == 80 {
        "http".to_string()
    } else {
        raw.scheme
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string())
    };

    let mut headers = HeaderMap::new();
    for (name, value) in &raw.headers {
        if !value.is_empty() {
            insert_header_first_wins(&mut headers, name, value);
        }
    }

    let full_url = raw
        .full_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| compose_full_url(&scheme, &host, port, &raw.uri));

    RecordOutcome::Kept(CaptureRecord {
        method,
        uri: raw.uri,
        host,
        headers,
        body: raw.body,
        scheme,
        port,
        full_url,
        source_file: source_file.to_string(),
    })
}

/// Normalizes a whole file's worth of raw requests, keeping wire order.
pub fn normalize_all(
    raws: Vec<RawRequest>,
    source_file: &str,
    filter: &AnalyticsFilter,
) -> (Vec<CaptureRecord>, SkipCounts) {
    let mut counts = SkipCounts::default();
    let mut records = Vec::with_capacity(raws.len());
    for raw in raws {
        let outcome = normalize_raw(raw, source_file, filter);
        counts.record(&outcome);
        if let RecordOutcome::Kept(record) = outcome {
            records.push(record);
        }
    }
    (records, counts)
}
