//! Extraction error type.

use std::time::Duration;

use thiserror::Error;

/// Why a capture file produced no records.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to start extractor: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("extractor exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
    #[error("extractor output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
