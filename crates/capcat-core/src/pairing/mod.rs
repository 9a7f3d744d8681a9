//! Capture ↔ key-material file pairing.
//!
//! Every capture file is paired with exactly one key file whenever at least
//! one key file exists. Several captures may share a key file.

mod discover;
mod score;

pub use discover::{discover, is_capture_file, is_key_file, DiscoveredFiles};
pub use score::{pair_score, MIN_CONFIDENT_SCORE};

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A file taking part in pairing: its path, lower-cased stem and mtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub stem: String,
    pub mtime: SystemTime,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>, mtime: SystemTime) -> Self {
        let path = path.into();
        let stem = stem_of(&path);
        Self { path, stem, mtime }
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// A capture file and the key-material file chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePair {
    pub capture: PathBuf,
    pub key: PathBuf,
}

/// Pairs each capture with its best-scoring key file.
///
/// Ties go to the key listed first. When the best score is below
/// [`MIN_CONFIDENT_SCORE`] the first key file is used instead. Returns an
/// empty list when there are no key files.
pub fn pair_files(captures: &[CandidateFile], keys: &[CandidateFile]) -> Vec<FilePair> {
    let Some(first_key) = keys.first() else {
        return Vec::new();
    };

    captures
        .iter()
        .map(|capture| {
            let mut best: Option<(&CandidateFile, u32)> = None;
            for key in keys {
                let score = pair_score(capture, key);
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((key, score));
                }
            }
            let chosen = match best {
                Some((key, score)) if score >= MIN_CONFIDENT_SCORE => key,
                _ => first_key,
            };
            tracing::debug!(
                capture = %capture.path.display(),
                key = %chosen.path.display(),
                "paired capture with key file"
            );
            FilePair {
                capture: capture.path.clone(),
                key: chosen.path.clone(),
            }
        })
        .collect()
}
