//! Per-folder parse cache.
//!
//! An entry holds the pairing, each capture file's filtered records and the
//! source mtimes recorded at write time. [`check_freshness`] decides whether
//! an entry may be reused; anything doubtful counts as stale.

mod freshness;
mod store;

pub use freshness::{check_freshness, current_mtimes, FsMtimes, MtimeSource, Staleness};
pub use store::{CacheFileInfo, CacheStore, JsonCacheStore};

pub(crate) use store::write_atomic;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::extract::SkipCounts;
use crate::pairing::FilePair;
use crate::record::CaptureRecord;

const FOLDER_KEY_LEN: usize = 12;

/// Stable identity of a source folder, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderKey(String);

impl FolderKey {
    /// First 12 hex chars of the SHA-256 of the folder path.
    pub fn for_folder(folder: &Path) -> Self {
        let digest = Sha256::digest(folder.to_string_lossy().as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(FOLDER_KEY_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filtered records extracted from one capture file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecords {
    pub capture: PathBuf,
    pub records: Vec<CaptureRecord>,
    #[serde(default)]
    pub counts: SkipCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub folder: PathBuf,
    pub pairs: Vec<FilePair>,
    /// One element per pair, in capture order.
    pub files: Vec<FileRecords>,
    /// Per capture path: max(capture mtime, key mtime) when the entry was written.
    pub mtimes: BTreeMap<PathBuf, SystemTime>,
    pub written_at: SystemTime,
}
