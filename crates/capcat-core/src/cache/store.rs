//! JSON cache files under `~/.cache/capcat/`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{CacheEntry, FolderKey};

const ENTRY_EXT: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

/// Keyed storage for parse cache entries.
pub trait CacheStore: Send + Sync {
    /// The stored entry, or None when missing or unreadable.
    fn get(&self, key: &FolderKey) -> Option<CacheEntry>;

    /// Replaces the entry; readers never observe a partial write.
    fn put(&self, key: &FolderKey, entry: &CacheEntry) -> Result<()>;

    /// Removes the entry. Returns whether one existed.
    fn invalidate(&self, key: &FolderKey) -> Result<bool>;
}

/// One cache file as reported by `cache status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Source folder, when the entry is readable.
    pub folder: Option<PathBuf>,
    pub pair_count: usize,
    pub request_count: usize,
}

#[derive(Debug, Clone)]
pub struct JsonCacheStore {
    dir: PathBuf,
}

impl JsonCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.cache/capcat/`.
    pub fn default_dir() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("capcat")?;
        Ok(xdg_dirs.get_cache_home().join("capcat"))
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &FolderKey) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let rd = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("read dir: {}", self.dir.display())),
        };
        let mut files = Vec::new();
        for dent in rd {
            let path = dent?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == ENTRY_EXT) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Describes every cache file in the directory.
    pub fn status(&self) -> Result<Vec<CacheFileInfo>> {
        let mut out = Vec::new();
        for path in self.entry_files()? {
            let meta = std::fs::metadata(&path).ok();
            let entry = read_entry(&path).ok();
            out.push(CacheFileInfo {
                size: meta.as_ref().map_or(0, |m| m.len()),
                modified: meta.and_then(|m| m.modified().ok()),
                folder: entry.as_ref().map(|e| e.folder.clone()),
                pair_count: entry.as_ref().map_or(0, |e| e.pairs.len()),
                request_count: entry
                    .as_ref()
                    .map_or(0, |e| e.files.iter().map(|f| f.records.len()).sum()),
                path,
            });
        }
        Ok(out)
    }

    /// Deletes every cache file. Returns how many were removed.
    pub fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_files()? {
            std::fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Deletes cache files last modified more than `max_age` before `now`.
    pub fn cleanup_older_than(&self, max_age: Duration, now: SystemTime) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_files()? {
            let Ok(modified) = std::fs::metadata(&path).and_then(|m| m.modified()) else {
                continue;
            };
            let old = now
                .duration_since(modified)
                .map(|age| age > max_age)
                .unwrap_or(false);
            if old {
                std::fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn read_entry(path: &Path) -> Result<CacheEntry> {
    let bytes = std::fs::read(path).with_context(|| format!("read cache: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse cache: {}", path.display()))
}

impl CacheStore for JsonCacheStore {
    fn get(&self, key: &FolderKey) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        if !path.exists() {
            return None;
        }
        match read_entry(&path) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("ignoring unreadable cache entry: {e:#}");
                None
            }
        }
    }

    fn put(&self, key: &FolderKey, entry: &CacheEntry) -> Result<()> {
        let json = serde_json::to_vec_pretty(entry).context("serialize cache entry")?;
        write_atomic(&self.entry_path(key), &json)
    }

    fn invalidate(&self, key: &FolderKey) -> Result<bool> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(TEMP_SUFFIX);
    let temp = PathBuf::from(temp);
    std::fs::write(&temp, bytes).with_context(|| format!("write {}", temp.display()))?;
    std::fs::rename(&temp, path)
        .with_context(|| format!("failed to rename {} to {}", temp.display(), path.display()))?;
    Ok(())
}
