//! Cache freshness oracle.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;

use super::CacheEntry;
use crate::pairing::FilePair;

/// Source of file modification times (the filesystem outside tests).
pub trait MtimeSource {
    fn mtime(&self, path: &Path) -> io::Result<SystemTime>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsMtimes;

impl MtimeSource for FsMtimes {
    fn mtime(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }
}

/// Why a cache entry cannot be reused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Staleness {
    #[error("entry is older than the cache TTL")]
    Expired,
    #[error("no recorded mtime for {}", .0.display())]
    MissingFile(PathBuf),
    #[error("{} changed since the entry was written", .0.display())]
    Modified(PathBuf),
    #[error("{} is now paired with a different key file", .0.display())]
    PairingChanged(PathBuf),
    #[error("cannot stat {}: {}", .0.display(), .1)]
    Unreadable(PathBuf, String),
}

/// Max of the capture and key file mtimes for each pair, keyed by capture path.
pub fn current_mtimes(
    pairs: &[FilePair],
    source: &impl MtimeSource,
) -> Result<BTreeMap<PathBuf, SystemTime>, Staleness> {
    let mut out = BTreeMap::new();
    for pair in pairs {
        let stat = |p: &Path| {
            source
                .mtime(p)
                .map_err(|e| Staleness::Unreadable(p.to_path_buf(), e.to_string()))
        };
        let newest = stat(&pair.capture)?.max(stat(&pair.key)?);
        out.insert(pair.capture.clone(), newest);
    }
    Ok(out)
}

/// Ok when `entry` may be served for the current `pairs`.
///
/// Stale when the entry is older than `ttl` (or stamped in the future), when
/// a paired capture has no recorded mtime or a different key file, when any
/// current mtime is newer than the recorded one, or when a file cannot be
/// stat'ed.
pub fn check_freshness(
    entry: &CacheEntry,
    pairs: &[FilePair],
    ttl: Duration,
    now: SystemTime,
    source: &impl MtimeSource,
) -> Result<(), Staleness> {
    match now.duration_since(entry.written_at) {
        Ok(age) if age <= ttl => {}
        _ => return Err(Staleness::Expired),
    }

    for pair in pairs {
        if !entry.mtimes.contains_key(&pair.capture) {
            return Err(Staleness::MissingFile(pair.capture.clone()));
        }
        let recorded_key = entry
            .pairs
            .iter()
            .find(|p| p.capture == pair.capture)
            .map(|p| &p.key);
        if recorded_key != Some(&pair.key) {
            return Err(Staleness::PairingChanged(pair.capture.clone()));
        }
    }

    for (capture, current) in current_mtimes(pairs, source)? {
        match entry.mtimes.get(&capture) {
            Some(recorded) if current <= *recorded => {}
            _ => return Err(Staleness::Modified(capture)),
        }
    }

    Ok(())
}
