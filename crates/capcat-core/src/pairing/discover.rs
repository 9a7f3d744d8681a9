//! Folder scan for capture and key-material files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::CandidateFile;

const CAPTURE_EXTENSIONS: [&str; 3] = ["pcap", "pcapng", "cap"];
const KEY_EXTENSIONS: [&str; 4] = ["log", "txt", "keys", "pms"];
const KEY_NAME_TOKENS: [&str; 2] = ["sslkey", "keylog"];

/// Files found in a capture folder, each list sorted by file name.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    pub captures: Vec<CandidateFile>,
    pub keys: Vec<CandidateFile>,
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub fn is_capture_file(path: &Path) -> bool {
    CAPTURE_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Key-material by extension or by a key-sounding name; never a capture file.
pub fn is_key_file(path: &Path) -> bool {
    if is_capture_file(path) {
        return false;
    }
    if KEY_EXTENSIONS.contains(&extension_of(path).as_str()) {
        return true;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    KEY_NAME_TOKENS.iter().any(|t| name.contains(t))
}

/// Lists capture and key-material files directly inside `folder` (non-recursive).
pub fn discover(folder: &Path) -> Result<DiscoveredFiles> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("read capture folder: {}", folder.display()))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("list {}", folder.display()))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut found = DiscoveredFiles::default();
    for path in paths {
        let capture = is_capture_file(&path);
        let key = !capture && is_key_file(&path);
        if !capture && !key {
            continue;
        }
        let mtime = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipping file without mtime: {e}");
                continue;
            }
        };
        let candidate = CandidateFile::new(path, mtime);
        if capture {
            found.captures.push(candidate);
        } else {
            found.keys.push(candidate);
        }
    }

    tracing::debug!(
        folder = %folder.display(),
        captures = found.captures.len(),
        keys = found.keys.len(),
        "discovered capture folder"
    );
    Ok(found)
}
