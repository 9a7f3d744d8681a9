//! `capcat cache status|clear`.

use anyhow::{bail, Result};
use capcat_core::cache::{CacheStore, FolderKey, JsonCacheStore};
use capcat_core::config::CapcatConfig;
use std::time::SystemTime;

use crate::cli::CacheAction;

pub fn run_cache(cfg: &CapcatConfig, action: CacheAction) -> Result<()> {
    let store = JsonCacheStore::open_default()?;
    match action {
        CacheAction::Status => {
            let entries = store.status()?;
            println!("Cache dir: {}", store.dir().display());
            if entries.is_empty() {
                println!("No cache entries.");
            } else {
                println!("{:<10} {:<6} {:<6} {:<6} {}", "BYTES", "AGE", "FILES", "REQS", "FOLDER");
            }
            let now = SystemTime::now();
            for e in entries {
                let age = e
                    .modified
                    .and_then(|m| now.duration_since(m).ok())
                    .map(|d| format!("{}h", d.as_secs() / 3600))
                    .unwrap_or_else(|| "-".to_string());
                let folder = e
                    .folder
                    .map(|f| f.display().to_string())
                    .unwrap_or_else(|| "(unreadable)".to_string());
                println!(
                    "{:<10} {:<6} {:<6} {:<6} {}",
                    e.size, age, e.pair_count, e.request_count, folder
                );
            }
        }
        CacheAction::Clear { all, folder, old } => {
            if all {
                println!("Removed {} cache entr(ies)", store.clear_all()?);
            } else if let Some(folder) = folder {
                let folder = std::fs::canonicalize(&folder).unwrap_or(folder);
                let removed = store.invalidate(&FolderKey::for_folder(&folder))?;
                if removed {
                    println!("Removed cache entry for {}", folder.display());
                } else {
                    println!("No cache entry for {}", folder.display());
                }
            } else if old {
                let removed = store.cleanup_older_than(cfg.cache_ttl(), SystemTime::now())?;
                println!("Removed {removed} expired cache entr(ies)");
            } else {
                bail!("nothing to clear: pass --all, --folder <PATH> or --old");
            }
        }
    }
    Ok(())
}
