//! `capcat parse <folder> [--force]` – run the parse pipeline and save the session.

use anyhow::Result;
use capcat_core::config::CapcatConfig;
use capcat_core::pipeline::Pipeline;
use capcat_core::session::SharedSession;
use std::path::Path;

use super::session::{lock_session, save_locked};

pub async fn run_parse(cfg: &CapcatConfig, folder: &Path, force: bool) -> Result<()> {
    let pipeline = Pipeline::from_config(cfg)?;
    let (lock, saved) = lock_session(cfg).await?;
    let shared = SharedSession::new(saved);

    let summary = pipeline.parse_folder(folder, &shared, force).await?;
    save_locked(&lock, &shared.snapshot())?;
    drop(lock);

    let source = if summary.from_cache { " (cached)" } else { "" };
    println!("Parsed {} capture file(s){source}", summary.files);
    println!(
        "Requests: {} total, {} unique, {} duplicate(s) removed",
        summary.total_requests, summary.unique_requests, summary.duplicates_removed
    );
    println!(
        "Skipped: {} analytics, {} incomplete",
        summary.counts.filtered, summary.counts.dropped
    );
    println!("Hosts: {}", summary.hosts);
    for (host, removed) in &summary.removed_by_host {
        println!("  {host}: {removed} duplicate(s)");
    }
    for failure in &summary.failed {
        println!("FAILED {}: {}", failure.capture.display(), failure.message);
    }
    Ok(())
}
