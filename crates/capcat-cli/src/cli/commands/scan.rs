//! `capcat scan <folder>` – show discovered files and their pairing.

use anyhow::Result;
use capcat_core::pairing::{discover, pair_files};
use std::path::Path;

fn name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn run_scan(folder: &Path) -> Result<()> {
    let found = discover(folder)?;
    println!(
        "{} capture file(s), {} key file(s) in {}",
        found.captures.len(),
        found.keys.len(),
        folder.display()
    );
    if found.keys.is_empty() {
        println!("No key files: captures cannot be decrypted.");
        return Ok(());
    }
    for pair in pair_files(&found.captures, &found.keys) {
        println!("{:<40} -> {}", name(&pair.capture), name(&pair.key));
    }
    Ok(())
}
