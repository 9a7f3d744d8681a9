//! Merge of per-file results and signature-based deduplication.

use std::collections::{BTreeMap, HashSet};

use crate::catalog::RequestCatalog;
use crate::record::CaptureRecord;
use crate::signature::signature;

/// Result of deduplicating a merged catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    pub catalog: RequestCatalog,
    /// Hosts that lost at least one duplicate, with the number removed.
    pub removed_by_host: BTreeMap<String, usize>,
    pub total_removed: usize,
}

/// Concatenates per-file record lists in capture order into one catalog.
pub fn merge<'a, I>(per_file: I) -> RequestCatalog
where
    I: IntoIterator<Item = &'a [CaptureRecord]>,
{
    per_file
        .into_iter()
        .flat_map(|records| records.iter().cloned())
        .collect()
}

/// Keeps, per host, the first record of every signature, preserving order.
///
/// Idempotent: deduplicating the output again removes nothing.
pub fn deduplicate(merged: RequestCatalog) -> DedupOutcome {
    let mut kept_hosts: BTreeMap<String, Vec<CaptureRecord>> = BTreeMap::new();
    let mut removed_by_host = BTreeMap::new();
    let mut total_before = 0usize;
    let mut total_removed = 0usize;

    for (host, records) in merged.into_hosts() {
        let before = records.len();
        total_before += before;

        let mut seen = HashSet::with_capacity(before);
        let kept: Vec<CaptureRecord> = records
            .into_iter()
            .filter(|r| seen.insert(signature(r)))
            .collect();

        let removed = before - kept.len();
        if removed > 0 {
            tracing::info!(
                "{}: removed {} duplicate(s) ({} -> {})",
                host,
                removed,
                before,
                kept.len()
            );
            removed_by_host.insert(host.clone(), removed);
            total_removed += removed;
        }
        kept_hosts.insert(host, kept);
    }

    if total_removed > 0 {
        tracing::info!(
            "total duplicates removed: {} ({} -> {})",
            total_removed,
            total_before,
            total_before - total_removed
        );
    }

    DedupOutcome {
        catalog: RequestCatalog::from_hosts(kept_hosts),
        removed_by_host,
        total_removed,
    }
}
