//! Folder parse: discover, pair, extract (or reuse the cache), merge,
//! deduplicate, derive host state and commit the session.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::cache::{
    check_freshness, current_mtimes, CacheEntry, CacheStore, FileRecords, FolderKey, FsMtimes,
    JsonCacheStore,
};
use crate::config::CapcatConfig;
use crate::dedup::{deduplicate, merge};
use crate::extract::{normalize_all, ExtractError, PacketExtractor, SkipCounts, TsharkExtractor};
use crate::filter::{AnalyticsFilter, FilterPatternSets};
use crate::pairing::{discover, pair_files, FilePair};
use crate::session::{Session, SharedSession};

/// A capture file that yielded no records because extraction failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub capture: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseSummary {
    pub folder: PathBuf,
    pub files: usize,
    /// Records kept after filtering, before deduplication.
    pub total_requests: usize,
    pub unique_requests: usize,
    pub hosts: usize,
    pub duplicates_removed: usize,
    pub removed_by_host: BTreeMap<String, usize>,
    pub from_cache: bool,
    pub failed: Vec<FileFailure>,
    pub counts: SkipCounts,
}

pub struct Pipeline<E, S> {
    extractor: Arc<E>,
    store: Arc<S>,
    filter: Arc<AnalyticsFilter>,
    workers: usize,
    extraction_timeout: Duration,
    cache_ttl: Duration,
}

impl Pipeline<TsharkExtractor, JsonCacheStore> {
    /// tshark extraction, the default cache directory and the configured filter.
    pub fn from_config(cfg: &CapcatConfig) -> Result<Self> {
        let filter = AnalyticsFilter::new(&FilterPatternSets::from_config(&cfg.filter))
            .context("build analytics filter")?;
        Ok(Self::new(
            TsharkExtractor::from_config(cfg),
            JsonCacheStore::open_default()?,
            filter,
            cfg,
        ))
    }
}

impl<E: PacketExtractor, S: CacheStore + 'static> Pipeline<E, S> {
    pub fn new(extractor: E, store: S, filter: AnalyticsFilter, cfg: &CapcatConfig) -> Self {
        Self {
            extractor: Arc::new(extractor),
            store: Arc::new(store),
            filter: Arc::new(filter),
            workers: cfg.workers.max(1),
            extraction_timeout: cfg.extraction_timeout(),
            cache_ttl: cfg.cache_ttl(),
        }
    }

    pub fn store(&self) -> &S {
        self.store.as_ref()
    }

    /// Parses every capture in `folder` and commits the result to `session`.
    ///
    /// Holds the session writer lock for the whole run. Folder scans and cache
    /// reads and writes run on the blocking pool. Per-file extraction failures
    /// are reported in the summary; the run itself only fails when the folder
    /// cannot be read or holds no capture files.
    pub async fn parse_folder(
        &self,
        folder: &Path,
        session: &SharedSession,
        force: bool,
    ) -> Result<ParseSummary> {
        let writer = session.write().await;

        let folder = tokio::fs::canonicalize(folder)
            .await
            .with_context(|| format!("resolve folder: {}", folder.display()))?;
        let found = {
            let folder = folder.clone();
            tokio::task::spawn_blocking(move || discover(&folder))
                .await
                .context("folder scan task")??
        };
        if found.captures.is_empty() {
            bail!("no capture files in {}", folder.display());
        }
        let pairs = pair_files(&found.captures, &found.keys);
        if pairs.is_empty() {
            tracing::warn!(
                "no key files in {}; {} capture file(s) left unparsed",
                folder.display(),
                found.captures.len()
            );
        }

        let key = FolderKey::for_folder(&folder);
        let cached = if force || pairs.is_empty() {
            None
        } else {
            self.cached_files(&key, &pairs).await
        };
        let from_cache = cached.is_some();

        let (files, failed) = match cached {
            Some(files) => {
                tracing::info!("using cached parse of {} ({key})", folder.display());
                (files, Vec::new())
            }
            None => {
                let (files, failed) = self.extract_all(&pairs).await;
                if failed.is_empty() && !pairs.is_empty() {
                    if let Err(e) = self.store_entry(&key, &folder, &pairs, &files).await {
                        tracing::warn!("failed to write parse cache: {e:#}");
                    }
                }
                (files, failed)
            }
        };

        let mut counts = SkipCounts::default();
        for f in &files {
            counts.absorb(f.counts);
        }

        let merged = merge(files.iter().map(|f| f.records.as_slice()));
        let total_requests = merged.request_count();
        let outcome = deduplicate(merged);

        let mut host_state = writer.current().host_state.clone();
        host_state.derive_from(&outcome.catalog);

        let summary = ParseSummary {
            folder: folder.clone(),
            files: pairs.len(),
            total_requests,
            unique_requests: outcome.catalog.request_count(),
            hosts: outcome.catalog.host_count(),
            duplicates_removed: outcome.total_removed,
            removed_by_host: outcome.removed_by_host,
            from_cache,
            failed,
            counts,
        };
        tracing::info!(
            "parsed {}: {} file(s), {} request(s), {} unique, {} host(s)",
            folder.display(),
            summary.files,
            summary.total_requests,
            summary.unique_requests,
            summary.hosts
        );

        writer.commit(Session {
            folder: Some(folder),
            pairs,
            catalog: outcome.catalog,
            host_state,
        });
        Ok(summary)
    }

    /// Per-file results from a fresh cache entry, in `pairs` order.
    async fn cached_files(&self, key: &FolderKey, pairs: &[FilePair]) -> Option<Vec<FileRecords>> {
        let store = Arc::clone(&self.store);
        let key = key.clone();
        let pairs = pairs.to_vec();
        let ttl = self.cache_ttl;
        match tokio::task::spawn_blocking(move || fresh_files(&*store, &key, &pairs, ttl)).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("cache lookup task: {e}");
                None
            }
        }
    }

    async fn store_entry(
        &self,
        key: &FolderKey,
        folder: &Path,
        pairs: &[FilePair],
        files: &[FileRecords],
    ) -> Result<()> {
        let store = Arc::clone(&self.store);
        let key = key.clone();
        let folder = folder.to_path_buf();
        let pairs = pairs.to_vec();
        let files = files.to_vec();
        tokio::task::spawn_blocking(move || {
            let mtimes = current_mtimes(&pairs, &FsMtimes)?;
            let entry = CacheEntry {
                folder,
                pairs,
                files,
                mtimes,
                written_at: SystemTime::now(),
            };
            store.put(&key, &entry)
        })
        .await
        .context("cache write task")?
    }

    /// Extracts every pair with at most `workers` in flight and waits for all
    /// of them. Output is in `pairs` order; a failed file contributes an
    /// empty record list plus a [`FileFailure`].
    async fn extract_all(&self, pairs: &[FilePair]) -> (Vec<FileRecords>, Vec<FileFailure>) {
        tracing::info!(
            "extracting {} capture file(s) with up to {} worker(s)",
            pairs.len(),
            self.workers
        );
        let mut slots: Vec<Option<Result<FileRecords, String>>> = vec![None; pairs.len()];
        let mut queue = pairs.iter().cloned().enumerate();
        let mut join_set = tokio::task::JoinSet::new();

        loop {
            while join_set.len() < self.workers {
                let Some((index, pair)) = queue.next() else {
                    break;
                };
                let extractor = Arc::clone(&self.extractor);
                let filter = Arc::clone(&self.filter);
                let timeout = self.extraction_timeout;
                join_set.spawn(async move {
                    let result = extract_one(&*extractor, &filter, &pair, timeout).await;
                    (index, result)
                });
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("extraction task join: {e}"),
            }
        }

        let mut files = Vec::with_capacity(pairs.len());
        let mut failed = Vec::new();
        for (pair, slot) in pairs.iter().zip(slots) {
            match slot {
                Some(Ok(records)) => files.push(records),
                other => {
                    let message = match other {
                        Some(Err(msg)) => msg,
                        _ => "extraction task aborted".to_string(),
                    };
                    tracing::warn!("{}: {message}", pair.capture.display());
                    failed.push(FileFailure {
                        capture: pair.capture.clone(),
                        message,
                    });
                    files.push(FileRecords {
                        capture: pair.capture.clone(),
                        ..FileRecords::default()
                    });
                }
            }
        }
        (files, failed)
    }
}

fn fresh_files<S: CacheStore>(
    store: &S,
    key: &FolderKey,
    pairs: &[FilePair],
    ttl: Duration,
) -> Option<Vec<FileRecords>> {
    let entry = store.get(key)?;
    if let Err(reason) = check_freshness(&entry, pairs, ttl, SystemTime::now(), &FsMtimes) {
        tracing::debug!("cache entry {key} is stale: {reason}");
        return None;
    }
    let mut by_capture: HashMap<PathBuf, FileRecords> = entry
        .files
        .into_iter()
        .map(|f| (f.capture.clone(), f))
        .collect();
    pairs.iter().map(|p| by_capture.remove(&p.capture)).collect()
}

async fn extract_one<E: PacketExtractor>(
    extractor: &E,
    filter: &AnalyticsFilter,
    pair: &FilePair,
    timeout: Duration,
) -> Result<FileRecords, String> {
    let raws = match tokio::time::timeout(timeout, extractor.extract(pair)).await {
        Ok(Ok(raws)) => raws,
        Ok(Err(e)) => return Err(e.to_string()),
        Err(_) => return Err(ExtractError::Timeout(timeout).to_string()),
    };
    let source = pair
        .capture
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (records, counts) = normalize_all(raws, &source, filter);
    tracing::debug!(
        "{source}: kept {}, filtered {}, dropped {}",
        counts.kept,
        counts.filtered,
        counts.dropped
    );
    Ok(FileRecords {
        capture: pair.capture.clone(),
        records,
        counts,
    })
}
