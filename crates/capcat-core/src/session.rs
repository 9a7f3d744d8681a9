//! The parsed session: pairing, deduplicated catalog and host state.
//!
//! [`Session`] is a plain owned value. [`SharedSession`] publishes the last
//! committed snapshot to readers and serializes writers (parse runs and
//! host-state updates) behind one async mutex. Across processes, a
//! [`SessionFileLock`] held from load to save serializes writers of the
//! saved file.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::cache::write_atomic;
use crate::catalog::{HostSummary, RequestCatalog};
use crate::host_state::{HostState, HostStateTable, HostStateUpdate};
use crate::pairing::FilePair;
use crate::record::CaptureRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Folder of the last parse, if any.
    pub folder: Option<PathBuf>,
    pub pairs: Vec<FilePair>,
    pub catalog: RequestCatalog,
    pub host_state: HostStateTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub folder: Option<PathBuf>,
    pub files: usize,
    pub hosts: usize,
    pub requests: usize,
    pub hosts_with_auth: usize,
    pub hosts_with_cookie: usize,
    pub hosts_with_state: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown host: {0}")]
pub struct UnknownHost(pub String);

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    saved_at: SystemTime,
    session: Session,
}

impl Session {
    pub fn hosts(&self) -> Vec<HostSummary> {
        self.catalog.summaries()
    }

    pub fn requests(&self, host: &str) -> Option<&[CaptureRecord]> {
        self.catalog.requests(host)
    }

    /// The `index`-th (0-based) request recorded for `host`.
    pub fn request(&self, host: &str, index: usize) -> Option<&CaptureRecord> {
        self.requests(host).and_then(|r| r.get(index))
    }

    pub fn host_state(&self, host: &str) -> Option<&HostState> {
        self.host_state.get(host)
    }

    pub fn knows_host(&self, host: &str) -> bool {
        self.catalog.requests(host).is_some() || self.host_state.get(host).is_some()
    }

    pub fn summary(&self) -> SessionSummary {
        let hosts = self.hosts();
        SessionSummary {
            folder: self.folder.clone(),
            files: self.pairs.len(),
            hosts: self.catalog.host_count(),
            requests: self.catalog.request_count(),
            hosts_with_auth: hosts.iter().filter(|h| h.has_auth).count(),
            hosts_with_cookie: hosts.iter().filter(|h| h.has_cookie).count(),
            hosts_with_state: self.host_state.len(),
        }
    }

    /// Default path: `~/.local/state/capcat/session.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("capcat")?;
        Ok(xdg_dirs.get_state_home().join("capcat").join("session.json"))
    }

    /// Saves the session stamped with `now`, replacing any previous file atomically.
    pub fn save_to_path(&self, path: &Path, now: SystemTime) -> Result<()> {
        let persisted = PersistedSession {
            saved_at: now,
            session: self.clone(),
        };
        let json = serde_json::to_vec_pretty(&persisted).context("serialize session")?;
        write_atomic(path, &json)
    }

    /// Loads a saved session. Missing, unreadable and expired files (older
    /// than `ttl` at `now`) all yield None.
    pub fn load_from_path(path: &Path, ttl: Duration, now: SystemTime) -> Result<Option<Session>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read session: {}", path.display())),
        };
        let persisted: PersistedSession = match serde_json::from_slice(&bytes) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("ignoring unreadable session {}: {e}", path.display());
                return Ok(None);
            }
        };
        match now.duration_since(persisted.saved_at) {
            Ok(age) if age <= ttl => Ok(Some(persisted.session)),
            _ => {
                tracing::info!("saved session {} expired", path.display());
                Ok(None)
            }
        }
    }
}

/// Exclusive advisory lock on a saved session, taken on `<session>.lock`.
///
/// Load, modify and save through the lock; a second holder blocks in
/// [`SessionFileLock::acquire`] until the first is dropped.
#[derive(Debug)]
pub struct SessionFileLock {
    file: File,
    path: PathBuf,
}

impl Drop for SessionFileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl SessionFileLock {
    pub async fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path_for(path);
        if let Some(parent) = lock_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create session dir: {}", parent.display()))?;
        }

        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)
                .with_context(|| format!("open session lock: {}", lock_path.display()))?;
            file.lock_exclusive()
                .with_context(|| format!("acquire session lock: {}", lock_path.display()))?;
            Ok(file)
        })
        .await
        .context("join session lock task")??;

        tracing::debug!(path = %path.display(), "acquired session lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, ttl: Duration, now: SystemTime) -> Result<Option<Session>> {
        Session::load_from_path(&self.path, ttl, now)
    }

    pub fn save(&self, session: &Session, now: SystemTime) -> Result<()> {
        session.save_to_path(&self.path, now)
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Single-writer, many-reader holder of the committed session.
#[derive(Debug, Default)]
pub struct SharedSession {
    committed: RwLock<Arc<Session>>,
    writer: Mutex<()>,
}

/// Exclusive write access; dropped without `commit` leaves the session unchanged.
pub struct SessionWriter<'a> {
    shared: &'a SharedSession,
    _guard: MutexGuard<'a, ()>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            committed: RwLock::new(Arc::new(session)),
            writer: Mutex::new(()),
        }
    }

    /// The last committed session. Never blocks on a running writer.
    pub fn snapshot(&self) -> Arc<Session> {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Waits for any other writer to finish.
    pub async fn write(&self) -> SessionWriter<'_> {
        let guard = self.writer.lock().await;
        SessionWriter {
            shared: self,
            _guard: guard,
        }
    }

    /// Merges `update` into `host`'s state and commits the result.
    pub async fn update_host_state(
        &self,
        host: &str,
        update: HostStateUpdate,
    ) -> Result<Arc<Session>, UnknownHost> {
        let writer = self.write().await;
        let current = writer.current();
        if !current.knows_host(host) {
            return Err(UnknownHost(host.to_string()));
        }
        let mut next = (*current).clone();
        next.host_state.update(host, update);
        Ok(writer.commit(next))
    }
}

impl SessionWriter<'_> {
    pub fn current(&self) -> Arc<Session> {
        self.shared.snapshot()
    }

    /// Publishes `session` to readers.
    pub fn commit(&self, session: Session) -> Arc<Session> {
        let next = Arc::new(session);
        *self
            .shared
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::record::HeaderMap;

    fn rec(host: &str, uri: &str) -> CaptureRecord {
        CaptureRecord {
            method: "GET".into(),
            uri: uri.into(),
            host: host.into(),
            headers: HeaderMap::new(),
            body: String::new(),
            scheme: "https".into(),
            port: 443,
            full_url: format!("https://{host}{uri}"),
            source_file: "a.pcap".into(),
        }
    }

    fn sample() -> Session {
        Session {
            folder: Some(PathBuf::from("/c")),
            catalog: [rec("api.example.com", "/a"), rec("api.example.com", "/b")]
                .into_iter()
                .collect(),
            ..Session::default()
        }
    }

    #[tokio::test]
    async fn readers_see_only_committed_snapshots() {
        let shared = SharedSession::new(sample());
        let before = shared.snapshot();

        let writer = shared.write().await;
        let mut next = (*writer.current()).clone();
        next.catalog = RequestCatalog::new();
        assert_eq!(shared.snapshot().catalog.request_count(), 2);
        writer.commit(next);
        drop(writer);

        assert_eq!(shared.snapshot().catalog.request_count(), 0);
        assert_eq!(before.catalog.request_count(), 2);
    }

    #[tokio::test]
    async fn update_host_state_merges_and_rejects_unknown_hosts() {
        let shared = SharedSession::new(sample());
        let update = HostStateUpdate {
            headers: BTreeMap::from([("x-api-key".to_string(), "k".to_string())]),
            cookie: Some("sid=9".into()),
        };
        let session = shared
            .update_host_state("api.example.com", update.clone())
            .await
            .unwrap();
        let state = session.host_state("api.example.com").unwrap();
        assert_eq!(state.stable_headers["X-Api-Key"], "k");
        assert_eq!(state.stable_cookie.as_deref(), Some("sid=9"));

        assert_eq!(
            shared.update_host_state("nowhere.test", update).await,
            Err(UnknownHost("nowhere.test".into()))
        );
    }

    #[tokio::test]
    async fn writers_are_serialized() {
        let shared = Arc::new(SharedSession::new(sample()));
        let first = shared.write().await;

        let other = Arc::clone(&shared);
        let waiting = tokio::spawn(async move {
            let _w = other.write().await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(first);
        waiting.await.unwrap();
    }

    #[test]
    fn request_lookup_and_summary() {
        let s = sample();
        assert_eq!(s.request("api.example.com", 1).map(|r| r.uri.as_str()), Some("/b"));
        assert!(s.request("api.example.com", 2).is_none());
        let summary = s.summary();
        assert_eq!(summary.hosts, 1);
        assert_eq!(summary.requests, 2);
    }

    #[test]
    fn save_and_load_respects_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let ttl = Duration::from_secs(7 * 86_400);

        assert_eq!(Session::load_from_path(&path, ttl, t0).unwrap(), None);
        sample().save_to_path(&path, t0).unwrap();
        assert_eq!(
            Session::load_from_path(&path, ttl, t0 + ttl).unwrap(),
            Some(sample())
        );
        assert_eq!(
            Session::load_from_path(&path, ttl, t0 + ttl + Duration::from_secs(1)).unwrap(),
            None
        );

        std::fs::write(&path, b"garbage").unwrap();
        assert_eq!(Session::load_from_path(&path, ttl, t0).unwrap(), None);
    }

    #[tokio::test]
    async fn locked_writers_keep_each_others_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let ttl = Duration::from_secs(7 * 86_400);
        sample().save_to_path(&path, SystemTime::now()).unwrap();

        let parse_lock = SessionFileLock::acquire(&path).await.unwrap();
        let mut reparsed = parse_lock.load(ttl, SystemTime::now()).unwrap().unwrap();

        let override_path = path.clone();
        let host_state_edit = tokio::spawn(async move {
            let lock = SessionFileLock::acquire(&override_path).await.unwrap();
            let loaded = lock.load(ttl, SystemTime::now()).unwrap().unwrap_or_default();
            let shared = SharedSession::new(loaded);
            let update = HostStateUpdate {
                cookie: Some("sid=manual".into()),
                ..HostStateUpdate::default()
            };
            let session = shared
                .update_host_state("api.example.com", update)
                .await
                .unwrap();
            lock.save(&session, SystemTime::now()).unwrap();
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!host_state_edit.is_finished());

        reparsed.catalog = [
            rec("api.example.com", "/a"),
            rec("api.example.com", "/b"),
            rec("api.example.com", "/c"),
        ]
        .into_iter()
        .collect();
        parse_lock.save(&reparsed, SystemTime::now()).unwrap();
        drop(parse_lock);
        host_state_edit.await.unwrap();

        let saved = Session::load_from_path(&path, ttl, SystemTime::now())
            .unwrap()
            .unwrap();
        assert_eq!(saved.catalog.request_count(), 3);
        assert_eq!(
            saved.host_state("api.example.com").unwrap().stable_cookie.as_deref(),
            Some("sid=manual")
        );
        assert!(dir.path().join("session.json.lock").exists());
    }
}
