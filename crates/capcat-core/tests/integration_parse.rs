//! Integration test: parse a folder end to end with an in-memory extractor,
//! a real cache directory and a persisted session.

mod common;

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::time::{Duration, SystemTime};

use capcat_core::cache::{CacheStore, FolderKey, JsonCacheStore};
use capcat_core::config::CapcatConfig;
use capcat_core::filter::AnalyticsFilter;
use capcat_core::host_state::HostStateUpdate;
use capcat_core::pipeline::Pipeline;
use capcat_core::session::{Session, SharedSession};
use tempfile::tempdir;

use common::fake_extractor::{request, FakeExtractor};

const HOST: &str = "api.example.com";

fn extractor() -> FakeExtractor {
    let auth = ("Authorization", "Bearer token-1");
    FakeExtractor::default()
        .with_file(
            "session1.pcap",
            vec![
                request("GET", HOST, "/v1/items?page=2&sort=asc", &[auth], ""),
                request("GET", HOST, "/v1/items?sort=asc&page=2", &[auth], ""),
                request(
                    "POST",
                    HOST,
                    "/v1/items",
                    &[auth, ("Content-Type", "application/json")],
                    r#"{"b":2,"a":1}"#,
                ),
                request("GET", "www.google-analytics.com", "/collect", &[], ""),
                request("GET", HOST, "/v1/items", &[], ""),
            ],
        )
        .with_file(
            "session2.pcap",
            vec![
                request("GET", HOST, "/v1/items?page=2&sort=asc", &[auth], ""),
                request(
                    "POST",
                    HOST,
                    "/v1/items",
                    &[auth, ("Content-Type", "application/json")],
                    r#"{"a": 1, "b": 2}"#,
                ),
                request("GET", HOST, "/v1/profile", &[auth, ("Cookie", "sid=7")], ""),
            ],
        )
}

#[tokio::test]
async fn parse_dedups_caches_and_persists() {
    let src = tempdir().unwrap();
    for f in ["session1.pcap", "session2.pcap", "session1.log", "session2.log"] {
        std::fs::write(src.path().join(f), b"x").unwrap();
    }
    let cache_dir = tempdir().unwrap();
    let state_dir = tempdir().unwrap();

    let ex = extractor();
    let calls = ex.calls();
    let pipeline = Pipeline::new(
        ex,
        JsonCacheStore::new(cache_dir.path()),
        AnalyticsFilter::builtin().unwrap(),
        &CapcatConfig::default(),
    );
    let shared = SharedSession::default();

    let summary = pipeline.parse_folder(src.path(), &shared, false).await.unwrap();
    assert_eq!(summary.files, 2);
    assert_eq!(summary.counts.filtered, 1);
    assert_eq!(summary.total_requests, 7);
    // GET (x3 same signature), POST (x2 equivalent JSON), unauthenticated GET, profile GET
    assert_eq!(summary.unique_requests, 4);
    assert_eq!(summary.duplicates_removed, 3);
    assert_eq!(summary.removed_by_host[HOST], 3);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let session = shared.snapshot();
    let pairs: Vec<_> = session
        .pairs
        .iter()
        .map(|p| {
            (
                p.capture.file_name().unwrap().to_string_lossy().into_owned(),
                p.key.file_name().unwrap().to_string_lossy().into_owned(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("session1.pcap".to_string(), "session1.log".to_string()),
            ("session2.pcap".to_string(), "session2.log".to_string()),
        ]
    );
    let state = session.host_state(HOST).unwrap();
    assert_eq!(state.authorization(), Some("Bearer token-1"));
    assert_eq!(state.stable_cookie.as_deref(), Some("sid=7"));

    let folder = std::fs::canonicalize(src.path()).unwrap();
    let store = JsonCacheStore::new(cache_dir.path());
    assert!(store.get(&FolderKey::for_folder(&folder)).is_some());

    // Second run is served from the cache without touching the extractor.
    let again = pipeline.parse_folder(src.path(), &shared, false).await.unwrap();
    assert!(again.from_cache);
    assert_eq!(again.unique_requests, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Overrides are saved with the session and survive a reload and reparse.
    let update = HostStateUpdate {
        headers: BTreeMap::from([("authorization".to_string(), "Bearer manual".to_string())]),
        cookie: None,
    };
    shared.update_host_state(HOST, update).await.unwrap();
    let path = state_dir.path().join("session.json");
    let now = SystemTime::now();
    shared.snapshot().save_to_path(&path, now).unwrap();

    let ttl = Duration::from_secs(7 * 86_400);
    let reloaded = Session::load_from_path(&path, ttl, now).unwrap().unwrap();
    let shared = SharedSession::new(reloaded);
    pipeline.parse_folder(src.path(), &shared, true).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(
        shared.snapshot().host_state(HOST).unwrap().authorization(),
        Some("Bearer manual")
    );
}

#[tokio::test]
async fn touching_a_key_file_invalidates_the_cache() {
    let src = tempdir().unwrap();
    for f in ["session1.pcap", "session1.log"] {
        std::fs::write(src.path().join(f), b"x").unwrap();
    }
    let cache_dir = tempdir().unwrap();
    let ex = extractor();
    let calls = ex.calls();
    let pipeline = Pipeline::new(
        ex,
        JsonCacheStore::new(cache_dir.path()),
        AnalyticsFilter::builtin().unwrap(),
        &CapcatConfig::default(),
    );
    let shared = SharedSession::default();

    pipeline.parse_folder(src.path(), &shared, false).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let key = std::fs::File::options()
        .write(true)
        .open(src.path().join("session1.log"))
        .unwrap();
    key.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
    drop(key);

    let summary = pipeline.parse_folder(src.path(), &shared, false).await.unwrap();
    assert!(!summary.from_cache);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
