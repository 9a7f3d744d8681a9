//! In-memory packet extractor: canned raw requests per capture file name.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use capcat_core::extract::{ExtractError, PacketExtractor, RawRequest};
use capcat_core::pairing::FilePair;

#[derive(Default)]
pub struct FakeExtractor {
    by_file: HashMap<String, Vec<RawRequest>>,
    calls: Arc<AtomicUsize>,
}

impl FakeExtractor {
    pub fn with_file(mut self, name: &str, requests: Vec<RawRequest>) -> Self {
        self.by_file.insert(name.to_string(), requests);
        self
    }

    /// Shared counter of `extract` calls, readable after the extractor moved.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl PacketExtractor for FakeExtractor {
    fn extract(
        &self,
        pair: &FilePair,
    ) -> impl Future<Output = Result<Vec<RawRequest>, ExtractError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = pair
            .capture
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let requests = self.by_file.get(&name).cloned().unwrap_or_default();
        async move { Ok(requests) }
    }
}

pub fn request(method: &str, host: &str, uri: &str, headers: &[(&str, &str)], body: &str) -> RawRequest {
    RawRequest {
        method: Some(method.to_string()),
        uri: uri.to_string(),
        host: Some(host.to_string()),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: body.to_string(),
        ..RawRequest::default()
    }
}
