//! Host-keyed request catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::CaptureRecord;

/// Requests grouped by host. Within a host, records keep first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCatalog {
    hosts: BTreeMap<String, Vec<CaptureRecord>>,
}

/// Per-host listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSummary {
    pub host: String,
    pub count: usize,
    pub has_auth: bool,
    pub has_cookie: bool,
}

impl RequestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to its host's sequence.
    pub fn push(&mut self, record: CaptureRecord) {
        self.hosts
            .entry(record.host.clone())
            .or_default()
            .push(record);
    }

    pub fn requests(&self, host: &str) -> Option<&[CaptureRecord]> {
        self.hosts.get(host).map(Vec::as_slice)
    }

    /// Hosts in sorted order with their records.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CaptureRecord])> {
        self.hosts.iter().map(|(h, r)| (h.as_str(), r.as_slice()))
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn request_count(&self) -> usize {
        self.hosts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn summaries(&self) -> Vec<HostSummary> {
        self.iter()
            .map(|(host, reqs)| HostSummary {
                host: host.to_string(),
                count: reqs.len(),
                has_auth: reqs.iter().any(|r| r.has_header("Authorization")),
                has_cookie: reqs.iter().any(|r| r.has_header("Cookie")),
            })
            .collect()
    }

    pub(crate) fn into_hosts(self) -> BTreeMap<String, Vec<CaptureRecord>> {
        self.hosts
    }

    pub(crate) fn from_hosts(hosts: BTreeMap<String, Vec<CaptureRecord>>) -> Self {
        Self { hosts }
    }
}

impl FromIterator<CaptureRecord> for RequestCatalog {
    fn from_iter<I: IntoIterator<Item = CaptureRecord>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for record in iter {
            catalog.push(record);
        }
        catalog
    }
}
