//! Per-host stable credential snapshots used to seed replay.
//!
//! Derivation fills a field only while it is absent, so the first qualifying
//! value sticks. Caller updates are merged into the same fields and are
//! therefore never overwritten by later derivations.

mod derive;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{canonical_header_name, HeaderMap};

/// Stable auth/cookie snapshot for one host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostState {
    /// Headers to send on replay, keyed by canonical name.
    #[serde(default)]
    pub stable_headers: HeaderMap,
    #[serde(default)]
    pub stable_cookie: Option<String>,
}

/// Fields a caller wants merged into a host's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStateUpdate {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub cookie: Option<String>,
}

impl HostState {
    /// Merges `update` in: each given header replaces that header only; a
    /// given cookie replaces the cookie. Untouched fields are kept.
    pub fn merge(&mut self, update: HostStateUpdate) {
        for (name, value) in update.headers {
            let key = canonical_header_name(&name);
            if !key.is_empty() {
                self.stable_headers.insert(key, value);
            }
        }
        if let Some(cookie) = update.cookie {
            self.stable_cookie = Some(cookie);
        }
    }

    pub fn authorization(&self) -> Option<&str> {
        self.stable_headers.get("Authorization").map(String::as_str)
    }
}

/// Host states for every host seen so far. Survives catalog rebuilds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStateTable {
    hosts: BTreeMap<String, HostState>,
}

impl HostStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, host: &str) -> Option<&HostState> {
        self.hosts.get(host)
    }

    /// Merges caller-supplied fields into `host`'s entry, creating it if needed.
    pub fn update(&mut self, host: &str, update: HostStateUpdate) {
        self.hosts.entry(host.to_string()).or_default().merge(update);
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostState)> {
        self.hosts.iter().map(|(h, s)| (h.as_str(), s))
    }

    fn entry(&mut self, host: &str) -> &mut HostState {
        self.hosts.entry(host.to_string()).or_default()
    }
}
