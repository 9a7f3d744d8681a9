//! Derivation of host state from a deduplicated catalog.

use crate::catalog::RequestCatalog;

use super::HostStateTable;

impl HostStateTable {
    /// Scans every host's records in order and fills `Authorization` and the
    /// cookie from the first non-empty values seen, leaving already-set
    /// fields untouched.
    pub fn derive_from(&mut self, catalog: &RequestCatalog) {
        for (host, records) in catalog.iter() {
            let state = self.entry(host);
            for record in records {
                if !state.stable_headers.contains_key("Authorization") {
                    if let Some(auth) = record.header("Authorization").filter(|v| !v.is_empty()) {
                        state
                            .stable_headers
                            .insert("Authorization".to_string(), auth.to_string());
                    }
                }
                if state.stable_cookie.is_none() {
                    if let Some(cookie) = record.header("Cookie").filter(|v| !v.is_empty()) {
                        state.stable_cookie = Some(cookie.to_string());
                    }
                }
            }
        }
    }
}
