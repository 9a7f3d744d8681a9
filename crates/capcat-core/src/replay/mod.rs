//! Replay of captured requests: a copy-pasteable curl line, or a live run
//! through a [`RequestRunner`].

mod runner;

pub use runner::{CurlRunner, ReplayError, ReplayResponse, RequestRunner};

use serde::Serialize;

use crate::host_state::HostState;
use crate::record::{insert_header_first_wins, CaptureRecord, HeaderMap};

/// Headers never forwarded on replay; the client recomputes them.
const SKIPPED_HEADERS: [&str; 3] = ["Host", "Content-Length", "Transfer-Encoding"];

/// A fully formed request ready to be sent again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRequest {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl ReplayRequest {
    /// Builds the request from a captured record. The host's stable headers
    /// and cookie, when given, replace the captured values.
    pub fn from_record(record: &CaptureRecord, state: Option<&HostState>) -> Self {
        let mut headers = record.headers.clone();
        if let Some(state) = state {
            for (name, value) in &state.stable_headers {
                headers.remove(name);
                insert_header_first_wins(&mut headers, name, value);
            }
            if let Some(cookie) = &state.stable_cookie {
                headers.insert("Cookie".to_string(), cookie.clone());
            }
        }
        Self {
            method: record.method.to_ascii_uppercase(),
            url: record.full_url.clone(),
            headers,
            body: record.body.clone(),
        }
    }

    /// Headers actually sent: non-empty values, minus the skipped ones.
    pub fn sendable_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter(|(name, value)| {
                !value.is_empty()
                    && !SKIPPED_HEADERS
                        .iter()
                        .any(|s| s.eq_ignore_ascii_case(name))
            })
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// `curl -k -X METHOD -H 'Name: value' ... -d BODY URL`, shell-quoted.
    pub fn curl_command(&self) -> String {
        let mut args: Vec<String> = vec!["curl".into(), "-k".into(), "-X".into(), self.method.clone()];
        for (name, value) in self.sendable_headers() {
            args.push("-H".into());
            args.push(format!("{name}: {value}"));
        }
        if !self.body.is_empty() {
            args.push("-d".into());
            args.push(self.body.clone());
        }
        args.push(self.url.clone());
        args.iter()
            .map(|a| shell_quote(a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// POSIX shell quoting: bare when only safe characters, else single-quoted.
fn shell_quote(arg: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c);
    if !arg.is_empty() && arg.chars().all(safe) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CaptureRecord {
        let mut headers = HeaderMap::new();
        for (k, v) in [
            ("Host", "api.example.com"),
            ("Content-Length", "13"),
            ("Content-Type", "application/json"),
            ("Authorization", "Bearer old"),
            ("Cookie", "sid=old"),
        ] {
            headers.insert(k.into(), v.into());
        }
        CaptureRecord {
            method: "post".into(),
            uri: "/v1/items".into(),
            host: "api.example.com".into(),
            headers,
            body: r#"{"name":"it's"}"#.into(),
            scheme: "https".into(),
            port: 443,
            full_url: "https://api.example.com/v1/items".into(),
            source_file: "a.pcap".into(),
        }
    }

    #[test]
    fn shell_quote_matches_posix_rules() {
        assert_eq!(shell_quote("curl"), "curl");
        assert_eq!(shell_quote("https://h/p?a=1"), "'https://h/p?a=1'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
    }

    #[test]
    fn host_state_replaces_captured_credentials() {
        let mut state = HostState::default();
        state
            .stable_headers
            .insert("Authorization".into(), "Bearer new".into());
        state.stable_cookie = Some("sid=new".into());

        let req = ReplayRequest::from_record(&record(), Some(&state));
        assert_eq!(req.method, "POST");
        assert_eq!(req.headers["Authorization"], "Bearer new");
        assert_eq!(req.headers["Cookie"], "sid=new");

        let plain = ReplayRequest::from_record(&record(), None);
        assert_eq!(plain.headers["Authorization"], "Bearer old");
    }

    #[test]
    fn curl_command_skips_transport_headers() {
        let req = ReplayRequest::from_record(&record(), None);
        let cmd = req.curl_command();
        assert_eq!(
            cmd,
            concat!(
                "curl -k -X POST ",
                "-H 'Authorization: Bearer old' ",
                "-H 'Content-Type: application/json' ",
                "-H 'Cookie: sid=old' ",
                r#"-d '{"name":"it'"'"'s"}' "#,
                "https://api.example.com/v1/items"
            )
        );
    }

    #[test]
    fn curl_command_without_body() {
        let mut rec = record();
        rec.method = "GET".into();
        rec.body.clear();
        rec.headers.clear();
        let cmd = ReplayRequest::from_record(&rec, None).curl_command();
        assert_eq!(cmd, "curl -k -X GET https://api.example.com/v1/items");
    }
}
