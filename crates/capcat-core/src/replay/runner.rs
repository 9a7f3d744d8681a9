//! Live request execution.

use std::future::Future;
use std::str;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::ReplayRequest;
use crate::config::CapcatConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayResponse {
    pub status: u32,
    /// Header lines of the final response, in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(#[source] curl::Error),
    #[error("replay task failed: {0}")]
    Task(String),
}

/// Executes a replay request. Failures are returned, never retried.
pub trait RequestRunner: Send + Sync {
    fn run(
        &self,
        request: &ReplayRequest,
    ) -> impl Future<Output = Result<ReplayResponse, ReplayError>> + Send;
}

/// libcurl-backed runner. TLS verification is off: captured hosts often use
/// interception certificates.
#[derive(Debug, Clone)]
pub struct CurlRunner {
    timeout: Duration,
}

impl CurlRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(cfg: &CapcatConfig) -> Self {
        Self::new(cfg.replay_timeout())
    }
}

impl RequestRunner for CurlRunner {
    fn run(
        &self,
        request: &ReplayRequest,
    ) -> impl Future<Output = Result<ReplayResponse, ReplayError>> + Send {
        let request = request.clone();
        let timeout = self.timeout;
        async move {
            tokio::task::spawn_blocking(move || perform(&request, timeout))
                .await
                .map_err(|e| ReplayError::Task(e.to_string()))?
        }
    }
}

/// Blocking transfer; run from `spawn_blocking` in async code.
fn perform(request: &ReplayRequest, timeout: Duration) -> Result<ReplayResponse, ReplayError> {
    let to_err = |e: curl::Error| {
        if e.is_operation_timedout() {
            ReplayError::Timeout(timeout)
        } else {
            ReplayError::Transport(e)
        }
    };

    let mut easy = curl::easy::Easy::new();
    easy.url(&request.url).map_err(to_err)?;
    easy.custom_request(&request.method).map_err(to_err)?;
    if request.method == "HEAD" {
        easy.nobody(true).map_err(to_err)?;
    }
    easy.ssl_verify_peer(false).map_err(to_err)?;
    easy.ssl_verify_host(false).map_err(to_err)?;
    easy.timeout(timeout).map_err(to_err)?;

    let mut list = curl::easy::List::new();
    for (name, value) in request.sendable_headers() {
        list.append(&format!("{name}: {value}")).map_err(to_err)?;
    }
    easy.http_headers(list).map_err(to_err)?;
    if !request.body.is_empty() {
        easy.post_fields_copy(request.body.as_bytes()).map_err(to_err)?;
    }

    let mut header_lines: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(to_err)?;
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(to_err)?;
        transfer.perform().map_err(to_err)?;
    }

    let status = easy.response_code().map_err(to_err)?;
    tracing::debug!("{} {} -> {}", request.method, request.url, status);
    Ok(ReplayResponse {
        status,
        headers: parse_header_lines(&header_lines),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Name/value pairs of the last response block (interim `100 Continue`
/// blocks are discarded).
fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if !name.is_empty() {
                headers.push((name.to_string(), value.trim().to_string()));
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HeaderMap;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_lines_keep_final_block_only() {
        let parsed = parse_header_lines(&lines(&[
            "HTTP/1.1 100 Continue",
            "",
            "HTTP/1.1 201 Created",
            "Content-Type: application/json",
            "Set-Cookie: a=1",
            "Set-Cookie: b=2",
            "",
        ]));
        assert_eq!(
            parsed,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Set-Cookie".to_string(), "a=1".to_string()),
                ("Set-Cookie".to_string(), "b=2".to_string()),
            ]
        );
    }

    #[test]
    fn header_values_may_contain_colons() {
        let parsed = parse_header_lines(&lines(&["HTTP/2 200", "Location: https://h/x"]));
        assert_eq!(parsed, vec![("Location".to_string(), "https://h/x".to_string())]);
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error_not_a_panic() {
        let runner = CurlRunner::new(Duration::from_secs(5));
        let request = ReplayRequest {
            method: "GET".into(),
            url: "http://127.0.0.1:1/".into(),
            headers: HeaderMap::new(),
            body: String::new(),
        };
        let err = runner.run(&request).await.unwrap_err();
        assert!(matches!(err, ReplayError::Transport(_)));
    }
}
