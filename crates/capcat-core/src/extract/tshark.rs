//! Packet extraction through an external `tshark` process.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::layers::{requested_fields, requests_from_tshark_json};
use super::{ExtractError, PacketExtractor, RawRequest};
use crate::config::CapcatConfig;
use crate::pairing::FilePair;

const DISPLAY_FILTER: &str = "http.request or http2.headers.method";

/// Runs `tshark` with the pair's key-log file and decodes its JSON output.
/// The child is killed when the timeout elapses.
#[derive(Debug, Clone)]
pub struct TsharkExtractor {
    program: PathBuf,
    timeout: Duration,
}

impl TsharkExtractor {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &CapcatConfig) -> Self {
        Self::new(&cfg.tshark_path, cfg.extraction_timeout())
    }

    fn command(&self, pair: &FilePair) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-r")
            .arg(&pair.capture)
            .arg("-o")
            .arg(format!("tls.keylog_file:{}", pair.key.display()))
            .arg("-Y")
            .arg(DISPLAY_FILTER)
            .arg("-T")
            .arg("json");
        for field in requested_fields() {
            cmd.arg("-e").arg(field);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl PacketExtractor for TsharkExtractor {
    fn extract(
        &self,
        pair: &FilePair,
    ) -> impl Future<Output = Result<Vec<RawRequest>, ExtractError>> + Send {
        let mut cmd = self.command(pair);
        let timeout = self.timeout;
        async move {
            let output = match tokio::time::timeout(timeout, cmd.output()).await {
                Ok(result) => result.map_err(ExtractError::Spawn)?,
                Err(_) => return Err(ExtractError::Timeout(timeout)),
            };

            let stdout = String::from_utf8_lossy(&output.stdout);
            if stdout.trim().is_empty() {
                if output.status.success() {
                    return Ok(Vec::new());
                }
                return Err(ExtractError::Failed {
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
            if !output.status.success() {
                tracing::debug!(status = %output.status, "tshark exited non-zero; using its output");
            }
            Ok(requests_from_tshark_json(stdout.as_bytes())?)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_tshark(dir: &std::path::Path, script: &str) -> PathBuf {
        let path = dir.join("fake-tshark");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn pair() -> FilePair {
        FilePair {
            capture: PathBuf::from("/tmp/a.pcap"),
            key: PathBuf::from("/tmp/a.log"),
        }
    }

    #[tokio::test]
    async fn parses_stdout_of_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_tshark(
            dir.path(),
            r#"echo '[{"_source":{"layers":{"http.request.method":["GET"],"http.host":["h"],"http.request.uri":["/x"]}}}]'"#,
        );
        let ex = TsharkExtractor::new(program, Duration::from_secs(10));
        let reqs = ex.extract(&pair()).await.unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].uri, "/x");
    }

    #[tokio::test]
    async fn empty_output_on_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_tshark(dir.path(), "echo 'bad capture' >&2; exit 2");
        let ex = TsharkExtractor::new(program, Duration::from_secs(10));
        match ex.extract(&pair()).await {
            Err(ExtractError::Failed { stderr, .. }) => assert_eq!(stderr, "bad capture"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_extractor_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_tshark(dir.path(), "sleep 5");
        let ex = TsharkExtractor::new(program, Duration::from_millis(200));
        assert!(matches!(ex.extract(&pair()).await, Err(ExtractError::Timeout(_))));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let ex = TsharkExtractor::new("/nonexistent/tshark", Duration::from_secs(1));
        assert!(matches!(ex.extract(&pair()).await, Err(ExtractError::Spawn(_))));
    }
}
