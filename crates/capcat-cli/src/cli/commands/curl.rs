//! `capcat curl <host> <index>` – print a curl command for a request.

use anyhow::{Context, Result};
use capcat_core::config::CapcatConfig;
use capcat_core::replay::ReplayRequest;

use super::load_session;

pub fn run_curl(cfg: &CapcatConfig, host: &str, index: usize) -> Result<()> {
    let session = load_session(cfg)?;
    let record = session
        .request(host, index)
        .with_context(|| format!("no request #{index} for host {host}"))?;
    let request = ReplayRequest::from_record(record, session.host_state(host));
    println!("{}", request.curl_command());
    Ok(())
}
