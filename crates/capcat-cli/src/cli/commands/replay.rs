//! `capcat replay <host> <index>` – send a request again.

use anyhow::{Context, Result};
use capcat_core::config::CapcatConfig;
use capcat_core::replay::{CurlRunner, ReplayRequest, RequestRunner};

use super::load_session;

pub async fn run_replay(cfg: &CapcatConfig, host: &str, index: usize) -> Result<()> {
    let session = load_session(cfg)?;
    let record = session
        .request(host, index)
        .with_context(|| format!("no request #{index} for host {host}"))?;
    let request = ReplayRequest::from_record(record, session.host_state(host));

    tracing::info!("replaying {} {}", request.method, request.url);
    let response = CurlRunner::from_config(cfg).run(&request).await?;

    println!("HTTP {}", response.status);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    println!();
    println!("{}", response.body.trim());
    Ok(())
}
