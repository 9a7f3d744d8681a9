//! `capcat requests <host>` – numbered request list for one host.

use anyhow::{Context, Result};
use capcat_core::config::CapcatConfig;

use super::load_session;

pub fn run_requests(cfg: &CapcatConfig, host: &str) -> Result<()> {
    let session = load_session(cfg)?;
    let requests = session
        .requests(host)
        .with_context(|| format!("no requests for host {host}"))?;
    println!("{:<5} {:<7} {:<8} {}", "IDX", "METHOD", "BODY", "URL");
    for (i, r) in requests.iter().enumerate() {
        println!("{:<5} {:<7} {:<8} {}", i, r.method, r.body.len(), r.full_url);
    }
    Ok(())
}
