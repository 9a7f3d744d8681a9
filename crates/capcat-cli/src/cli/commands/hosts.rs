//! `capcat hosts` – hosts in the session with request counts.

use anyhow::Result;
use capcat_core::config::CapcatConfig;

use super::load_session;

fn flag(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "-"
    }
}

pub fn run_hosts(cfg: &CapcatConfig) -> Result<()> {
    let hosts = load_session(cfg)?.hosts();
    if hosts.is_empty() {
        println!("No hosts in session.");
        return Ok(());
    }
    println!("{:<6} {:<5} {:<7} {}", "COUNT", "AUTH", "COOKIE", "HOST");
    for h in hosts {
        println!(
            "{:<6} {:<5} {:<7} {}",
            h.count,
            flag(h.has_auth),
            flag(h.has_cookie),
            h.host
        );
    }
    Ok(())
}
