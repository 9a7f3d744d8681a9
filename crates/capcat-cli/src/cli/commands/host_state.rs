//! `capcat host-state <host> [--header NAME=VALUE]... [--cookie C]`.

use anyhow::Result;
use capcat_core::config::CapcatConfig;
use capcat_core::host_state::{HostState, HostStateUpdate};
use capcat_core::session::SharedSession;

use super::session::{load_session, lock_session, save_locked};

fn print_state(host: &str, state: Option<&HostState>) {
    println!("{host}");
    let Some(state) = state else {
        println!("  (no stable state)");
        return;
    };
    for (name, value) in &state.stable_headers {
        println!("  {name}: {value}");
    }
    if let Some(cookie) = &state.stable_cookie {
        println!("  Cookie: {cookie}");
    }
}

/// Without options prints the host's state; otherwise merges the given
/// fields in and saves the session.
pub async fn run_host_state(
    cfg: &CapcatConfig,
    host: &str,
    headers: Vec<(String, String)>,
    cookie: Option<String>,
) -> Result<()> {
    if headers.is_empty() && cookie.is_none() {
        print_state(host, load_session(cfg)?.host_state(host));
        return Ok(());
    }

    let (lock, saved) = lock_session(cfg).await?;
    let shared = SharedSession::new(saved);
    let update = HostStateUpdate {
        headers: headers.into_iter().collect(),
        cookie,
    };
    let session = shared.update_host_state(host, update).await?;
    save_locked(&lock, &session)?;
    drop(lock);
    print_state(host, session.host_state(host));
    Ok(())
}
