//! `capcat session` – summary of the saved session, plus load/save helpers
//! shared by the other commands.

use anyhow::Result;
use capcat_core::config::CapcatConfig;
use capcat_core::session::{Session, SessionFileLock};
use std::time::SystemTime;

/// The saved session, or an empty one when none is saved or it expired.
pub fn load_session(cfg: &CapcatConfig) -> Result<Session> {
    let path = Session::default_path()?;
    Ok(Session::load_from_path(&path, cfg.cache_ttl(), SystemTime::now())?.unwrap_or_default())
}

/// Locks the saved session for a load-modify-save cycle and loads it.
/// Keep the returned lock until [`save_locked`] has run.
pub async fn lock_session(cfg: &CapcatConfig) -> Result<(SessionFileLock, Session)> {
    let lock = SessionFileLock::acquire(&Session::default_path()?).await?;
    let session = lock
        .load(cfg.cache_ttl(), SystemTime::now())?
        .unwrap_or_default();
    Ok((lock, session))
}

pub fn save_locked(lock: &SessionFileLock, session: &Session) -> Result<()> {
    lock.save(session, SystemTime::now())?;
    tracing::debug!(path = %lock.path().display(), "saved session");
    Ok(())
}

pub fn run_session(cfg: &CapcatConfig) -> Result<()> {
    let summary = load_session(cfg)?.summary();
    match &summary.folder {
        Some(folder) => println!("Folder:        {}", folder.display()),
        None => {
            println!("No parsed session. Run `capcat parse <folder>` first.");
            return Ok(());
        }
    }
    println!("Capture files: {}", summary.files);
    println!("Hosts:         {}", summary.hosts);
    println!("Requests:      {}", summary.requests);
    println!("With auth:     {}", summary.hosts_with_auth);
    println!("With cookies:  {}", summary.hosts_with_cookie);
    println!("Host states:   {}", summary.hosts_with_state);
    Ok(())
}
