//! CLI command handlers, one file per command.

mod cache;
mod curl;
mod host_state;
mod hosts;
mod parse;
mod replay;
mod requests;
mod scan;
mod session;

pub use cache::run_cache;
pub use curl::run_curl;
pub use host_state::run_host_state;
pub use hosts::run_hosts;
pub use parse::run_parse;
pub use replay::run_replay;
pub use requests::run_requests;
pub use scan::run_scan;
pub use session::run_session;

use session::load_session;
