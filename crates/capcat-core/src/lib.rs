pub mod config;
pub mod logging;

pub mod cache;
pub mod canonical;
pub mod catalog;
pub mod dedup;
pub mod extract;
pub mod filter;
pub mod host_state;
pub mod pairing;
pub mod pipeline;
pub mod record;
pub mod replay;
pub mod session;
pub mod signature;
