//! CLI for capcat.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use capcat_core::config;
use std::path::PathBuf;

use commands::{
    run_cache, run_curl, run_host_state, run_hosts, run_parse, run_replay, run_requests,
    run_scan, run_session,
};

/// Top-level CLI for capcat.
#[derive(Debug, Parser)]
#[command(name = "capcat")]
#[command(about = "capcat: catalog and replay HTTP requests from decrypted packet captures", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List capture and key files in a folder and show how they pair up.
    Scan {
        /// Folder holding .pcap/.pcapng files and TLS key logs.
        folder: PathBuf,
    },

    /// Extract, filter and deduplicate every capture in a folder.
    Parse {
        folder: PathBuf,
        /// Ignore the parse cache and extract everything again.
        #[arg(long)]
        force: bool,
    },

    /// List hosts in the current session.
    Hosts,

    /// List the requests recorded for a host.
    Requests { host: String },

    /// Show or update the stable headers and cookie replayed for a host.
    HostState {
        host: String,
        /// Header to set, as NAME=VALUE. Repeatable.
        #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_key_val)]
        headers: Vec<(String, String)>,
        /// Cookie header value to send.
        #[arg(long)]
        cookie: Option<String>,
    },

    /// Print a curl command reproducing a request.
    Curl {
        host: String,
        /// Request index as shown by `requests`.
        index: usize,
    },

    /// Send a request again and print the response.
    Replay { host: String, index: usize },

    /// Inspect or clear the parse cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show a summary of the current session.
    Session,
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// List cache entries.
    Status,
    /// Remove cache entries.
    Clear {
        /// Remove every entry.
        #[arg(long, conflicts_with_all = ["folder", "old"])]
        all: bool,
        /// Remove the entry for one folder.
        #[arg(long, value_name = "PATH", conflicts_with = "old")]
        folder: Option<PathBuf>,
        /// Remove entries older than the cache TTL.
        #[arg(long)]
        old: bool,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected NAME=VALUE, got `{s}`")),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Scan { folder } => run_scan(&folder)?,
            CliCommand::Parse { folder, force } => run_parse(&cfg, &folder, force).await?,
            CliCommand::Hosts => run_hosts(&cfg)?,
            CliCommand::Requests { host } => run_requests(&cfg, &host)?,
            CliCommand::HostState {
                host,
                headers,
                cookie,
            } => run_host_state(&cfg, &host, headers, cookie).await?,
            CliCommand::Curl { host, index } => run_curl(&cfg, &host, index)?,
            CliCommand::Replay { host, index } => run_replay(&cfg, &host, index).await?,
            CliCommand::Cache { action } => run_cache(&cfg, action)?,
            CliCommand::Session => run_session(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
