//! Tests for scan, parse and cache.

use super::{parse, parse_err};
use crate::cli::{CacheAction, CliCommand};
use std::path::PathBuf;

#[test]
fn cli_parse_scan() {
    match parse(&["capcat", "scan", "/data/caps"]) {
        CliCommand::Scan { folder } => assert_eq!(folder, PathBuf::from("/data/caps")),
        _ => panic!("expected Scan"),
    }
}

#[test]
fn cli_parse_parse_defaults() {
    match parse(&["capcat", "parse", "caps"]) {
        CliCommand::Parse { folder, force } => {
            assert_eq!(folder, PathBuf::from("caps"));
            assert!(!force);
        }
        _ => panic!("expected Parse"),
    }
}

#[test]
fn cli_parse_parse_force() {
    match parse(&["capcat", "parse", "caps", "--force"]) {
        CliCommand::Parse { force, .. } => assert!(force),
        _ => panic!("expected Parse"),
    }
}

#[test]
fn cli_parse_parse_requires_folder() {
    let err = parse_err(&["capcat", "parse"]);
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn cli_parse_cache_status() {
    match parse(&["capcat", "cache", "status"]) {
        CliCommand::Cache {
            action: CacheAction::Status,
        } => {}
        _ => panic!("expected Cache Status"),
    }
}

#[test]
fn cli_parse_cache_clear_folder() {
    match parse(&["capcat", "cache", "clear", "--folder", "/data/caps"]) {
        CliCommand::Cache {
            action: CacheAction::Clear { all, folder, old },
        } => {
            assert!(!all);
            assert!(!old);
            assert_eq!(folder, Some(PathBuf::from("/data/caps")));
        }
        _ => panic!("expected Cache Clear"),
    }
}

#[test]
fn cli_parse_cache_clear_all_conflicts_with_old() {
    let err = parse_err(&["capcat", "cache", "clear", "--all", "--old"]);
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}
