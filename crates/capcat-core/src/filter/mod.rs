//! Analytics / tracking noise filter.
//!
//! Evaluation order for a `(host, path)` pair:
//! 1. whitelist against `host+path`: any match keeps the request
//! 2. host patterns against the lower-cased host: any match is noise
//! 3. host+path patterns against the lower-cased `host+path`: any match is noise
//! 4. path patterns against the lower-cased path: any match is noise
//! 5. otherwise keep

mod patterns;

use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FilterConfig;

/// Pattern lists driving the filter. Each entry is a case-insensitive,
/// partial-match regular expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPatternSets {
    pub whitelist: Vec<String>,
    pub host_patterns: Vec<String>,
    pub host_path_patterns: Vec<String>,
    pub path_patterns: Vec<String>,
}

impl FilterPatternSets {
    /// The built-in sets.
    pub fn builtin() -> Self {
        Self {
            whitelist: to_owned(patterns::WHITELIST),
            host_patterns: to_owned(patterns::HOST),
            host_path_patterns: to_owned(patterns::HOST_PATH),
            path_patterns: to_owned(patterns::PATH),
        }
    }

    /// Built-in sets with the user's `[filter]` additions appended.
    pub fn from_config(cfg: &FilterConfig) -> Self {
        let mut sets = Self::builtin();
        sets.whitelist.extend(cfg.extra_whitelist.iter().cloned());
        sets.host_patterns.extend(cfg.extra_host_patterns.iter().cloned());
        sets.path_patterns.extend(cfg.extra_path_patterns.iter().cloned());
        sets
    }
}

fn to_owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid {set} pattern set: {source}")]
    InvalidPattern {
        set: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Compiled filter. Build once per run and share.
#[derive(Debug, Clone)]
pub struct AnalyticsFilter {
    whitelist: RegexSet,
    hosts: RegexSet,
    host_paths: RegexSet,
    paths: RegexSet,
}

impl AnalyticsFilter {
    pub fn new(sets: &FilterPatternSets) -> Result<Self, FilterError> {
        Ok(Self {
            whitelist: compile("whitelist", &sets.whitelist)?,
            hosts: compile("host", &sets.host_patterns)?,
            host_paths: compile("host+path", &sets.host_path_patterns)?,
            paths: compile("path", &sets.path_patterns)?,
        })
    }

    pub fn builtin() -> Result<Self, FilterError> {
        Self::new(&FilterPatternSets::builtin())
    }

    /// True when the request at `host` + `path` (path includes the query) is noise.
    pub fn is_noise(&self, host: &str, path: &str) -> bool {
        let full = format!("{host}{path}");
        if self.whitelist.is_match(&full) {
            return false;
        }
        if self.hosts.is_match(&host.to_lowercase()) {
            return true;
        }
        if self.host_paths.is_match(&full.to_lowercase()) {
            return true;
        }
        self.paths.is_match(&path.to_lowercase())
    }
}

fn compile(set: &'static str, patterns: &[String]) -> Result<RegexSet, FilterError> {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()
        .map_err(|source| FilterError::InvalidPattern { set, source })
}
