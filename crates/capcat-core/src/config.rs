use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// User additions to the built-in analytics filter (optional `[filter]` section).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Patterns matched against `host+path` that always keep a request.
    #[serde(default)]
    pub extra_whitelist: Vec<String>,
    /// Extra host patterns (whole domains) treated as noise.
    #[serde(default)]
    pub extra_host_patterns: Vec<String>,
    /// Extra narrow path patterns treated as noise.
    #[serde(default)]
    pub extra_path_patterns: Vec<String>,
}

/// Global configuration loaded from `~/.config/capcat/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapcatConfig {
    /// Parse cache and saved sessions older than this are ignored.
    pub cache_ttl_days: u64,
    /// Per-capture-file extraction timeout.
    pub extraction_timeout_secs: u64,
    /// Timeout for a single replayed request.
    pub replay_timeout_secs: u64,
    /// Maximum number of capture files extracted concurrently.
    pub workers: usize,
    /// tshark executable used by the extraction service.
    #[serde(default = "default_tshark_path")]
    pub tshark_path: String,
    #[serde(default)]
    pub filter: FilterConfig,
}

fn default_tshark_path() -> String {
    "tshark".to_string()
}

impl Default for CapcatConfig {
    fn default() -> Self {
        Self {
            cache_ttl_days: 7,
            extraction_timeout_secs: 300,
            replay_timeout_secs: 30,
            workers: 4,
            tshark_path: default_tshark_path(),
            filter: FilterConfig::default(),
        }
    }
}

impl CapcatConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_days.saturating_mul(86_400))
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs.max(1))
    }

    pub fn replay_timeout(&self) -> Duration {
        Duration::from_secs(self.replay_timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("capcat")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CapcatConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CapcatConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CapcatConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
