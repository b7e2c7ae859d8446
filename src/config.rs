//! Launcher configuration
//!
//! Owned elsewhere in a full deployment; the pipeline only consumes it. Reads
//! `config.json` from the platform config directory when present, otherwise
//! falls back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default cap on the displayed result list
const DEFAULT_MAX_RESULTS: usize = 30;
/// Default grace window for merging enrichment into the first delivery
const DEFAULT_GRACE_WINDOW_MS: u64 = 300;
/// Reserved marker routing a provider to every query
pub const DEFAULT_WILDCARD_MARKER: &str = "*";

/// Configuration consumed by the query pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LauncherConfig {
    /// Maximum number of results kept after the final sort
    pub max_results: usize,
    /// Whether providers may run asynchronous enrichment at all
    pub enrichment_enabled: bool,
    /// Registration token that routes a provider to every query
    pub wildcard_marker: String,
    /// Milliseconds to hold the first delivery for enrichment to catch up
    pub grace_window_ms: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            enrichment_enabled: true,
            wildcard_marker: DEFAULT_WILDCARD_MARKER.to_string(),
            grace_window_ms: DEFAULT_GRACE_WINDOW_MS,
        }
    }
}

impl LauncherConfig {
    /// Grace window as a [`Duration`]
    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }
}

/// Get the path to the launcher configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("quickcast").join("config.json"))
}

/// Load the configuration from disk, defaulting when the file is absent
pub fn load_config() -> Result<LauncherConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(LauncherConfig::default());
    }

    let data = fs::read_to_string(&path).context("Failed to read config file")?;
    let config: LauncherConfig =
        serde_json::from_str(&data).context("Failed to parse config file")?;
    Ok(config)
}
