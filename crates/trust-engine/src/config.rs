use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Engine rule configuration. Built-in defaults apply when unset.
    #[serde(default)]
    pub engine_config: Option<PathBuf>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// JSON-lines diagnostic log; diagnostics stay in memory when unset.
    #[serde(default)]
    pub diagnostic_log_path: Option<PathBuf>,
    #[serde(default = "default_ring_capacity")]
    pub ring_capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            diagnostic_log_path: None,
            ring_capacity: default_ring_capacity(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: default_true(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ring_capacity() -> usize {
    diagnostic_log::DEFAULT_CAPACITY
}

fn default_true() -> bool {
    true
}

/// Load the runner configuration. A missing file yields the defaults.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        warn!(path = %path.display(), "configuration file not found; using defaults");
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    serde_yml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
