//! Server configuration.

use anyhow::Result;
use relay_core::DispatcherConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for every path that is not a route (the chat page).
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Per-client write timeout during broadcasts, in seconds. 0 (the
    /// default) disables it.
    #[serde(default)]
    pub write_timeout_secs: u64,
    /// Queue a `left` event whenever a connection's reader stops, instead of
    /// waiting for a failed write to prune it.
    #[serde(default)]
    pub prune_on_disconnect: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            write_timeout_secs: 0,
            prune_on_disconnect: false,
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from config/default.toml, or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }
        Ok(Config::default())
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_secs > 0).then(|| Duration::from_secs(self.write_timeout_secs))
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            write_timeout: self.write_timeout(),
        }
    }
}
