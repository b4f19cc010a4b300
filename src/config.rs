//! Configuration for sst.
//!
//! The tool takes no command-line arguments. An optional file at
//! `~/.sst/config.toml` adjusts the run; a missing or unreadable file means
//! defaults: block forever on each reply and write nothing to disk. The
//! query count is always 100.
//!
//! ```toml
//! # Give up when the terminal stops answering (milliseconds).
//! # Leave unset to wait forever.
//! reply_timeout_ms = 2000
//!
//! [log]
//! enabled = true   # off by default
//! level = "info"
//! file = "sst.log"
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Name of the per-user directory under `$HOME`
const CONFIG_DIR: &str = ".sst";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-byte reply timeout; `None` blocks forever
    pub reply_timeout_ms: Option<u64>,
    /// Log file settings
    pub log: LogConfig,
}

/// Log file configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enabled: bool,
    /// `tracing` filter directive, e.g. "info" or "sst=debug"
    pub level: String,
    /// File name inside `~/.sst`
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: "sst.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(config) = Self::from_toml(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_ms.map(Duration::from_millis)
    }

    /// Log file path, if logging is enabled and a home directory exists
    pub fn log_path(&self) -> Option<PathBuf> {
        if !self.log.enabled {
            return None;
        }
        config_dir().map(|dir| dir.join(&self.log.file))
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }
}

fn config_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_DIR))
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.reply_timeout(), None);
        assert!(!config.log.enabled);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_default_run_writes_no_log() {
        assert_eq!(Config::default().log_path(), None);
        assert_eq!(Config::from_toml("").unwrap().log_path(), None);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml("reply_timeout_ms = 1500\n").unwrap();
        assert_eq!(config.reply_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_full_file() {
        let content = r#"
            reply_timeout_ms = 250

            [log]
            enabled = true
            level = "sst=debug"
            file = "latency.log"
        "#;
        let config = Config::from_toml(content).unwrap();
        assert_eq!(config.reply_timeout(), Some(Duration::from_millis(250)));
        assert!(config.log.enabled);
        assert_eq!(config.log.level, "sst=debug");
        if let Some(path) = config.log_path() {
            assert!(path.ends_with(".sst/latency.log"));
        }
    }

    #[test]
    fn test_rounds_key_is_ignored() {
        let config = Config::from_toml("rounds = 20").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file() {
        assert!(Config::from_toml("reply_timeout_ms = \"soon\"").is_err());
    }
}
