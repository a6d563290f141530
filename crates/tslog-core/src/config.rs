//! Logger configuration.
//!
//! `LoggerConfig` can be built in code, deserialized with serde, or read from
//! the environment (`TSLOG_PATH`, `TSLOG_APPEND`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable holding the sink path.
pub const ENV_PATH: &str = "TSLOG_PATH";

/// Environment variable selecting append mode (`1/true/yes` or `0/false/no`).
pub const ENV_APPEND: &str = "TSLOG_APPEND";

/// Sink path used when nothing else is configured.
pub const DEFAULT_LOG_FILE: &str = "tslog.log";

/// Where and how the logger opens its sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Path of the log file
    pub path: PathBuf,

    /// Keep existing content instead of truncating
    pub append: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_FILE),
            append: false,
        }
    }
}

impl LoggerConfig {
    /// Config for `path` in truncate mode.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: false,
        }
    }

    /// Set append mode.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        Ok(())
    }

    /// Defaults overridden by `TSLOG_PATH` / `TSLOG_APPEND`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_PATH) {
            config.path = PathBuf::from(path);
        }
        if let Some(value) = lookup(ENV_APPEND) {
            config.append = parse_flag(&value).ok_or(ConfigError::InvalidValue {
                key: ENV_APPEND,
                value,
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
