//! Configuration management.
//!
//! Values come from an optional TOML file; `TENDER_DB_PATH` and `TENDER_LOG`
//! override the storage path and log level when set.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "TENDER_DB_PATH";
pub const LOG_ENV: &str = "TENDER_LOG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory of the sled database
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Keep everything in memory and discard it on exit
    #[serde(default)]
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            in_memory: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Page size used when a list request gives no (or a zero) limit
    #[serde(default = "default_page_limit")]
    pub default_page_limit: usize,

    /// Log the current content before a rollback overwrites it
    #[serde(default)]
    pub snapshot_before_rollback: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_limit: default_page_limit(),
            snapshot_before_rollback: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `tender_market=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tender.db")
}

fn default_page_limit() -> usize {
    crate::types::Page::DEFAULT_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Load `path` if given, otherwise start from defaults, then apply the
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply overrides looked up through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.is_empty()) {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(level) = lookup(LOG_ENV).filter(|l| !l.is_empty()) {
            self.logging.level = level;
        }
        self
    }
}
