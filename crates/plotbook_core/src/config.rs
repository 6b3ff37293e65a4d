//! Engine configuration.
//!
//! # Responsibility
//! - Hold the storage key, capacity limit, database path and log settings.
//! - Normalize values from the environment (or any lookup) once, up front.
//!
//! # Invariants
//! - A validated config has a non-empty storage key without whitespace.
//! - `log_level` is one of the normalized logging levels.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Key the document lives under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "allotment-unified-data";

pub const ENV_DB_PATH: &str = "PLOTBOOK_DB";
pub const ENV_LOG_LEVEL: &str = "PLOTBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PLOTBOOK_LOG_DIR";
pub const ENV_STORAGE_KEY: &str = "PLOTBOOK_STORAGE_KEY";
pub const ENV_CAPACITY_BYTES: &str = "PLOTBOOK_CAPACITY_BYTES";

#[derive(Debug)]
pub enum ConfigError {
    InvalidStorageKey(String),
    InvalidCapacity(String),
    Logging(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStorageKey(key) => write!(
                f,
                "storage key must be non-empty and contain no whitespace, got `{key}`"
            ),
            Self::InvalidCapacity(value) => {
                write!(f, "capacity must be a positive byte count, got `{value}`")
            }
            Self::Logging(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::InvalidStorageKey(_) | Self::InvalidCapacity(_) => None,
        }
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub storage_key: String,
    /// Byte cap applied to the backing store, if any.
    pub capacity_bytes: Option<u64>,
    pub log_level: &'static str,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file; an in-memory database is used when unset.
    pub db_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            capacity_bytes: None,
            log_level: default_log_level(),
            log_dir: None,
            db_path: None,
        }
    }
}

impl EngineConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_capacity_bytes(mut self, bytes: u64) -> Self {
        self.capacity_bytes = Some(bytes);
        self
    }

    /// Reads `PLOTBOOK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(key) = read(ENV_STORAGE_KEY) {
            config.storage_key = key;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(normalize_log_dir(&dir)?);
        }
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = read(ENV_CAPACITY_BYTES) {
            let bytes = raw
                .parse::<u64>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or(ConfigError::InvalidCapacity(raw))?;
            config.capacity_bytes = Some(bytes);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.is_empty() || self.storage_key.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidStorageKey(self.storage_key.clone()));
        }
        if self.capacity_bytes == Some(0) {
            return Err(ConfigError::InvalidCapacity("0".to_string()));
        }
        Ok(())
    }

    /// Key holding the migration backup taken before leaving `version`.
    pub fn backup_key(&self, version: u32) -> String {
        backup_key(&self.storage_key, version)
    }
}

pub(crate) fn backup_key(storage_key: &str, version: u32) -> String {
    format!("{storage_key}-backup-v{version}")
}

pub(crate) fn pre_import_key(storage_key: &str, timestamp_millis: i64) -> String {
    format!("{storage_key}-pre-import-{timestamp_millis}")
}
