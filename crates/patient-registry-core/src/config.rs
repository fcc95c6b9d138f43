//! Registry configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// `database_path` value selecting an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

const MIN_BUSY_TIMEOUT_MS: u64 = 1;
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    Validation { message: String },
}

/// Registry configuration, usually loaded from a JSON file.
///
/// ```json
/// {
///   "database_path": "/var/lib/registry/patients.db",
///   "busy_timeout_ms": 5000,
///   "log_filter": "info"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// SQLite file path, or ":memory:"
    pub database_path: String,
    /// How long a write waits on a locked database (1–60000 ms)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            database_path: "patients.db".to_string(),
            busy_timeout_ms: default_busy_timeout_ms(),
            log_filter: default_log_filter(),
        }
    }
}

impl RegistryConfig {
    /// In-memory configuration (for testing).
    pub fn in_memory() -> Self {
        Self {
            database_path: IN_MEMORY_PATH.to_string(),
            ..Self::default()
        }
    }

    /// Load and validate a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges. Call after building a config by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "database_path must not be empty".to_string(),
            });
        }
        if !(MIN_BUSY_TIMEOUT_MS..=MAX_BUSY_TIMEOUT_MS).contains(&self.busy_timeout_ms) {
            return Err(ConfigError::Validation {
                message: format!(
                    "busy_timeout_ms must be {}-{}, got {}",
                    MIN_BUSY_TIMEOUT_MS, MAX_BUSY_TIMEOUT_MS, self.busy_timeout_ms
                ),
            });
        }
        if let Err(e) = EnvFilter::try_new(&self.log_filter) {
            return Err(ConfigError::Validation {
                message: format!("log_filter {:?} is not a valid filter: {}", self.log_filter, e),
            });
        }
        Ok(())
    }
}
