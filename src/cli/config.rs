//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/kvstore",
//!   "storage_backend": "log",
//!   "sync_mode": "fsync",
//!   "fatal_policy": "halt",
//!   "check_tx_gas_wanted": 1,
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::{FatalPolicy, DEFAULT_GAS_WANTED};
use crate::observability::Severity;

use super::errors::{CliError, CliResult};

/// Which storage engine backs the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Append-only checksummed log under `data_dir`
    Log,
    /// Volatile; state is lost on exit
    Memory,
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Storage engine (optional, default "log")
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    /// Commit sync mode (optional, default "fsync")
    #[serde(default = "default_sync_mode")]
    pub sync_mode: String,

    /// Behaviour after an internal fault (optional, default "halt")
    #[serde(default)]
    pub fatal_policy: FatalPolicy,

    /// Gas reported by CheckTx (optional, default 1)
    #[serde(default = "default_gas_wanted")]
    pub check_tx_gas_wanted: i64,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Log
}
fn default_sync_mode() -> String {
    "fsync".to_string()
}
fn default_gas_wanted() -> i64 {
    DEFAULT_GAS_WANTED
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.sync_mode != "fsync" {
            return Err(CliError::config_error(format!(
                "Invalid sync_mode: '{}'. Only 'fsync' is allowed.",
                self.sync_mode
            )));
        }

        if self.check_tx_gas_wanted < 0 {
            return Err(CliError::config_error(
                "check_tx_gas_wanted must be >= 0",
            ));
        }

        self.min_log_severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Parsed `log_level`
    pub fn min_log_severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|_| {
                CliError::config_error(format!(
                    "Invalid log_level: '{}'. Must be one of trace, info, warn, error, fatal.",
                    self.log_level
                ))
            })
    }
}
