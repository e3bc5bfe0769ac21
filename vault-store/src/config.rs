//! Store configuration
//!
//! Defaults, then an optional TOML file, then environment overrides.
//! The resulting value is handed to `Vault::open`; nothing is cached globally.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Environment override for the database file
pub const ENV_DB_PATH: &str = "VAULT_DB_PATH";

/// Environment override for the writer busy timeout
pub const ENV_BUSY_TIMEOUT_MS: &str = "VAULT_BUSY_TIMEOUT_MS";

const APP_DIR: &str = "vault";
const DB_FILE: &str = "vault.db";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl JournalMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// How long a writer waits for the file lock before failing
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_data_dir().join(DB_FILE),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
        }
    }
}

impl StoreConfig {
    /// Config for an explicit database file, other settings at defaults.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }

    /// Load from the default config file if present, then apply env overrides.
    pub fn load() -> StoreResult<Self> {
        let path = Self::config_path();
        let base = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        base.with_env_overrides()
    }

    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> StoreResult<Self> {
        Self::from_file(path)?.with_env_overrides()
    }

    fn from_file(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| StoreError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> StoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| StoreError::config(e.to_string()))
    }

    pub fn with_env_overrides(mut self) -> StoreResult<Self> {
        if let Ok(path) = env::var(ENV_DB_PATH) {
            if !path.trim().is_empty() {
                self.database_path = PathBuf::from(path);
            }
        }
        if let Ok(raw) = env::var(ENV_BUSY_TIMEOUT_MS) {
            self.busy_timeout_ms = raw.trim().parse().map_err(|_| {
                StoreError::config(format!("{} must be an integer, got '{}'", ENV_BUSY_TIMEOUT_MS, raw))
            })?;
        }
        Ok(self)
    }

    /// Config file path: `<config dir>/vault/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }
}

/// Per-platform application data directory, falling back to the current
/// directory when none can be determined.
pub fn default_data_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR),
        None => {
            tracing::warn!("could not determine data directory, using current directory");
            PathBuf::from(".")
        }
    }
}
