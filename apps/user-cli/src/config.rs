//! Centralized configuration for user-cli.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than halfway through a command.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Storage backend provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost when the process exits)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("memory") {
            Some(Self::Memory)
        } else if s.eq_ignore_ascii_case("sqlite") {
            Some(Self::Sqlite)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider (default: memory)
    pub storage_provider: StorageProvider,
    /// SQLite database path (default: ./data/users.db)
    pub db_path: PathBuf,
    /// Log format (default: pretty)
    pub log_format: LogFormat,
    /// First id handed out by `register` (default: 1)
    pub first_user_id: i64,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_raw = lookup("STORAGE_PROVIDER").unwrap_or_else(|| "memory".into());
        let storage_provider = StorageProvider::parse(&storage_raw).ok_or_else(|| ConfigError {
            field: "STORAGE_PROVIDER",
            message: format!("expected 'memory' or 'sqlite', got '{}'", storage_raw),
        })?;

        let db_path = lookup("DB_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/users.db"));

        let log_format =
            LogFormat::from_str(&lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        let first_user_id = match lookup("FIRST_USER_ID") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError {
                field: "FIRST_USER_ID",
                message: format!("invalid integer '{}': {}", raw, e),
            })?,
            None => 1,
        };

        Ok(Self {
            storage_provider,
            db_path,
            log_format,
            first_user_id,
        })
    }
}
