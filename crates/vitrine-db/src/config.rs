//! # Database Configuration Loading
//!
//! Builds a [`DbConfig`] from a TOML file and/or environment variables.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     VITRINE_DB_PATH=/var/lib/vitrine/vitrine.db                        │
//! │     VITRINE_DB_MAX_CONNECTIONS=8                                       │
//! │                                                                         │
//! │  2. TOML Config File ([database] table)                                │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     vitrine.db, 5 connections, migrations on                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/vitrine/vitrine.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//! idle_timeout_secs = 600
//! run_migrations = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::pool::DbConfig;

pub const ENV_DB_PATH: &str = "VITRINE_DB_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "VITRINE_DB_MAX_CONNECTIONS";
pub const ENV_MIN_CONNECTIONS: &str = "VITRINE_DB_MIN_CONNECTIONS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "VITRINE_DB_CONNECT_TIMEOUT_SECS";
pub const ENV_RUN_MIGRATIONS: &str = "VITRINE_DB_RUN_MIGRATIONS";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

// =============================================================================
// Settings File
// =============================================================================

/// The `[database]` table of a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("vitrine.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_run_migrations() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: default_run_migrations(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    database: DatabaseSettings,
}

impl From<DatabaseSettings> for DbConfig {
    fn from(s: DatabaseSettings) -> Self {
        DbConfig::new(s.path)
            .max_connections(s.max_connections)
            .min_connections(s.min_connections)
            .connect_timeout(Duration::from_secs(s.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(s.idle_timeout_secs))
            .run_migrations(s.run_migrations)
    }
}

// =============================================================================
// Loading
// =============================================================================

impl DbConfig {
    /// Parses the `[database]` table of a TOML document.
    ///
    /// A document without the table yields the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        let config = DbConfig::from(file.database);
        config.check()?;
        Ok(config)
    }

    /// Reads a TOML config file, then applies environment overrides.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading database config file");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents)?.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `VITRINE_DB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        DbConfig::from(DatabaseSettings::default())
            .with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` (normally the process environment).
    ///
    /// Unparseable values are an error rather than silently ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Some(value) = lookup(ENV_MAX_CONNECTIONS) {
            self.max_connections = parse_env(ENV_MAX_CONNECTIONS, &value)?;
        }

        if let Some(value) = lookup(ENV_MIN_CONNECTIONS) {
            self.min_connections = parse_env(ENV_MIN_CONNECTIONS, &value)?;
        }

        if let Some(value) = lookup(ENV_CONNECT_TIMEOUT_SECS) {
            self.connect_timeout = Duration::from_secs(parse_env(ENV_CONNECT_TIMEOUT_SECS, &value)?);
        }

        if let Some(value) = lookup(ENV_RUN_MIGRATIONS) {
            self.run_migrations = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_RUN_MIGRATIONS.to_string(),
                        value,
                        reason: "expected true or false".to_string(),
                    })
                }
            };
        }

        self.check()?;
        Ok(self)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue {
                key: "min_connections".to_string(),
                value: self.min_connections.to_string(),
                reason: format!("must not exceed max_connections ({})", self.max_connections),
            });
        }

        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_empty_document() {
        let config = DbConfig::from_toml_str("").unwrap();
        assert_eq!(config.database_path, PathBuf::from("vitrine.db"));
        assert_eq!(config.max_connections, 5);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_toml_database_table() {
        let config = DbConfig::from_toml_str(
            r#"
            [database]
            path = "/tmp/shop.db"
            max_connections = 8
            run_migrations = false
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 1);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_invalid_toml() {
        let err = DbConfig::from_toml_str("[database]\nmax_connections = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = DbConfig::new("vitrine.db")
            .with_env_overrides(env(&[
                (ENV_DB_PATH, "/data/pos.db"),
                (ENV_MAX_CONNECTIONS, "3"),
                (ENV_CONNECT_TIMEOUT_SECS, "7"),
                (ENV_RUN_MIGRATIONS, "off"),
            ]))
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/data/pos.db"));
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.connect_timeout, Duration::from_secs(7));
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = DbConfig::new("vitrine.db")
            .with_env_overrides(env(&[(ENV_MAX_CONNECTIONS, "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_min_above_max_rejected() {
        let err = DbConfig::new("vitrine.db")
            .with_env_overrides(env(&[(ENV_MAX_CONNECTIONS, "2"), (ENV_MIN_CONNECTIONS, "4")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
