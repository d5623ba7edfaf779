//! Configuration for the `sqlstore` binary.
//!
//! Precedence, lowest first: built-in defaults, the JSON config file,
//! environment variables, then command-line flags.

use serde::{Deserialize, Serialize};
use sql_list_store::StoreOptions;
use std::path::{Path, PathBuf};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Table mirrored when none is configured.
pub const DEFAULT_TABLE: &str = "test_table";

/// Database file name under the platform data directory.
const DEFAULT_DATABASE_FILE: &str = "list.db";

const APP_DIR: &str = "sql-list-store";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Harness configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
    /// Database file; the platform data directory is used when unset.
    pub database_path: Option<PathBuf>,
    /// Table to mirror.
    pub table: String,
    /// Append JSONL logs to this file.
    pub log_file: Option<PathBuf>,
    /// Connection settings.
    pub store: StoreOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            database_path: None,
            table: DEFAULT_TABLE.to_string(),
            log_file: None,
            store: StoreOptions::default(),
        }
    }
}

impl Config {
    /// Loads `path` if given and present, then applies the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => Self::load_from_file(path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides from `SQLSTORE_LOG_LEVEL` and `SQLSTORE_DATABASE`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("SQLSTORE_LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
        if let Some(path) = lookup("SQLSTORE_DATABASE").filter(|v| !v.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
    }

    /// The configured database file, or the platform default.
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_database_path)
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join(DEFAULT_DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_list_store::JournalMode;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.table, DEFAULT_TABLE);
        assert!(config.database_path.is_none());
        assert_eq!(config.store, StoreOptions::default());
        assert!(config.database_path().ends_with(DEFAULT_DATABASE_FILE));
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{
                "log_level": "debug",
                "table": "items",
                "store": { "journal_mode": "delete", "busy_timeout_ms": 250 }
            }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.table, "items");
        assert_eq!(config.store.journal_mode, Some(JournalMode::Delete));
        assert_eq!(config.store.busy_timeout_ms, 250);
        assert!(config.store.create_parent_dirs);
    }

    #[test]
    fn test_config_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config.table, DEFAULT_TABLE);
    }

    #[test]
    fn test_config_invalid_json() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        let err = Config::load_from_file(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SQLSTORE_LOG_LEVEL", "trace"),
            ("SQLSTORE_DATABASE", "/tmp/other.db"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.log_level, "trace");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.database_path.is_none());
    }
}
