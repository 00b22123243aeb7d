//! Process configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `TODO_DB_PATH` | `todo.sqlite3` (`:memory:` for an in-memory store) |
//! | `TODO_HOST` | `127.0.0.1` |
//! | `TODO_PORT`, then `PORT` | `8080` |
//! | `TODO_LOG_LEVEL` | `debug` in debug builds, `info` in release |
//! | `TODO_LOG_DIR` | unset: log to stderr |
//! | `TODO_REQUEST_TIMEOUT_SECS` | `30` |

use std::time::Duration;
use thiserror::Error;
use todo_core::db::{open_db, open_db_in_memory};
use todo_core::{default_log_level, DbError, TodoService};

const IN_MEMORY_DB_PATH: &str = ":memory:";
const DEFAULT_DB_PATH: &str = "todo.sqlite3";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port `{0}`; expected 0-65535")]
    InvalidPort(String),

    #[error("invalid request timeout `{0}`; expected a positive number of seconds")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: default_log_level().to_string(),
            log_dir: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let port = match get("TODO_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        let request_timeout = match get("TODO_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => defaults.request_timeout,
        };

        Ok(Self {
            db_path: get("TODO_DB_PATH").unwrap_or(defaults.db_path),
            host: get("TODO_HOST").unwrap_or(defaults.host),
            port,
            log_level: get("TODO_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: get("TODO_LOG_DIR"),
            request_timeout,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Opens (and migrates) the configured store and wraps it in a service.
    pub fn open_service(&self) -> Result<TodoService, DbError> {
        let conn = if self.db_path == IN_MEMORY_DB_PATH {
            open_db_in_memory()?
        } else {
            open_db(&self.db_path)?
        };
        Ok(TodoService::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("TODO_DB_PATH", "/var/lib/todo/todo.db"),
            ("TODO_HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("TODO_LOG_LEVEL", "warn"),
            ("TODO_LOG_DIR", "/var/log/todo"),
            ("TODO_REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, "/var/lib/todo/todo.db");
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/todo"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn todo_port_wins_over_port_and_blank_values_are_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("TODO_PORT", "7000"),
            ("PORT", "9000"),
            ("TODO_LOG_DIR", "  "),
        ]))
        .unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let port = ServerConfig::from_lookup(lookup_from(&[("PORT", "http")])).unwrap_err();
        assert_eq!(port, ConfigError::InvalidPort("http".to_string()));

        let timeout =
            ServerConfig::from_lookup(lookup_from(&[("TODO_REQUEST_TIMEOUT_SECS", "0")]))
                .unwrap_err();
        assert_eq!(timeout, ConfigError::InvalidTimeout("0".to_string()));
    }

    #[tokio::test]
    async fn in_memory_path_opens_a_working_service() {
        let config = ServerConfig {
            db_path: IN_MEMORY_DB_PATH.to_string(),
            ..ServerConfig::default()
        };
        let service = config.open_service().unwrap();
        assert!(service.read_todos(0, 5).await.unwrap().is_empty());
    }
}
