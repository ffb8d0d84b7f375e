//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use subtrack_shared::constants::RESET_CONFIRM_WINDOW_MS;
use subtrack_store::{Database, StoreError};

use crate::retry::RetryConfig;

/// Default log filter when neither `RUST_LOG` nor `SUBTRACK_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "subtrack_client=info,subtrack_store=info,warn";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Location of the local cache database.
    /// Env: `SUBTRACK_DB_PATH`
    /// Default: platform data directory (see [`Database::default_path`]).
    pub db_path: Option<PathBuf>,

    /// How long an armed reset waits for its confirming second trigger.
    /// Env: `SUBTRACK_RESET_WINDOW_MS`
    /// Default: 3000 ms
    pub reset_window: Duration,

    /// Log filter used when `RUST_LOG` is unset.
    /// Env: `SUBTRACK_LOG`
    pub log_filter: String,

    /// Backoff used when flushing the outbox.
    pub flush_retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            reset_window: Duration::from_millis(RESET_CONFIRM_WINDOW_MS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            flush_retry: RetryConfig::flush(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("SUBTRACK_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(window) = lookup("SUBTRACK_RESET_WINDOW_MS") {
            match parse_millis(&window) {
                Some(d) => config.reset_window = d,
                None => tracing::warn!(
                    value = %window,
                    "Invalid SUBTRACK_RESET_WINDOW_MS, using default"
                ),
            }
        }

        if let Some(filter) = lookup("SUBTRACK_LOG").filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        config
    }

    /// Open the configured database, creating its directory if needed.
    pub fn open_database(&self) -> Result<Database, StoreError> {
        match &self.db_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                tracing::info!(path = %path.display(), "opening database");
                Database::open_at(path)
            }
            None => Database::new(),
        }
    }
}

fn parse_millis(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ClientConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.reset_window, Duration::from_secs(3));
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SUBTRACK_DB_PATH", "/tmp/subtrack-test.db"),
            ("SUBTRACK_RESET_WINDOW_MS", "500"),
            ("SUBTRACK_LOG", "debug"),
        ]);

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/subtrack-test.db")));
        assert_eq!(config.reset_window, Duration::from_millis(500));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[("SUBTRACK_RESET_WINDOW_MS", "soon"), ("SUBTRACK_LOG", " ")]);
        assert_eq!(config.reset_window, Duration::from_secs(3));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);

        let config = config_from(&[("SUBTRACK_RESET_WINDOW_MS", "0")]);
        assert_eq!(config.reset_window, Duration::from_secs(3));
    }

    #[test]
    fn test_open_database_at_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            db_path: Some(dir.path().join("nested").join("cache.db")),
            ..Default::default()
        };

        let db = config.open_database().unwrap();
        assert!(db.path().is_some());
    }
}
