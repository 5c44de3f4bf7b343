//! Core runtime configuration.
//!
//! # Responsibility
//! - Collect data location, log level and session timings in one value.
//! - Apply environment overrides on top of built-in defaults.
//!
//! # Invariants
//! - Defaults never depend on the environment; only `with_env_overrides`
//!   reads it.

use crate::logging::default_log_level;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "QUICKNOTE_DATA_DIR";
/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "QUICKNOTE_LOG_LEVEL";

const DB_FILE_NAME: &str = "quicknote.sqlite3";
const LOG_DIR_NAME: &str = "logs";
const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_SAVE_STATUS_MS: u64 = 2_000;

/// Timer durations for the editor session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quiet period after the last edit before autosave fires.
    pub debounce: Duration,
    /// How long the "saved" indicator stays visible.
    pub save_status: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            save_status: Duration::from_millis(DEFAULT_SAVE_STATUS_MS),
        }
    }
}

/// Top-level configuration for a core instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Directory holding the database and logs.
    pub data_dir: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    pub session: SessionConfig,
}

impl CoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_level: default_log_level().to_string(),
            session: SessionConfig::default(),
        }
    }

    /// Replaces fields with values from `QUICKNOTE_DATA_DIR` and
    /// `QUICKNOTE_LOG_LEVEL` when those are set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(DATA_DIR_ENV).ok(),
            std::env::var(LOG_LEVEL_ENV).ok(),
        )
    }

    fn with_overrides(mut self, data_dir: Option<String>, log_level: Option<String>) -> Self {
        if let Some(dir) = data_dir.filter(|value| !value.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(level) = log_level.filter(|value| !value.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, SessionConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn session_defaults_match_popup_timings() {
        let session = SessionConfig::default();
        assert_eq!(session.debounce, Duration::from_millis(500));
        assert_eq!(session.save_status, Duration::from_millis(2_000));
    }

    #[test]
    fn derived_paths_live_under_data_dir() {
        let config = CoreConfig::new("/tmp/qn");
        assert_eq!(config.db_path(), PathBuf::from("/tmp/qn/quicknote.sqlite3"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/qn/logs"));
    }

    #[test]
    fn overrides_ignore_blank_values() {
        let config = CoreConfig::new("/a").with_overrides(Some("  ".into()), Some("WARN".into()));
        assert_eq!(config.data_dir, PathBuf::from("/a"));
        assert_eq!(config.log_level, "WARN");

        let config = CoreConfig::new("/a").with_overrides(Some("/b".into()), None);
        assert_eq!(config.data_dir, PathBuf::from("/b"));
    }
}
