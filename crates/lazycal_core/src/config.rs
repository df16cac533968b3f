//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe the settings the core needs (database, logging, reminders).
//! - Parse and validate them from JSON supplied by the host app.
//!
//! # Invariants
//! - Missing keys fall back to defaults.
//! - A validated config never has a zero poll interval.
//! - Locating the config file on disk is the host app's job.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const SUPPORTED_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

/// Errors from config parsing/validation.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Reminder poller settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// How long before an event starts its reminder fires.
    pub lead_minutes: u32,
    pub poll_interval_secs: u64,
    /// Tolerance around the reminder instant.
    pub slack_secs: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            lead_minutes: 10,
            poll_interval_secs: 30,
            slack_secs: 60,
        }
    }
}

impl ReminderConfig {
    pub fn lead(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.lead_minutes))
    }

    pub fn slack(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.slack_secs))
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}

/// Top-level core settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// `None` means an in-memory database.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
    pub reminder: ReminderConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            reminder: ReminderConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field rules serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.log_level.trim().to_ascii_lowercase();
        if !SUPPORTED_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unsupported log_level `{}`",
                self.log_level
            )));
        }
        if self.reminder.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reminder.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("defaults should validate");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.reminder.lead_minutes, 10);
    }

    #[test]
    fn partial_reminder_section_keeps_other_defaults() {
        let config = CoreConfig::from_json_str(r#"{"reminder": {"lead_minutes": 5}}"#)
            .expect("partial config should parse");
        assert_eq!(config.reminder.lead_minutes, 5);
        assert_eq!(config.reminder.poll_interval_secs, 30);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"reminder": {"poll_interval_secs": 0}}"#)
            .expect_err("zero interval must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_level_and_bad_json_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{"log_level": "loud"}"#)
            .expect_err("unknown level must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CoreConfig::from_json_str("{").expect_err("truncated json must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
