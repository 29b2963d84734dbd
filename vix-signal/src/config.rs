//! Signal configuration.
//!
//! Loaded from a TOML file, with environment variable overrides:
//!
//! ```toml
//! history_start = "2010-01-01"
//! base_url = "https://query1.finance.yahoo.com"
//! request_timeout_secs = 10
//! max_attempts = 3
//! log_level = "info"
//! ```

use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// First month of the VIX9D/VIX reference history.
    #[serde(default = "default_history_start")]
    pub history_start: NaiveDate,

    /// Market-data provider base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            history_start: default_history_start(),
            base_url: default_base_url(),
            request_timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            log_level: default_log_level(),
        }
    }
}

impl SignalConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `VIX_SIGNAL_*` environment overrides.
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(value) = lookup("VIX_SIGNAL_HISTORY_START") {
            self.history_start = NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidEnv {
                    var: "VIX_SIGNAL_HISTORY_START",
                    value,
                }
            })?;
        }

        if let Some(value) = lookup("VIX_SIGNAL_BASE_URL") {
            self.base_url = value;
        }

        if let Some(value) = lookup("VIX_SIGNAL_TIMEOUT_SECS") {
            self.request_timeout_secs = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "VIX_SIGNAL_TIMEOUT_SECS",
                value,
            })?;
        }

        if let Some(value) = lookup("VIX_SIGNAL_MAX_ATTEMPTS") {
            self.max_attempts = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "VIX_SIGNAL_MAX_ATTEMPTS",
                value,
            })?;
        }

        if let Some(value) = lookup("VIX_SIGNAL_LOG_LEVEL") {
            self.log_level = value;
        }

        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".to_string()));
        }
        if self.history_start > Utc::now().date_naive() {
            return Err(ConfigError::Invalid(format!(
                "history_start {} is in the future",
                self.history_start
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SignalConfig::default();
        assert_eq!(config.history_start, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = SignalConfig::from_toml(
            r#"
            history_start = "2012-06-01"
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.history_start, NaiveDate::from_ymd_opt(2012, 6, 1).unwrap());
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_url, "https://query1.finance.yahoo.com");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(SignalConfig::from_toml("").unwrap(), SignalConfig::default());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            SignalConfig::from_toml("request_timeout_secs = \"ten\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SignalConfig::load(Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_env_overrides() {
        let config = SignalConfig::default()
            .with_overrides(env(&[
                ("VIX_SIGNAL_HISTORY_START", "2015-01-01"),
                ("VIX_SIGNAL_TIMEOUT_SECS", "30"),
                ("VIX_SIGNAL_LOG_LEVEL", "debug"),
            ]))
            .unwrap();
        assert_eq!(config.history_start, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_invalid_env_override() {
        let result =
            SignalConfig::default().with_overrides(env(&[("VIX_SIGNAL_MAX_ATTEMPTS", "many")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { var: "VIX_SIGNAL_MAX_ATTEMPTS", .. })
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = SignalConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SignalConfig {
            max_attempts: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = SignalConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SignalConfig {
            base_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SignalConfig {
            history_start: NaiveDate::from_ymd_opt(2999, 1, 1).unwrap(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
