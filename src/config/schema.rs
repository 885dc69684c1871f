//! Configuration schema definitions.
//!
//! `RuntimeConfig` is built once by the orchestrator and never mutated after
//! the runtime starts. All types derive Serde traits for deserialization from
//! config files.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable the log level is read from.
pub const LOG_LEVEL_ENV: &str = "GATEWAY_LOG_LEVEL";

/// Default WebSocket message size limit (1 GiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024 * 1024;

/// Root configuration for a gateway runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Host or IP address to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to listen on (1-65535).
    pub port: u16,

    /// Maximum WebSocket message and frame size in bytes.
    pub max_message_size: usize,

    /// Log level handed to the embedded server.
    pub log_level: LogLevel,

    /// Upper bound on connection draining during shutdown, in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            log_level: LogLevel::Error,
            drain_timeout_secs: 30,
        }
    }
}

impl RuntimeConfig {
    /// Default configuration with the log level taken from `GATEWAY_LOG_LEVEL`.
    pub fn from_env() -> Result<Self, ParseLogLevelError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override the log level from `GATEWAY_LOG_LEVEL` when it is set.
    pub fn apply_env(&mut self) -> Result<(), ParseLogLevelError> {
        if let Some(level) = log_level_from(std::env::var(LOG_LEVEL_ENV).ok())? {
            self.log_level = level;
        }
        Ok(())
    }

    /// Bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

fn log_level_from(value: Option<String>) -> Result<Option<LogLevel>, ParseLogLevelError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.parse())
        .transpose()
}

/// Log level, parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            // tracing has no level above ERROR
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }

    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Critical => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Error returned for an unrecognised log level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level `{0}` (expected debug, info, warning, error or critical)")]
pub struct ParseLogLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ParseLogLevelError;

    fn try_from(value: String) -> Result<Self, ParseLogLevelError> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gateway_contract() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_message_size, 1 << 30);
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn log_level_parse_is_case_insensitive() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(" critical ".parse::<LogLevel>().unwrap(), LogLevel::Critical);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_level_deserializes_through_string() {
        let config: RuntimeConfig = toml::from_str("log_level = \"WARN\"").unwrap();
        assert_eq!(config.log_level, LogLevel::Warning);
        assert_eq!(
            LogLevel::try_from("Error".to_string()).unwrap(),
            LogLevel::Error
        );
        assert!(toml::from_str::<RuntimeConfig>("log_level = \"loud\"").is_err());
    }

    #[test]
    fn critical_maps_to_error_for_tracing() {
        assert_eq!(LogLevel::Critical.as_filter(), "error");
        assert_eq!(LogLevel::Critical.as_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Warning.as_filter(), "warn");
    }

    #[test]
    fn env_override_ignores_unset_and_blank() {
        assert_eq!(log_level_from(None).unwrap(), None);
        assert_eq!(log_level_from(Some("  ".into())).unwrap(), None);
        assert_eq!(
            log_level_from(Some("DEBUG".into())).unwrap(),
            Some(LogLevel::Debug)
        );
        assert!(log_level_from(Some("loud".into())).is_err());
    }
}
