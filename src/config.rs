//! Configuration for SQL trace logging.

use std::time::Duration;

use crate::level::LogLevel;

/// Configuration options for SQL trace logging.
///
/// # Example
///
/// ```rust
/// use sea_orm_sql_logger::{LogLevel, LoggerConfig};
/// use std::time::Duration;
///
/// let config = LoggerConfig::default()
///     .with_level(LogLevel::Warn)
///     .with_slow_threshold(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Initial severity threshold.
    /// Default: `LogLevel::Info`
    pub level: LogLevel,

    /// Statements running longer than this are logged at WARN level.
    /// `Duration::ZERO` disables slow-query detection.
    /// Default: 200ms
    pub slow_threshold: Duration,

    /// Whether to inline bound parameters into the logged SQL.
    /// Default: `false` (parameters may contain sensitive data)
    pub log_parameters: bool,

    /// Database name recorded on the logger and query spans.
    /// Default: `None`
    pub database_name: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            slow_threshold: Duration::from_millis(200),
            log_parameters: false,
            database_name: None,
        }
    }
}

impl LoggerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the slow-query threshold. Pass `Duration::ZERO` to disable it.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Enable or disable inlining of query parameters into logged SQL.
    ///
    /// **Security Warning**: Query parameters often contain user input and
    /// potentially sensitive data. Only enable in development or controlled environments.
    pub fn with_parameter_logging(mut self, enabled: bool) -> Self {
        self.log_parameters = enabled;
        self
    }

    /// Set a database name to include in spans.
    ///
    /// Useful when your application connects to multiple databases.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// Log every statement with its parameters and flag anything over 100ms.
    ///
    /// **Warning**: Do not use in production as it logs all SQL and parameters.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Info,
            slow_threshold: Duration::from_millis(100),
            log_parameters: true,
            database_name: None,
        }
    }

    /// Only failed statements and statements slower than one second.
    pub fn production() -> Self {
        Self {
            level: LogLevel::Warn,
            slow_threshold: Duration::from_secs(1),
            log_parameters: false,
            database_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = LoggerConfig::new()
            .with_level(LogLevel::Error)
            .with_slow_threshold(Duration::ZERO)
            .with_parameter_logging(true)
            .with_database_name("test_db");

        assert_eq!(config.level, LogLevel::Error);
        assert_eq!(config.slow_threshold, Duration::ZERO);
        assert!(config.log_parameters);
        assert_eq!(config.database_name, Some("test_db".to_string()));
    }

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.slow_threshold, Duration::from_millis(200));
        assert!(!config.log_parameters);
    }

    #[test]
    fn test_presets() {
        let dev = LoggerConfig::development();
        assert_eq!(dev.level, LogLevel::Info);
        assert!(dev.log_parameters);

        let prod = LoggerConfig::production();
        assert_eq!(prod.level, LogLevel::Warn);
        assert!(!prod.log_parameters);
        assert_eq!(prod.slow_threshold, Duration::from_secs(1));
    }
}
