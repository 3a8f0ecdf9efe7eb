//! Severity thresholds for SQL trace logging.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Gating level for trace output.
///
/// Levels are ordered `Silent < Error < Warn < Info`. A higher level lets more
/// trace events through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogLevel {
    /// Nothing is logged.
    Silent = 1,
    /// Only failed statements.
    Error = 2,
    /// Failed and slow statements.
    Warn = 3,
    /// Every statement.
    #[default]
    Info = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Silent => "silent",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            2 => LogLevel::Error,
            3 => LogLevel::Warn,
            4 => LogLevel::Info,
            _ => LogLevel::Silent,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`LogLevel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level `{0}` (expected silent, error, warn or info)")]
pub struct ParseLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// A [`LogLevel`] that can be swapped while other threads are reading it.
#[derive(Debug)]
pub(crate) struct AtomicLogLevel(AtomicU8);

impl AtomicLogLevel {
    pub(crate) fn new(level: LogLevel) -> Self {
        Self(AtomicU8::new(level as u8))
    }

    pub(crate) fn load(&self) -> LogLevel {
        LogLevel::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn store(&self, level: LogLevel) {
        self.0.store(level as u8, Ordering::Relaxed);
    }
}
