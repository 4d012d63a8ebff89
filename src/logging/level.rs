//! Severity levels and the per-service threshold

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Ordered importance of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug = 0,
    Information = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

impl Severity {
    /// Label used in the persisted line format
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Information => "INFO",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Name used in persisted audit records
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Debug => "Debug",
            Severity::Information => "Information",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Critical => "Critical",
        }
    }

    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Severity::Debug),
            1 => Some(Severity::Information),
            2 => Some(Severity::Warning),
            3 => Some(Severity::Error),
            4 => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Information,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

/// Error returned when a severity name is not recognised
#[derive(Debug, thiserror::Error)]
#[error("unknown severity '{0}'")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Severity::Debug),
            "info" | "information" => Ok(Severity::Information),
            "warn" | "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" | "fatal" => Ok(Severity::Critical),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Marker for "nothing passes"
const OFF: u8 = 5;

/// Mutable minimum-severity threshold shared by every ingestion path
#[derive(Debug)]
pub struct LevelFilter {
    min: AtomicU8,
}

impl LevelFilter {
    /// Create a filter; `None` disables all output
    pub fn new(min: Option<Severity>) -> Self {
        Self {
            min: AtomicU8::new(encode(min)),
        }
    }

    /// Whether an entry of this severity passes the current threshold
    #[inline]
    pub fn allows(&self, severity: Severity) -> bool {
        (severity as u8) >= self.min.load(Ordering::Relaxed)
    }

    /// Current threshold, `None` when off
    pub fn threshold(&self) -> Option<Severity> {
        Severity::from_u8(self.min.load(Ordering::Relaxed))
    }

    /// Replace the threshold. Only calls made after this return observe it.
    pub fn set(&self, min: Option<Severity>) {
        self.min.store(encode(min), Ordering::Relaxed);
    }
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self::new(Some(Severity::Information))
    }
}

fn encode(min: Option<Severity>) -> u8 {
    min.map(|s| s as u8).unwrap_or(OFF)
}
