//! Configuration management for the retention logger

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::Severity;

/// Categories of disk errors for user-friendly messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskErrorKind {
    /// Disk is full or quota exceeded
    DiskFull,
    /// Permission denied (read or write)
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// Other IO error
    Other,
}

impl DiskErrorKind {
    /// Get a user-friendly message for this error kind
    pub fn user_message(&self) -> &'static str {
        match self {
            DiskErrorKind::DiskFull => "Disk full - free space needed to write logs",
            DiskErrorKind::PermissionDenied => "Permission denied writing to the log directory",
            DiskErrorKind::NotFound => "Log file or directory not found",
            DiskErrorKind::Other => "Failed to write log file",
        }
    }
}

/// Categorize an IO error into a user-friendly category
pub fn categorize_io_error(e: &std::io::Error) -> DiskErrorKind {
    use std::io::ErrorKind;

    match e.kind() {
        ErrorKind::StorageFull | ErrorKind::WriteZero => DiskErrorKind::DiskFull,
        ErrorKind::PermissionDenied => DiskErrorKind::PermissionDenied,
        ErrorKind::NotFound => DiskErrorKind::NotFound,
        _ => {
            #[cfg(unix)]
            {
                if let Some(os_error) = e.raw_os_error() {
                    // ENOSPC = 28, EDQUOT = 122 (Linux) / 69 (macOS)
                    if os_error == 28 || os_error == 122 || os_error == 69 {
                        return DiskErrorKind::DiskFull;
                    }
                    // EACCES
                    if os_error == 13 {
                        return DiskErrorKind::PermissionDenied;
                    }
                }
            }
            DiskErrorKind::Other
        }
    }
}

/// Create a user-friendly error message from an IO error
pub fn friendly_io_error_message(e: &std::io::Error, context: &str) -> String {
    match categorize_io_error(e) {
        DiskErrorKind::Other => format!("{}: {}", context, e),
        kind => format!("{}: {}", context, kind.user_message()),
    }
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory that receives the daily log files. `~` is expanded.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// File name prefix; files are named `<prefix>_<YYYYMMDD>.log`
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Period of the background flush in milliseconds (default: 5000)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Minimum severity: "debug", "info", "warn", "error", "critical" or "off"
    #[serde(default = "default_min_level")]
    pub min_level: String,

    /// Mirror every accepted entry to stdout
    #[serde(default = "default_console_output")]
    pub console_output: bool,

    /// Messages longer than this many characters are truncated (default: 10000)
    #[serde(default = "default_max_entry_length")]
    pub max_entry_length: usize,

    /// Delete this logger's own log files older than this many days.
    /// Unset keeps log files forever.
    #[serde(default)]
    pub retention_days: Option<u64>,

    /// Local JSON-lines audit store used when no external store is wired in
    #[serde(default)]
    pub audit_store_path: Option<PathBuf>,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("Logs")
}

fn default_file_prefix() -> String {
    "EmailRetention".to_string()
}

fn default_flush_interval_ms() -> u64 {
    5_000
}

fn default_min_level() -> String {
    "info".to_string()
}

fn default_console_output() -> bool {
    true
}

fn default_max_entry_length() -> usize {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            file_prefix: default_file_prefix(),
            flush_interval_ms: default_flush_interval_ms(),
            min_level: default_min_level(),
            console_output: default_console_output(),
            max_entry_length: default_max_entry_length(),
            retention_days: None,
            audit_store_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific file, or return default if it does not exist
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Log directory with `~` and environment variables expanded
    pub fn resolved_log_dir(&self) -> PathBuf {
        let raw = self.log_dir.to_string_lossy();
        match shellexpand::full(&raw) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => self.log_dir.clone(),
        }
    }

    /// Flush period as a `Duration`. Zero is bumped to one millisecond.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    /// Parse `min_level` into a threshold; `None` means logging is off.
    ///
    /// Unknown values fall back to Information.
    pub fn threshold(&self) -> Option<Severity> {
        match parse_threshold(&self.min_level) {
            Ok(threshold) => threshold,
            Err(_) => {
                tracing::warn!("Unknown min_level '{}', using info", self.min_level);
                Some(Severity::Information)
            }
        }
    }
}

/// Parse a threshold string. `Ok(None)` means "off".
pub fn parse_threshold(value: &str) -> Result<Option<Severity>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => Ok(None),
        other => Ok(Some(other.parse::<Severity>()?)),
    }
}

/// Get the base configuration directory (~/.retention-logger)
/// Falls back to ./.retention-logger if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".retention-logger")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".retention-logger"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
