//! Log file retention management
//!
//! Removes this logger's own daily files once they pass the configured age.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::Result;

/// Whether a file name belongs to the daily files written under `prefix`
fn is_own_log_file(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|rest| rest.ends_with(".log"))
}

/// Clean up `<prefix>_*.log` files older than the specified number of days
///
/// Returns the number of files deleted.
pub fn cleanup_old_logs(logs_dir: &Path, prefix: &str, retention_days: u64) -> Result<usize> {
    if !logs_dir.exists() {
        return Ok(0);
    }

    let retention_duration = Duration::from_secs(retention_days.saturating_mul(24 * 60 * 60));
    let cutoff = SystemTime::now()
        .checked_sub(retention_duration)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut deleted_count = 0;

    for entry in fs::read_dir(logs_dir)? {
        let entry = entry?;
        let path = entry.path();

        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if is_own_log_file(name, prefix) => {}
            _ => continue,
        }

        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            if modified < cutoff && fs::remove_file(&path).is_ok() {
                deleted_count += 1;
            }
        }
    }

    Ok(deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let count = cleanup_old_logs(temp_dir.path(), "EmailRetention", 7).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cleanup_nonexistent_dir() {
        let path = Path::new("/nonexistent/path/for/testing");
        let count = cleanup_old_logs(path, "EmailRetention", 7).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_is_own_log_file() {
        assert!(is_own_log_file("EmailRetention_20240101.log", "EmailRetention"));
        assert!(!is_own_log_file("EmailRetention_20240101.txt", "EmailRetention"));
        assert!(!is_own_log_file("EmailRetentionX_20240101.log", "EmailRetention"));
        assert!(!is_own_log_file("Other_20240101.log", "EmailRetention"));
    }

    #[test]
    fn test_zero_day_retention_removes_only_own_files() {
        let temp_dir = TempDir::new().unwrap();

        let own = temp_dir.path().join("EmailRetention_20200101.log");
        File::create(&own).unwrap().write_all(b"old").unwrap();
        let other = temp_dir.path().join("other.log");
        File::create(&other).unwrap().write_all(b"keep").unwrap();

        std::thread::sleep(Duration::from_millis(20));
        let count = cleanup_old_logs(temp_dir.path(), "EmailRetention", 0).unwrap();

        assert_eq!(count, 1);
        assert!(!own.exists());
        assert!(other.exists());
    }

    #[test]
    fn test_huge_retention_keeps_everything() {
        let temp_dir = TempDir::new().unwrap();
        let log_file = temp_dir.path().join("EmailRetention_20000101.log");
        File::create(&log_file).unwrap().write_all(b"kept").unwrap();

        let count = cleanup_old_logs(temp_dir.path(), "EmailRetention", u64::MAX).unwrap();
        assert_eq!(count, 0);
        assert!(log_file.exists());
    }

    #[test]
    fn test_cleanup_keeps_recent_files() {
        let temp_dir = TempDir::new().unwrap();

        let log_file = temp_dir.path().join("EmailRetention_20260101.log");
        File::create(&log_file)
            .unwrap()
            .write_all(b"test log content")
            .unwrap();

        let count = cleanup_old_logs(temp_dir.path(), "EmailRetention", 7).unwrap();
        assert_eq!(count, 0);
        assert!(log_file.exists());
    }
}
