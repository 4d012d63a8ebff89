//! Append-only daily log file
//!
//! The file name is fixed when the service is constructed; a run that crosses
//! midnight keeps writing to the file it started with.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

/// Build `<logs_dir>/<prefix>_<YYYYMMDD>.log`
pub fn create_log_file_path(logs_dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    logs_dir.join(format!("{}_{}.log", prefix, date.format("%Y%m%d")))
}

/// The active log file plus the lock that serializes appends to it
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LogFile {
    /// Create the log directory if needed and pick today's file
    pub fn open(logs_dir: &Path, prefix: &str) -> Result<Self> {
        fs::create_dir_all(logs_dir).context("Failed to create logs directory")?;

        let path = create_log_file_path(logs_dir, prefix, Local::now().date_naive());
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the append lock; it is released when the writer is dropped
    pub(crate) fn writer(&self) -> LogFileWriter<'_> {
        LogFileWriter {
            _guard: self.write_lock.lock().unwrap_or_else(|e| e.into_inner()),
            path: &self.path,
        }
    }

}

/// Exclusive access to the active file for one append
pub(crate) struct LogFileWriter<'a> {
    _guard: MutexGuard<'a, ()>,
    path: &'a Path,
}

impl LogFileWriter<'_> {
    /// Append all lines in one write and release the lock
    pub fn append(self, lines: &[String]) -> io::Result<()> {
        let mut payload = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            payload.push_str(line);
            payload.push('\n');
        }

        let mut file = OpenOptions::new().create(true).append(true).open(self.path)?;
        file.write_all(payload.as_bytes())?;
        file.flush()
    }
}
