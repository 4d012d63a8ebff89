//! Test doubles shared by the unit tests

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use crossterm::style::Color;

use crate::audit::{AuditRecord, AuditStore, StoreError};
use crate::config::Config;
use crate::logging::Console;

/// Config pointing at `dir` with a flush period long enough not to interfere
pub fn test_config(dir: &Path) -> Config {
    Config {
        log_dir: dir.to_path_buf(),
        file_prefix: "Test".to_string(),
        flush_interval_ms: 60_000,
        ..Config::default()
    }
}

/// Lines of a log file; empty when the file does not exist yet
pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Records every line written to it
#[derive(Default)]
pub struct CaptureConsole {
    lines: Mutex<Vec<(String, Option<Color>)>>,
    fail: bool,
}

impl CaptureConsole {
    /// A console whose writes always fail
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn lines(&self) -> Vec<(String, Option<Color>)> {
        self.lines.lock().unwrap().clone()
    }
}

impl Console for CaptureConsole {
    fn write_line(&self, line: &str, color: Option<Color>) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"));
        }
        self.lines.lock().unwrap().push((line.to_string(), color));
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AuditRecord>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert_audit_record(&self, record: AuditRecord) -> Result<i64, StoreError> {
        self.records.lock().unwrap().push(record);
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Rejects every record with the same error message
pub struct FailingStore {
    message: String,
    calls: AtomicUsize,
}

impl FailingStore {
    /// Every insert fails with `StoreError::Unavailable(message)`
    pub fn unavailable(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditStore for FailingStore {
    async fn insert_audit_record(&self, _record: AuditRecord) -> Result<i64, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable(self.message.clone()))
    }
}

/// Panics inside every insert
pub struct PanickingStore;

#[async_trait]
impl AuditStore for PanickingStore {
    async fn insert_audit_record(&self, _record: AuditRecord) -> Result<i64, StoreError> {
        panic!("connection pool poisoned");
    }
}
