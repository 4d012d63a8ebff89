//! Ingestion front and flush step shared by every entry point

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use crossterm::style::Color;

use super::buffer::{truncate_message, LogBuffer, LogEntry};
use super::console::{color_for, Console};
use super::file_writer::LogFile;
use super::level::{LevelFilter, Severity};
use crate::config::friendly_io_error_message;

/// Component name used for the logger's own reports
pub const LOGGER_COMPONENT: &str = "FileLoggerService";

/// Filter, console mirror, pending queue and active file of one service
pub(crate) struct Pipeline {
    filter: LevelFilter,
    console: Arc<dyn Console>,
    buffer: LogBuffer,
    file: LogFile,
    max_entry_length: usize,
    disposed: AtomicBool,
}

impl Pipeline {
    pub fn new(
        filter: LevelFilter,
        console: Arc<dyn Console>,
        file: LogFile,
        max_entry_length: usize,
    ) -> Self {
        Self {
            filter,
            console,
            buffer: LogBuffer::new(),
            file,
            max_entry_length,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn filter(&self) -> &LevelFilter {
        &self.filter
    }

    pub fn file(&self) -> &LogFile {
        &self.file
    }

    /// Whether an entry of this severity would be accepted right now
    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        !self.disposed.load(Ordering::Acquire) && self.filter.allows(severity)
    }

    pub fn log(&self, severity: Severity, message: impl Into<String>, component: Option<&str>) {
        if !self.enabled(severity) {
            return;
        }
        let message = truncate_message(message.into(), self.max_entry_length);
        self.ingest(LogEntry::new(severity, message, component));
    }

    /// Like [`Pipeline::log`], but the message is only built when it passes the filter
    pub fn log_with<F>(&self, severity: Severity, component: Option<&str>, message: F)
    where
        F: FnOnce() -> String,
    {
        if self.enabled(severity) {
            self.log(severity, message(), component);
        }
    }

    /// Audit lines are labelled AUDIT and written whatever the threshold
    pub fn log_audit(&self, message: String, component: Option<&str>) {
        if self.is_disposed() {
            return;
        }
        let message = truncate_message(message, self.max_entry_length);
        self.ingest(LogEntry::audit(message, component));
    }

    /// Write an entry whatever the threshold; used for failures the logger
    /// reports about itself
    pub fn log_unfiltered(&self, severity: Severity, message: String, component: Option<&str>) {
        if self.is_disposed() {
            return;
        }
        let message = truncate_message(message, self.max_entry_length);
        self.ingest(LogEntry::new(severity, message, component));
    }

    fn ingest(&self, entry: LogEntry) {
        let line = entry.format_line();
        // Console trouble must not keep the entry out of the file
        let _ = self.console.write_line(&line, color_for(&entry));
        self.buffer.push(line);
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drain the queue and append it to the active file.
    ///
    /// Returns the number of lines written. On I/O failure the drained batch is
    /// dropped and the failure goes to the console only.
    pub fn flush(&self) -> usize {
        if self.buffer.is_empty() {
            return 0;
        }

        // The append lock is taken before the next drain can start, so
        // batches reach the file in drain order
        let (lines, writer) = self.buffer.drain_then(|| self.file.writer());
        if lines.is_empty() {
            return 0;
        }

        match writer.append(&lines) {
            Ok(()) => lines.len(),
            Err(e) => {
                let report = format!(
                    "[{}] [ERROR] {} | {} ({} entries dropped)",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    LOGGER_COMPONENT,
                    friendly_io_error_message(&e, "Failed to write to log file"),
                    lines.len()
                );
                let _ = self.console.write_line(&report, Some(Color::Red));
                0
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn mark_disposed(&self) {
        self.disposed.store(true, Ordering::Release);
    }
}
