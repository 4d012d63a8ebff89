//! The log service façade
//!
//! One explicitly constructed [`LogService`] owns the level filter, console
//! mirror, pending queue, periodic flusher and audit sink. Callers share it by
//! reference (or `Arc`); there is no process-wide logger.
//!
//! Lifecycle: [`LogService::new`] creates the log directory and starts the
//! flusher. [`LogService::shutdown`] stops the flusher, flushes once more and
//! marks the service disposed; later calls are ignored. Dropping the service
//! without calling `shutdown` does the same synchronously.

use std::error::Error;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use uuid::Uuid;

use super::console::{Console, NullConsole, StdoutConsole};
use super::file_writer::LogFile;
use super::flusher::Flusher;
use super::layer::LogServiceLayer;
use super::level::{LevelFilter, Severity};
use super::pipeline::Pipeline;
use super::retention::cleanup_old_logs;
use super::timer::TimedOperation;
use crate::audit::{AuditEvent, AuditSink, AuditStore};
use crate::config::Config;

/// Buffered file logger with console mirror and audit dual-write
pub struct LogService {
    pipeline: Arc<Pipeline>,
    audit: AuditSink,
    flusher: Flusher,
    shutdown_started: AtomicBool,
}

impl LogService {
    /// Create a service that mirrors to stdout when `console_output` is set.
    ///
    /// Must be called from within a Tokio runtime; the runtime drives the
    /// periodic flush and audit submissions, while logging itself works from
    /// any thread.
    pub fn new(config: &Config, store: Option<Arc<dyn AuditStore>>) -> Result<Self> {
        let console: Arc<dyn Console> = if config.console_output {
            Arc::new(StdoutConsole)
        } else {
            Arc::new(NullConsole)
        };
        Self::with_console(config, store, console)
    }

    /// Create a service with a caller-supplied console
    pub fn with_console(
        config: &Config,
        store: Option<Arc<dyn AuditStore>>,
        console: Arc<dyn Console>,
    ) -> Result<Self> {
        let runtime =
            Handle::try_current().context("LogService must be created inside a Tokio runtime")?;

        let log_dir = config.resolved_log_dir();
        let file = LogFile::open(&log_dir, &config.file_prefix)?;

        if let Some(days) = config.retention_days {
            match cleanup_old_logs(&log_dir, &config.file_prefix, days) {
                Ok(0) => {}
                Ok(count) => tracing::info!("Cleaned up {} old log files", count),
                Err(e) => tracing::warn!("Log retention cleanup failed: {:#}", e),
            }
        }

        let pipeline = Arc::new(Pipeline::new(
            LevelFilter::new(config.threshold()),
            console,
            file,
            config.max_entry_length,
        ));
        let flusher = Flusher::spawn(Arc::clone(&pipeline), config.flush_interval(), &runtime);
        let audit = AuditSink::new(store, runtime);

        tracing::debug!(path = %pipeline.file().path().display(), "Log service started");

        Ok(Self {
            pipeline,
            audit,
            flusher,
            shutdown_started: AtomicBool::new(false),
        })
    }

    /// Log a message. Entries below the threshold cost nothing beyond the check.
    pub fn log(&self, severity: Severity, message: impl Into<String>, component: Option<&str>) {
        self.pipeline.log(severity, message, component);
    }

    /// Log at Debug
    pub fn debug(&self, message: impl Into<String>, component: Option<&str>) {
        self.log(Severity::Debug, message, component);
    }

    /// Log at Information
    pub fn info(&self, message: impl Into<String>, component: Option<&str>) {
        self.log(Severity::Information, message, component);
    }

    /// Log at Warning
    pub fn warn(&self, message: impl Into<String>, component: Option<&str>) {
        self.log(Severity::Warning, message, component);
    }

    /// Log an error, appending ` | Exception: <error>` when one is given
    pub fn error(
        &self,
        message: impl Into<String>,
        error: Option<&dyn Error>,
        component: Option<&str>,
    ) {
        self.pipeline.log_with(Severity::Error, component, || match error {
            Some(e) => format!("{} | Exception: {}", message.into(), e),
            None => message.into(),
        });
    }

    /// Log a critical failure with its cause
    pub fn critical(&self, message: impl Into<String>, error: &dyn Error, component: Option<&str>) {
        self.pipeline.log_with(Severity::Critical, component, || {
            format!("{} | Critical Exception: {}", message.into(), error)
        });
    }

    /// Record an audit event: an AUDIT line in the text log, plus a structured
    /// record submitted to the store in the background when one is configured.
    ///
    /// Never blocks on, or fails because of, the store.
    pub fn audit_event(&self, event: AuditEvent) {
        if self.pipeline.is_disposed() {
            return;
        }
        self.pipeline
            .log_audit(event.text_line(), event.component.as_deref());
        self.audit.submit(event, Arc::clone(&self.pipeline));
    }

    /// Start timing an operation; completion is logged when the guard is dropped
    pub fn begin_timed_operation(
        &self,
        operation_name: impl Into<String>,
        component: Option<&str>,
    ) -> TimedOperation {
        TimedOperation::start(Arc::clone(&self.pipeline), operation_name, component)
    }

    /// Run `f` inside a timed operation
    pub fn timed<T>(
        &self,
        operation_name: impl Into<String>,
        component: Option<&str>,
        f: impl FnOnce() -> T,
    ) -> T {
        let _operation = self.begin_timed_operation(operation_name, component);
        f()
    }

    /// Current threshold; `None` means everything is filtered
    pub fn threshold(&self) -> Option<Severity> {
        self.pipeline.filter().threshold()
    }

    /// Change the threshold for subsequent calls
    pub fn set_threshold(&self, threshold: Option<Severity>) {
        self.pipeline.filter().set(threshold);
    }

    /// Whether an entry of this severity would currently be written
    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.pipeline.enabled(severity)
    }

    /// Append everything queued so far to the log file
    pub async fn flush(&self) {
        if !self.pipeline.is_disposed() {
            self.write_pending().await;
        }
    }

    async fn write_pending(&self) {
        let pipeline = Arc::clone(&self.pipeline);
        if tokio::task::spawn_blocking(move || pipeline.flush())
            .await
            .is_err()
        {
            self.pipeline.flush();
        }
    }

    /// Synchronous variant of [`LogService::flush`]
    pub fn flush_blocking(&self) {
        if !self.pipeline.is_disposed() {
            self.pipeline.flush();
        }
    }

    /// Stop the periodic flush, write what is left and refuse further work.
    ///
    /// Audit submissions still running are not waited for; use
    /// [`LogService::audits_settled`] first when they matter.
    pub async fn shutdown(&self) {
        if self.shutdown_started.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(task) = self.flusher.stop() {
            let _ = task.await;
        }
        // Refuse new entries first so nothing lands after the final drain
        self.pipeline.mark_disposed();
        self.write_pending().await;

        tracing::debug!("Log service disposed");
    }

    /// Whether disposal has completed
    pub fn is_disposed(&self) -> bool {
        self.pipeline.is_disposed()
    }

    /// Number of entries waiting for the next flush
    pub fn pending(&self) -> usize {
        self.pipeline.pending()
    }

    /// Path of the active log file
    pub fn log_file_path(&self) -> &Path {
        self.pipeline.file().path()
    }

    /// Session id stamped on this service's audit records
    pub fn session_id(&self) -> Uuid {
        self.audit.session_id()
    }

    /// Number of audit submissions still running
    pub fn audits_in_flight(&self) -> usize {
        self.audit.in_flight()
    }

    /// Wait for every audit submission started so far
    pub async fn audits_settled(&self) {
        self.audit.settled().await;
    }

    /// A `tracing` layer that writes events through this service
    pub fn tracing_layer(&self) -> LogServiceLayer {
        LogServiceLayer::new(Arc::clone(&self.pipeline))
    }
}

impl Drop for LogService {
    fn drop(&mut self) {
        if self.shutdown_started.swap(true, Ordering::AcqRel) {
            return;
        }
        self.flusher.stop();
        self.pipeline.mark_disposed();
        self.pipeline.flush();
    }
}
