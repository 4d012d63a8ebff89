//! Timed operation scopes
//!
//! A [`TimedOperation`] logs a Debug entry when it starts and another with the
//! elapsed time when it completes. Completion happens at most once, either
//! explicitly through [`TimedOperation::complete`] or when the guard is dropped,
//! so early returns and panics are covered.

use std::sync::Arc;
use std::time::Instant;

use super::level::Severity;
use super::pipeline::Pipeline;

/// Guard measuring one operation
#[must_use = "the operation is timed until this guard is dropped"]
pub struct TimedOperation {
    pipeline: Arc<Pipeline>,
    operation_name: String,
    component: Option<String>,
    started_at: Instant,
    completed: bool,
}

impl TimedOperation {
    pub(crate) fn start(
        pipeline: Arc<Pipeline>,
        operation_name: impl Into<String>,
        component: Option<&str>,
    ) -> Self {
        let operation_name = operation_name.into();
        pipeline.log_with(Severity::Debug, component, || {
            format!("Started operation: {}", operation_name)
        });

        Self {
            pipeline,
            operation_name,
            component: component.map(str::to_string),
            started_at: Instant::now(),
            completed: false,
        }
    }

    /// Log the completion entry. Later calls, including the one from `Drop`, do nothing.
    pub fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;

        let elapsed_ms = self.started_at.elapsed().as_secs_f64() * 1000.0;
        let name = &self.operation_name;
        self.pipeline
            .log_with(Severity::Debug, self.component.as_deref(), || {
                format!("Completed operation: {} in {:.2}ms", name, elapsed_ms)
            });
    }
}

impl Drop for TimedOperation {
    fn drop(&mut self) {
        self.complete();
    }
}
