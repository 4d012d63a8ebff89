//! Background submission of audit records

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use super::{AuditEvent, AuditRecord, AuditStore, RecordContext};
use crate::logging::{Pipeline, Severity, LOGGER_COMPONENT};

/// Submits audit records to an optional store without blocking the caller
pub(crate) struct AuditSink {
    store: Option<Arc<dyn AuditStore>>,
    context: RecordContext,
    tracker: TaskTracker,
    runtime: Handle,
}

impl AuditSink {
    pub(crate) fn new(store: Option<Arc<dyn AuditStore>>, runtime: Handle) -> Self {
        Self {
            store,
            context: RecordContext::current(),
            tracker: TaskTracker::new(),
            runtime,
        }
    }

    /// Session id stamped on every record of this sink
    pub fn session_id(&self) -> Uuid {
        self.context.session_id
    }

    /// Number of submissions still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Build and store the record on a background task.
    ///
    /// A store failure, including a panic inside the store, becomes one Error
    /// entry in the text log whatever the threshold.
    pub(crate) fn submit(&self, event: AuditEvent, pipeline: Arc<Pipeline>) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let context = self.context.clone();

        self.tracker.spawn_on(
            async move {
                let record = AuditRecord::from_event(event, &context);
                let failure = match AssertUnwindSafe(store.insert_audit_record(record))
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(id)) => {
                        tracing::debug!(audit_id = id, "Audit record stored");
                        return;
                    }
                    Ok(Err(e)) => e.to_string(),
                    Err(panic) => format!("audit store panicked: {}", panic_message(&*panic)),
                };
                pipeline.log_unfiltered(
                    Severity::Error,
                    format!("Failed to write audit log to database: {}", failure),
                    Some(LOGGER_COMPONENT),
                );
            },
            &self.runtime,
        );
    }

    /// Wait until every submission started so far has finished
    pub async fn settled(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
