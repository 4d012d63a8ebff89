//! `tracing` integration
//!
//! Forwards events recorded with the `tracing` macros into a log service, so
//! they reach the same console mirror and daily file.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::level::Severity;
use super::pipeline::Pipeline;

/// Targets of this crate's own pipeline diagnostics; forwarding them would loop
const INTERNAL_TARGETS: &[&str] = &["retention_logger::logging", "retention_logger::audit"];

/// Layer that feeds `tracing` events into a [`LogService`](super::LogService)
pub struct LogServiceLayer {
    pipeline: Arc<Pipeline>,
}

impl LogServiceLayer {
    pub(crate) fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

impl<S: Subscriber> Layer<S> for LogServiceLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if INTERNAL_TARGETS.iter().any(|t| target.starts_with(t)) {
            return;
        }

        let severity = Severity::from(*metadata.level());
        self.pipeline.log_with(severity, Some(target), || {
            let mut visitor = MessageVisitor::default();
            event.record(&mut visitor);
            visitor.finish()
        });
    }
}

/// Collects the `message` field and renders the rest as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        let mut out = self.message.unwrap_or_default();
        for field in self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&field);
        }
        out
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
