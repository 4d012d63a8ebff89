//! Audit trail
//!
//! Compliance-relevant operations are written twice: once as an AUDIT line in
//! the text log, and once as a structured [`AuditRecord`] handed to an
//! [`AuditStore`] in the background. The text line never depends on the store.

mod sink;
mod store;

pub(crate) use sink::AuditSink;
pub use store::{AuditStore, JsonlAuditStore, StoreError};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logging::Severity;

/// Well-known operation types
pub mod operation {
    pub const AUTHENTICATION: &str = "Authentication";
    pub const METADATA_EXTRACTION: &str = "MetadataExtraction";
    pub const POLICY_CHECK: &str = "PolicyCheck";
    pub const DATABASE_OPERATION: &str = "DatabaseOperation";
    pub const CONFIGURATION_CHANGE: &str = "ConfigurationChange";
    pub const RETENTION_POLICY_EXECUTION: &str = "RetentionPolicyExecution";
    pub const COMPLIANCE_REPORT: &str = "ComplianceReport";
    pub const SYSTEM_STARTUP: &str = "SystemStartup";
    pub const SYSTEM_SHUTDOWN: &str = "SystemShutdown";
    pub const ERROR_RECOVERY: &str = "ErrorRecovery";
}

/// Well-known operation results
pub mod result {
    pub const SUCCESS: &str = "Success";
    pub const WARNING: &str = "Warning";
    pub const ERROR: &str = "Error";
    pub const INFORMATION: &str = "Information";
}

/// Column limits of the audit table
mod limits {
    pub const OPERATION_TYPE: usize = 100;
    pub const DESCRIPTION: usize = 1000;
    pub const RESULT: usize = 20;
    pub const COMPONENT: usize = 100;
    pub const USER_ID: usize = 255;
    pub const SEVERITY: usize = 20;
    pub const MACHINE_NAME: usize = 100;
    pub const APPLICATION_VERSION: usize = 20;
}

/// Component stored when the caller does not give one
const UNKNOWN_COMPONENT: &str = "Unknown";

/// One audit call as made by the application
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub operation_type: String,
    pub description: String,
    pub result: String,
    pub component: Option<String>,
    pub user_id: Option<String>,
    pub records_processed: Option<u64>,
    pub duration_ms: Option<u64>,
    pub error_details: Option<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AuditEvent {
    /// Start an event with its operation type, description and result
    pub fn new(
        operation_type: impl Into<String>,
        description: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            operation_type: operation_type.into(),
            description: description.into(),
            result: result.into(),
            component: None,
            user_id: None,
            records_processed: None,
            duration_ms: None,
            error_details: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Component that performed the operation; stored as `Unknown` when unset
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// User on whose behalf the operation ran
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Number of records processed; also shown in the text line
    pub fn records(mut self, records_processed: u64) -> Self {
        self.records_processed = Some(records_processed);
        self
    }

    /// Duration of the operation, stored in whole milliseconds
    pub fn duration(mut self, duration: std::time::Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    /// Failure details stored with the record
    pub fn error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }

    /// Attach one metadata pair; a repeated key replaces the earlier value
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// `AUDIT | op | result | description [| Records: N]`
    pub fn text_line(&self) -> String {
        let mut line = format!(
            "AUDIT | {} | {} | {}",
            self.operation_type, self.result, self.description
        );
        if let Some(records) = self.records_processed {
            line.push_str(&format!(" | Records: {}", records));
        }
        line
    }

    /// Error when the result is "Error" in any case, Information otherwise
    pub fn severity(&self) -> Severity {
        if self.result.eq_ignore_ascii_case(result::ERROR) {
            Severity::Error
        } else {
            Severity::Information
        }
    }
}

/// Process-wide stamps added to every persisted record
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub machine_name: Option<String>,
    pub application_version: Option<String>,
    pub session_id: Uuid,
}

impl RecordContext {
    /// Stamps for the running process
    pub fn current() -> Self {
        Self {
            machine_name: machine_name(),
            application_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            session_id: Uuid::new_v4(),
        }
    }
}

/// Host name from the environment, then `/etc/hostname`
fn machine_name() -> Option<String> {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .chain(std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
}

/// Structured audit row handed to an [`AuditStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub operation_type: String,
    pub description: String,
    pub result: String,
    pub component: String,
    pub user_id: Option<String>,
    pub session_id: Option<Uuid>,
    pub records_processed: Option<u64>,
    pub duration_ms: Option<u64>,
    pub error_details: Option<String>,
    /// Metadata serialized as a JSON object
    pub metadata: Option<String>,
    pub severity: String,
    pub machine_name: Option<String>,
    pub application_version: Option<String>,
}

impl AuditRecord {
    /// Build the persisted form of an event, clamping text to the column limits
    pub fn from_event(event: AuditEvent, context: &RecordContext) -> Self {
        let severity = event.severity();
        let metadata = if event.metadata.is_empty() {
            None
        } else {
            serde_json::to_string(&event.metadata).ok()
        };

        Self {
            timestamp: Utc::now(),
            operation_type: clamp(event.operation_type, limits::OPERATION_TYPE),
            description: clamp(event.description, limits::DESCRIPTION),
            result: clamp(event.result, limits::RESULT),
            component: clamp(
                event
                    .component
                    .unwrap_or_else(|| UNKNOWN_COMPONENT.to_string()),
                limits::COMPONENT,
            ),
            user_id: event.user_id.map(|u| clamp(u, limits::USER_ID)),
            session_id: Some(context.session_id),
            records_processed: event.records_processed,
            duration_ms: event.duration_ms,
            error_details: event.error_details,
            metadata,
            severity: clamp(severity.name().to_string(), limits::SEVERITY),
            machine_name: context
                .machine_name
                .clone()
                .map(|m| clamp(m, limits::MACHINE_NAME)),
            application_version: context
                .application_version
                .clone()
                .map(|v| clamp(v, limits::APPLICATION_VERSION)),
        }
    }
}

fn clamp(value: String, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value
    } else {
        value.chars().take(max_chars).collect()
    }
}
