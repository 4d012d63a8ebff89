//! Retention logger - buffered file logging and audit trail for the email
//! retention compliance tool
//!
//! A [`LogService`] filters, formats and mirrors log calls to the console,
//! queues them, and flushes the queue to a daily file in the background.
//! Audit events are additionally handed to an [`AuditStore`] without ever
//! blocking or failing the caller.

pub mod audit;
pub mod config;
pub mod logging;

#[cfg(test)]
mod testing;

pub use audit::{AuditEvent, AuditRecord, AuditStore, JsonlAuditStore, StoreError};
pub use config::Config;
pub use logging::{LogService, Severity, TimedOperation};
