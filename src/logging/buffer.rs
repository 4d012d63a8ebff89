//! Pending-entry queue between callers and the flusher
//!
//! Producers push formatted lines without taking any lock; the single consumer
//! drains a snapshot of whatever is queued at that moment.

use std::sync::Mutex;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use super::level::Severity;

/// Component name used when the caller does not give one
pub const DEFAULT_COMPONENT: &str = "General";

/// Timestamp layout of the persisted line format
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Local wall-clock time the entry was created
    pub timestamp: DateTime<Local>,
    /// Severity the entry was gated at
    pub severity: Severity,
    /// Audit entries render with the AUDIT label
    pub audit: bool,
    /// Component that produced the entry
    pub component: Option<String>,
    /// Log message
    pub message: String,
}

impl LogEntry {
    /// Create a new log entry stamped with the current time
    pub fn new(severity: Severity, message: impl Into<String>, component: Option<&str>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            audit: false,
            component: component.map(str::to_string),
            message: message.into(),
        }
    }

    /// Create an audit entry; it is gated as Information
    pub fn audit(message: impl Into<String>, component: Option<&str>) -> Self {
        Self {
            audit: true,
            ..Self::new(Severity::Information, message, component)
        }
    }

    /// Label shown between brackets
    pub fn label(&self) -> &'static str {
        if self.audit {
            "AUDIT"
        } else {
            self.severity.as_str()
        }
    }

    /// Render as `[yyyy-MM-dd HH:mm:ss.fff] [LEVEL] component | message`
    pub fn format_line(&self) -> String {
        format!(
            "[{}] [{}] {} | {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.label(),
            self.component.as_deref().unwrap_or(DEFAULT_COMPONENT),
            self.message
        )
    }
}

/// Truncate a message to at most `max_chars` characters
pub(crate) fn truncate_message(message: String, max_chars: usize) -> String {
    const MARKER: &str = "... [truncated]";

    if max_chars == 0 || message.chars().count() <= max_chars {
        return message;
    }
    let mut truncated: String = message.chars().take(max_chars).collect();
    truncated.push_str(MARKER);
    truncated
}

/// Unbounded FIFO of formatted lines awaiting the next flush
pub struct LogBuffer {
    sender: mpsc::UnboundedSender<String>,
    /// Only the draining side locks this; producers never touch it
    receiver: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl LogBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Enqueue a line. Never blocks.
    pub fn push(&self, line: String) {
        // The receiver lives as long as self, so the channel cannot be closed here
        let _ = self.sender.send(line);
    }

    /// Remove and return every line queued at the moment of the call, oldest first.
    ///
    /// Lines pushed while the drain is running stay queued for the next drain.
    pub fn drain(&self) -> Vec<String> {
        self.drain_then(|| ()).0
    }

    /// Drain like [`LogBuffer::drain`] and run `next` before another drain can start
    pub(crate) fn drain_then<T>(&self, next: impl FnOnce() -> T) -> (Vec<String>, T) {
        let mut receiver = self.receiver.lock().unwrap_or_else(|e| e.into_inner());
        let snapshot = receiver.len();
        let mut lines = Vec::with_capacity(snapshot);
        for _ in 0..snapshot {
            match receiver.try_recv() {
                Ok(line) => lines.push(line),
                Err(_) => break,
            }
        }
        let after = next();
        drop(receiver);
        (lines, after)
    }

    /// Get the number of queued lines
    pub fn len(&self) -> usize {
        self.receiver
            .lock()
            .map(|r| r.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_format_line() {
        let entry = LogEntry::new(Severity::Warning, "disk almost full", Some("Storage"));
        let line = entry.format_line();

        assert!(line.starts_with('['));
        assert!(line.ends_with("] [WARN] Storage | disk almost full"));
        // "[yyyy-MM-dd HH:mm:ss.fff]" is 25 characters
        assert_eq!(&line[24..25], "]");
        assert_eq!(&line[20..21], ".");
    }

    #[test]
    fn test_format_line_default_component() {
        let entry = LogEntry::new(Severity::Information, "hello", None);
        assert!(entry.format_line().ends_with("[INFO] General | hello"));
    }

    #[test]
    fn test_audit_entry_label() {
        let entry = LogEntry::audit("AUDIT | Op | Success | done", Some("Scheduler"));
        assert_eq!(entry.severity, Severity::Information);
        assert_eq!(entry.label(), "AUDIT");
        assert!(entry.format_line().contains("[AUDIT] Scheduler | AUDIT | Op"));
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message("short".to_string(), 10), "short");
        assert_eq!(
            truncate_message("abcdefghij".to_string(), 4),
            "abcd... [truncated]"
        );
        assert_eq!(truncate_message("unlimited".to_string(), 0), "unlimited");
    }

    #[test]
    fn test_buffer_push_and_drain() {
        let buffer = LogBuffer::new();
        buffer.push("line 1".to_string());
        buffer.push("line 2".to_string());
        buffer.push("line 3".to_string());

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.drain(), vec!["line 1", "line 2", "line 3"]);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_drain_then_leaves_later_pushes_queued() {
        let buffer = LogBuffer::new();
        buffer.push("first".to_string());

        let (lines, ()) = buffer.drain_then(|| buffer.push("second".to_string()));

        assert_eq!(lines, vec!["first"]);
        assert_eq!(buffer.drain(), vec!["second"]);
    }

    #[test]
    fn test_concurrent_push_during_drain() {
        let buffer = Arc::new(LogBuffer::new());
        let producers: Vec<_> = (0..4)
            .map(|t| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..500 {
                        buffer.push(format!("{}:{}", t, i));
                    }
                })
            })
            .collect();

        let mut drained = Vec::new();
        while producers.iter().any(|p| !p.is_finished()) {
            drained.extend(buffer.drain());
        }
        for producer in producers {
            producer.join().unwrap();
        }
        drained.extend(buffer.drain());

        assert_eq!(drained.len(), 2000);
        let unique: HashSet<_> = drained.iter().collect();
        assert_eq!(unique.len(), 2000);

        // Each producer's lines come out in its own push order
        for t in 0..4 {
            let prefix = format!("{}:", t);
            let seq: Vec<usize> = drained
                .iter()
                .filter_map(|l| l.strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seq, (0..500).collect::<Vec<_>>());
        }
    }
}
