//! Buffered file logging
//!
//! Accepted entries are mirrored to the console right away and queued; a
//! background flusher appends the queue to a daily file on a fixed period.

mod buffer;
mod console;
mod file_writer;
mod flusher;
mod layer;
mod level;
mod pipeline;
mod retention;
mod service;
mod timer;

pub use buffer::{LogBuffer, LogEntry, DEFAULT_COMPONENT};
pub use console::{color_for, Console, NullConsole, StdoutConsole};
pub use file_writer::{create_log_file_path, LogFile};
pub use layer::LogServiceLayer;
pub use level::{LevelFilter, ParseSeverityError, Severity};
pub use pipeline::LOGGER_COMPONENT;
pub use retention::cleanup_old_logs;
pub use service::LogService;
pub use timer::TimedOperation;

pub(crate) use pipeline::Pipeline;
