//! Console mirror for accepted log entries

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

use super::buffer::LogEntry;
use super::level::Severity;

/// Line-oriented console with a settable foreground color
pub trait Console: Send + Sync {
    /// Write one line. Implementations must restore the default color even
    /// when the write itself fails.
    fn write_line(&self, line: &str, color: Option<Color>) -> io::Result<()>;
}

/// Foreground color for an entry; `None` keeps the terminal default
pub fn color_for(entry: &LogEntry) -> Option<Color> {
    if entry.audit {
        return Some(Color::Green);
    }
    match entry.severity {
        Severity::Error | Severity::Critical => Some(Color::Red),
        Severity::Warning => Some(Color::Yellow),
        Severity::Debug => Some(Color::DarkGrey),
        Severity::Information => None,
    }
}

/// Writes to the process's stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn write_line(&self, line: &str, color: Option<Color>) -> io::Result<()> {
        write_colored(&mut io::stdout().lock(), line, color)
    }
}

/// Write one line in `color`, resetting the color even when the line fails
fn write_colored(out: &mut impl Write, line: &str, color: Option<Color>) -> io::Result<()> {
    let Some(color) = color else {
        writeln!(out, "{}", line)?;
        return out.flush();
    };

    let written = queue!(out, SetForegroundColor(color), Print(line));
    let reset = queue!(out, ResetColor, Print("\n"));
    let flushed = out.flush();
    written.and(reset).and(flushed)
}

/// Discards everything; used when console output is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConsole;

impl Console for NullConsole {
    fn write_line(&self, _line: &str, _color: Option<Color>) -> io::Result<()> {
        Ok(())
    }
}
