//! Append-only event log.
//!
//! Every component reports what it did through an [`EventSink`]. The file
//! sink writes one `[YYYY-MM-DD HH:MM:SS] <message>` line per event and never
//! truncates; the memory sink keeps events for inspection in tests.

use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Timestamp layout of a log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Capability to record an event message.
pub trait EventSink {
    /// Appends one message. Must not fail the caller.
    fn append(&mut self, message: &str);
}

/// A single recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: NaiveDateTime,
    pub message: String,
}

impl LogEvent {
    /// Stamps `message` with the current local time.
    pub fn now(message: &str) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            message: message.to_string(),
        }
    }

    /// Renders the event as a log line, without the trailing newline.
    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }
}

/// Log file sink. Opens the file in append mode for each event.
#[derive(Debug, Clone)]
pub struct FileLog {
    path: PathBuf,
}

impl FileLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_lines(&self, lines: &[String]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut buffer = String::new();
        for line in lines {
            buffer.push_str(line);
            buffer.push('\n');
        }
        // Single write per event keeps lines whole.
        file.write_all(buffer.as_bytes())
    }
}

impl EventSink for FileLog {
    fn append(&mut self, message: &str) {
        let lines: Vec<String> = split_lines(message)
            .map(|line| LogEvent::now(line).render())
            .collect();
        if let Err(e) = self.write_lines(&lines) {
            tracing::warn!(path = %self.path.display(), error = %e, "Could not write to log file");
        }
    }
}

/// In-memory sink.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    events: Vec<LogEvent>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Messages in emission order.
    pub fn messages(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.message.as_str()).collect()
    }

    /// Number of messages starting with `prefix`.
    pub fn count_prefixed(&self, prefix: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.message.starts_with(prefix))
            .count()
    }
}

impl EventSink for MemoryLog {
    fn append(&mut self, message: &str) {
        self.events
            .extend(split_lines(message).map(LogEvent::now));
    }
}

// A blank message still yields one (empty) event.
fn split_lines(message: &str) -> impl Iterator<Item = &str> {
    let mut lines = message.lines().peekable();
    let empty = lines.peek().is_none();
    lines.chain(empty.then_some(""))
}
