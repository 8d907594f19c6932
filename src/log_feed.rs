//! Append-only diagnostic log projected from the event stream.
//!
//! Entries are client-timestamped at append time, kept in arrival order, and
//! never mutated or removed; only a session start empties the feed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse classification of a log entry, used by renderers for styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogClass {
    System,
    Start,
    End,
    Error,
}

/// One diagnostic line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub class: LogClass,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.text)
    }
}

/// The scrolling log feed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogFeed {
    entries: Vec<LogEntry>,
}

impl LogFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry, stamped with the current wall clock.
    pub fn append(&mut self, class: LogClass, text: impl Into<String>) {
        self.entries.push(LogEntry {
            at: Utc::now(),
            class,
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when any entry text contains `needle`. Convenience for tests and
    /// quick diagnostics.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| entry.text.contains(needle))
    }

    /// Empty the feed. Only the session controller calls this, on start.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
