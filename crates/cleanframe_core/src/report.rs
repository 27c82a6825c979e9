//! Run report.
//!
//! The report is the single record of every corrective action, warning and
//! recoverable error produced by one cleaning run. Messages are appended in the
//! exact order they are produced and are never reordered or deduplicated. Each
//! message is also mirrored to `tracing` at the matching level.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Severity of a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Corrective action taken or informational note
    Info,
    /// Rule violation or structural issue
    Warning,
    /// Faulty rule or failing collaborator; the check was skipped
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// A single report message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Severity
    pub level: Level,
    /// Human-readable message
    pub message: String,
}

/// Ordered, append-only log of one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an informational message.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "cleanframe::report", "{}", message);
        self.push(Level::Info, message);
    }

    /// Appends a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "cleanframe::report", "{}", message);
        self.push(Level::Warning, message);
    }

    /// Appends an error.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(target: "cleanframe::report", "{}", message);
        self.push(Level::Error, message);
    }

    fn push(&mut self, level: Level, message: String) {
        self.entries.push(ReportEntry { level, message });
    }

    /// Returns all entries in order.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Returns the plain messages in order.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries of one level.
    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    /// Iterates over warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &ReportEntry> {
        self.at_level(Level::Warning)
    }

    /// Iterates over errors.
    pub fn errors(&self) -> impl Iterator<Item = &ReportEntry> {
        self.at_level(Level::Error)
    }

    /// Returns true if any error was reported.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Case-insensitive substring search over all messages.
    pub fn contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.entries
            .iter()
            .any(|e| e.message.to_lowercase().contains(&needle))
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a ReportEntry;
    type IntoIter = std::slice::Iter<'a, ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
