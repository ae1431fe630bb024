//! Log entries and aggregated transfer logs

use crate::config::LABELS;
use chrono::{DateTime, Local};

/// Outcome recorded by a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Connector built
    Connected,
    /// Bucket created
    Created,
    /// Bucket already existed
    Exists,
    /// Transfer skipped, content unchanged
    Skipped,
    /// Object uploaded
    Uploaded,
    /// Object downloaded
    Downloaded,
    /// Mock mode, nothing transferred
    Mocked,
    /// Bulk operation matched nothing
    NoMatch,
    /// Operation failed
    Failed,
}

impl Outcome {
    /// Whether this outcome is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Whether bytes were moved
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Uploaded | Self::Downloaded)
    }
}

/// One timestamped log line
#[derive(Debug, Clone)]
pub struct LogEntry {
    timestamp: DateTime<Local>,
    outcome: Outcome,
    message: String,
}

impl LogEntry {
    /// Record an entry and forward it to tracing
    pub fn new(outcome: Outcome, message: impl Into<String>) -> Self {
        let message = message.into();
        if outcome.is_failure() {
            tracing::warn!(outcome = ?outcome, "{}", message);
        } else {
            tracing::info!(outcome = ?outcome, "{}", message);
        }
        Self {
            timestamp: Local::now(),
            outcome,
            message,
        }
    }

    /// Create a failure entry
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(Outcome::Failed, message)
    }

    /// Outcome of the logged action
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Message without timestamp or prefix
    pub fn message(&self) -> &str {
        &self.message
    }

    /// When the entry was recorded
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            LABELS.log_emoji,
            self.message
        )
    }
}

/// Ordered log entries of a bulk operation
#[derive(Debug, Clone, Default)]
pub struct TransferLog {
    entries: Vec<LogEntry>,
}

impl TransferLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// All entries in order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was logged
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given outcome
    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Number of failed entries
    pub fn failures(&self) -> usize {
        self.count(Outcome::Failed)
    }
}

impl From<LogEntry> for TransferLog {
    fn from(entry: LogEntry) -> Self {
        Self {
            entries: vec![entry],
        }
    }
}

impl FromIterator<LogEntry> for TransferLog {
    fn from_iter<I: IntoIterator<Item = LogEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TransferLog {
    type Item = LogEntry;
    type IntoIter = std::vec::IntoIter<LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl std::fmt::Display for TransferLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
