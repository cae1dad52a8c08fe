//! Bounded per-session activity history.
//!
//! Every session keeps a FIFO log of what happened to it: commands that
//! completed, requests the allow-list blocked, and console messages the
//! page emitted. The log is bounded; once full, the oldest entries
//! fall off as new ones arrive.
//!
//! Entries serialize with their kind as the key:
//!
//! ```json
//! { "at": 1724581830000, "command": { "name": "click", "selector": "#go" } }
//! { "at": 1724581830412, "urlBlocked": "https://tracker.test/pixel.gif" }
//! { "at": 1724581831007, "consoleMessage": { "type": "error", "text": "boom" } }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::command::Command;

/// Milliseconds since the Unix epoch.
pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Severity of a console message relayed from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    /// Verbose/debug output.
    Debug,
    /// Plain `console.log` / `console.info` output.
    Info,
    /// `console.warn` output.
    Warning,
    /// `console.error` output and uncaught errors.
    Error,
}

impl std::fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConsoleLevel::Debug => "debug",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warning => "warning",
            ConsoleLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// A console message captured from the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    /// Message severity.
    #[serde(rename = "type")]
    pub level: ConsoleLevel,
    /// Message text as the page produced it.
    pub text: String,
}

/// One kind of session activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryEvent {
    /// A command was attempted (recorded whether or not it succeeded).
    Command(Command),
    /// The allow-list blocked a request to this URL.
    UrlBlocked(Url),
    /// The page emitted a console message.
    ConsoleMessage(ConsoleMessage),
}

/// A timestamped history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the event happened, in milliseconds since the Unix epoch.
    pub at: u64,
    /// What happened.
    #[serde(flatten)]
    pub event: HistoryEvent,
}

/// Thread-safe bounded FIFO of session activity.
///
/// Cloning is cheap and shares the log: the session hands clones to the
/// page callbacks so blocked requests and console messages land in the
/// same history as commands.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    inner: Arc<Mutex<HistoryInner>>,
}

#[derive(Debug)]
struct HistoryInner {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl SessionHistory {
    /// Create a history that retains at most `limit` entries.
    ///
    /// A limit of zero is allowed and keeps the history permanently empty.
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HistoryInner {
                entries: VecDeque::with_capacity(limit.min(64)),
                limit,
            })),
        }
    }

    /// Record an event, stamped with the current time.
    ///
    /// Appends first, then trims from the front, so the newest entry
    /// always wins over the oldest.
    pub fn record(&self, event: HistoryEvent) {
        let entry = HistoryEntry {
            at: epoch_millis(),
            event,
        };

        let mut inner = self.inner.lock().unwrap();
        inner.entries.push_back(entry);
        while inner.entries.len() > inner.limit {
            inner.entries.pop_front();
        }
    }

    /// Copy out the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.inner.lock().unwrap().entries.iter().cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// True when nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
