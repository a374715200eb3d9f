//! Notification surface and admin activity log.
//!
//! Every user-facing message goes through one [`Notifier`]; the UI decides
//! how to render severities and whether a notice auto-dismisses. Raw errors
//! and stack traces never reach this surface — they go to the log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Activity log capacity; older entries fall off the front.
pub const ACTIVITY_LOG_CAP: usize = 200;

/// Display severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Neutral information.
    Info,
    /// An operation completed.
    Success,
    /// Needs attention.
    Warning,
    /// An operation failed.
    Error,
}

impl Severity {
    /// Tag used in activity-log entries.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One user-facing notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Display severity.
    pub severity: Severity,
    /// Message text, already user-facing.
    pub text: String,
    /// Sticky notices stay until dismissed manually; others auto-dismiss.
    pub sticky: bool,
}

impl Notice {
    fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            sticky: false,
        }
    }

    /// Informational notice.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    /// Success notice.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Severity::Success, text)
    }

    /// Warning notice.
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    /// Error notice.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    /// Mark as sticky (manual dismiss only).
    #[must_use]
    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }
}

/// Sink for user-facing notices. Implemented by the UI.
pub trait Notifier: Send + Sync {
    /// Display one notice.
    fn notify(&self, notice: Notice);
}

/// One admin-console activity entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityEntry {
    /// When the entry was recorded.
    pub at: DateTime<Utc>,
    /// Severity tag (`info` / `warning` / ...).
    pub tag: &'static str,
    /// Entry text.
    pub text: String,
}

/// Capped, timestamped feed for the admin console.
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    cap: usize,
}

impl ActivityLog {
    /// Create a log with the given capacity.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            cap,
        }
    }

    /// Append an entry, dropping the oldest past capacity.
    pub fn push(&self, severity: Severity, text: impl Into<String>) {
        let mut entries = self.entries.lock();
        if entries.len() == self.cap {
            let _ = entries.pop_front();
        }
        entries.push_back(ActivityEntry {
            at: Utc::now(),
            tag: severity.tag(),
            text: text.into(),
        });
    }

    /// Snapshot of current entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(ACTIVITY_LOG_CAP)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
