//! Async confirmation prompts.
//!
//! Replaces the historical pattern of installing ad-hoc global callbacks to
//! bridge UI dialogs to pending operations. The operation gets a
//! [`ConfirmDecision`] future; the UI gets a [`ConfirmTicket`] it resolves
//! exactly once. An unanswered or dropped ticket denies: destructive
//! operations never proceed by default.

use std::time::Duration;

use tokio::sync::oneshot;

/// Default time the user has to answer before the operation is denied.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// Factory for confirmation pairs.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmGate {
    timeout: Duration,
}

impl ConfirmGate {
    /// Gate with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    /// Gate with a custom timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Create a decision/ticket pair for one prompt.
    #[must_use]
    pub fn pair(&self, prompt: impl Into<String>) -> (ConfirmDecision, ConfirmTicket) {
        let (tx, rx) = oneshot::channel();
        (
            ConfirmDecision {
                rx,
                timeout: self.timeout,
            },
            ConfirmTicket {
                prompt: prompt.into(),
                tx,
            },
        )
    }
}

impl Default for ConfirmGate {
    fn default() -> Self {
        Self::new()
    }
}

/// The operation side: resolves to the user's answer, `false` on timeout or
/// a dropped ticket.
pub struct ConfirmDecision {
    rx: oneshot::Receiver<bool>,
    timeout: Duration,
}

impl ConfirmDecision {
    /// Wait for the answer.
    pub async fn decided(self) -> bool {
        match tokio::time::timeout(self.timeout, self.rx).await {
            Ok(Ok(answer)) => answer,
            // Timeout or dropped ticket: deny.
            _ => false,
        }
    }
}

/// The UI side: answer exactly once, or drop to deny.
pub struct ConfirmTicket {
    prompt: String,
    tx: oneshot::Sender<bool>,
}

impl ConfirmTicket {
    /// Prompt text to show the user.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Approve the operation.
    pub fn allow(self) {
        let _ = self.tx.send(true);
    }

    /// Reject the operation.
    pub fn deny(self) {
        let _ = self.tx.send(false);
    }

    /// Resolve with an explicit answer.
    pub fn resolve(self, answer: bool) {
        let _ = self.tx.send(answer);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
