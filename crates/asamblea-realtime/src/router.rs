//! Inbound message routing.
//!
//! The router sits between the channel read loop and the session layer:
//! it parses the `{type, data}` envelope, decodes the typed event, and
//! invokes the handler. One bad frame can never break the channel —
//! malformed payloads and handler failures are logged and dropped, unknown
//! kinds are ignored.
//!
//! Handlers are idempotent under re-delivery; the only de-duplication the
//! router performs is for `question_expired`, suppressed per question id
//! within a 5 s window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use asamblea_core::constants::QUESTION_EXPIRED_DEDUP_MS;
use asamblea_core::messages::{AdminEvent, Frame, VoterEvent};

/// Error a handler may surface; the router logs it and moves on.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Anything that consumes raw channel frames.
pub trait FrameSink: Send + Sync {
    /// Consume one raw text frame.
    fn dispatch(&self, raw: &str);
}

/// Session-layer consumer of voter-channel events.
pub trait VoterHandler: Send + Sync {
    /// Handle one decoded event.
    fn handle(&self, event: VoterEvent) -> Result<(), HandlerError>;
}

/// Session-layer consumer of admin-channel events.
pub trait AdminHandler: Send + Sync {
    /// Handle one decoded event.
    fn handle(&self, event: AdminEvent) -> Result<(), HandlerError>;
}

/// Router for the voter channel.
pub struct VoterRouter {
    handler: Arc<dyn VoterHandler>,
}

impl VoterRouter {
    /// Wrap a handler.
    pub fn new(handler: Arc<dyn VoterHandler>) -> Self {
        Self { handler }
    }
}

impl FrameSink for VoterRouter {
    fn dispatch(&self, raw: &str) {
        let frame = match Frame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping malformed voter frame");
                return;
            }
        };
        match VoterEvent::decode(&frame) {
            Ok(Some(event)) => {
                let kind = event.kind();
                if let Err(e) = self.handler.handle(event) {
                    warn!(kind, error = %e, "voter handler failed");
                }
            }
            Ok(None) => debug!(kind = %frame.kind, "unknown voter message kind, ignored"),
            Err(e) => warn!(kind = %frame.kind, error = %e, "dropping malformed voter payload"),
        }
    }
}

/// Router for the admin channel, with `question_expired` de-duplication.
pub struct AdminRouter {
    handler: Arc<dyn AdminHandler>,
    expired_seen: Mutex<HashMap<i64, Instant>>,
}

impl AdminRouter {
    /// Wrap a handler.
    pub fn new(handler: Arc<dyn AdminHandler>) -> Self {
        Self {
            handler,
            expired_seen: Mutex::new(HashMap::new()),
        }
    }

    /// True when this `question_expired` should be suppressed.
    fn is_duplicate_expiry(&self, question_id: i64) -> bool {
        let window = Duration::from_millis(QUESTION_EXPIRED_DEDUP_MS);
        let now = Instant::now();
        let mut seen = self.expired_seen.lock();
        if let Some(last) = seen.get(&question_id) {
            if now.duration_since(*last) < window {
                return true;
            }
        }
        let _ = seen.insert(question_id, now);
        false
    }
}

impl FrameSink for AdminRouter {
    fn dispatch(&self, raw: &str) {
        let frame = match Frame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping malformed admin frame");
                return;
            }
        };
        match AdminEvent::decode(&frame) {
            Ok(Some(event)) => {
                if let AdminEvent::QuestionExpired(ref expired) = event {
                    if self.is_duplicate_expiry(expired.question_id) {
                        debug!(
                            question_id = expired.question_id,
                            "suppressing repeated question_expired"
                        );
                        return;
                    }
                }
                let kind = event.kind();
                if let Err(e) = self.handler.handle(event) {
                    warn!(kind, error = %e, "admin handler failed");
                }
            }
            Ok(None) => debug!(kind = %frame.kind, "unknown admin message kind, ignored"),
            Err(e) => warn!(kind = %frame.kind, error = %e, "dropping malformed admin payload"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Default)]
    struct RecordingVoter {
        events: Mutex<Vec<VoterEvent>>,
        fail: bool,
    }

    impl VoterHandler for RecordingVoter {
        fn handle(&self, event: VoterEvent) -> Result<(), HandlerError> {
            self.events.lock().push(event);
            if self.fail {
                return Err("handler exploded".into());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingAdmin {
        events: Mutex<Vec<AdminEvent>>,
    }

    impl AdminHandler for RecordingAdmin {
        fn handle(&self, event: AdminEvent) -> Result<(), HandlerError> {
            self.events.lock().push(event);
            Ok(())
        }
    }

    #[tokio::test]
    async fn known_voter_kind_reaches_handler() {
        let handler = Arc::new(RecordingVoter::default());
        let router = VoterRouter::new(handler.clone());
        router.dispatch(r#"{"type":"question_deleted","data":{"question_id":3}}"#);

        let events = handler.events.lock();
        assert_eq!(events.len(), 1);
        assert_matches!(events[0], VoterEvent::QuestionDeleted { question_id: 3 });
    }

    #[tokio::test]
    async fn unknown_kind_invokes_nothing() {
        let handler = Arc::new(RecordingVoter::default());
        let router = VoterRouter::new(handler.clone());
        router.dispatch(r#"{"type":"confetti","data":{"amount":9}}"#);
        assert!(handler.events.lock().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_does_not_panic() {
        let handler = Arc::new(RecordingVoter::default());
        let router = VoterRouter::new(handler.clone());
        router.dispatch("{definitely not json");
        router.dispatch(r#"{"type":"question_deleted","data":{"question_id":"x"}}"#);
        assert!(handler.events.lock().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_is_contained() {
        let handler = Arc::new(RecordingVoter {
            events: Mutex::new(Vec::new()),
            fail: true,
        });
        let router = VoterRouter::new(handler.clone());
        // Neither call panics nor poisons the router.
        router.dispatch(r#"{"type":"system_reset","data":{}}"#);
        router.dispatch(r#"{"type":"system_reset","data":{}}"#);
        assert_eq!(handler.events.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn question_expired_deduplicates_within_window() {
        let handler = Arc::new(RecordingAdmin::default());
        let router = AdminRouter::new(handler.clone());
        let frame = r#"{"type":"question_expired","data":{"question_id":7,"text":"X"}}"#;

        router.dispatch(frame);
        // Identical repeat one second later is suppressed.
        tokio::time::advance(Duration::from_secs(1)).await;
        router.dispatch(frame);
        assert_eq!(handler.events.lock().len(), 1);

        // Past the 5 s window it fires again.
        tokio::time::advance(Duration::from_millis(QUESTION_EXPIRED_DEDUP_MS)).await;
        router.dispatch(frame);
        assert_eq!(handler.events.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dedup_is_per_question() {
        let handler = Arc::new(RecordingAdmin::default());
        let router = AdminRouter::new(handler.clone());

        router.dispatch(r#"{"type":"question_expired","data":{"question_id":7,"text":"X"}}"#);
        router.dispatch(r#"{"type":"question_expired","data":{"question_id":8,"text":"Y"}}"#);
        assert_eq!(handler.events.lock().len(), 2);
    }

    #[tokio::test]
    async fn other_admin_kinds_are_not_deduplicated() {
        let handler = Arc::new(RecordingAdmin::default());
        let router = AdminRouter::new(handler.clone());
        let frame = r#"{"type":"vote_registered","data":{"question_id":2}}"#;

        router.dispatch(frame);
        router.dispatch(frame);
        assert_eq!(handler.events.lock().len(), 2);
    }
}
