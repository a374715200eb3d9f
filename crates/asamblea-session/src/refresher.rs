//! Background data refreshes.
//!
//! Push-triggered and countdown-triggered refreshes are fire-and-forget:
//! failures are logged, never surfaced as toasts (only user-initiated
//! operations toast their errors) and never propagated to the channel read
//! loop.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use asamblea_client::ApiClient;
use asamblea_core::models::Role;
use asamblea_realtime::CountdownRegistry;

use crate::frontend::Frontend;

/// Shared read-side used by event hooks, countdown expiry, and polling.
pub(crate) struct Refresher {
    pub api: ApiClient,
    pub frontend: Arc<dyn Frontend>,
    pub countdowns: Arc<CountdownRegistry>,
    /// Role of the live session, if any; countdown expiry refreshes need it.
    pub current_role: Mutex<Option<Role>>,
}

impl Refresher {
    /// Reload active questions and re-sync countdowns from server values.
    pub async fn load_active_questions(&self, role: Role) {
        match self.api.active_questions(role).await {
            Ok(questions) => {
                for question in &questions {
                    if let Some(seconds) = question.countdown_seconds() {
                        self.countdowns.register(question.id, seconds);
                    }
                }
                self.frontend.show_active_questions(questions);
            }
            Err(e) => warn!(error = %e, "active questions refresh failed"),
        }
    }

    /// Reload this voter's recorded votes.
    pub async fn load_my_votes(&self) {
        match self.api.my_votes().await {
            Ok(votes) => self.frontend.show_my_votes(votes),
            Err(e) => warn!(error = %e, "my-votes refresh failed"),
        }
    }

    /// Reload the quorum panel.
    pub async fn load_aforo(&self) {
        match self.api.aforo().await {
            Ok(aforo) => self.frontend.show_aforo(aforo),
            Err(e) => warn!(error = %e, "aforo refresh failed"),
        }
    }

    /// Reload the roster.
    pub async fn load_participants(&self) {
        match self.api.participants().await {
            Ok(participants) => self.frontend.show_participants(participants),
            Err(e) => warn!(error = %e, "participants refresh failed"),
        }
    }

    /// A countdown crossed zero: re-sync from the authoritative source.
    pub async fn on_countdown_expired(&self, subject: i64) {
        debug!(subject, "countdown reached zero, refreshing");
        let role = *self.current_role.lock();
        if let Some(role) = role {
            self.load_active_questions(role).await;
        }
    }
}
