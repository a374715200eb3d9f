//! Push-event handlers.
//!
//! One [`EventHooks`] instance backs both routers. Handlers are idempotent:
//! each one either records something append-only, replaces local state with
//! server state, or schedules a refresh that does. Terminal events go
//! through the end channel so teardown happens on the controller, not
//! inside the channel read loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use asamblea_core::messages::{AdminEvent, NoticeLevel, VoterEvent};
use asamblea_core::models::Role;
use asamblea_realtime::router::{AdminHandler, HandlerError, VoterHandler};
use asamblea_realtime::CountdownRegistry;

use crate::notify::{ActivityLog, Notice, Notifier, Severity};
use crate::refresher::Refresher;

/// Why the session is ending. Terminal: no reconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// Full system reset; the client reloads.
    Reset,
    /// Server evicted this client; back to the login screen.
    Disconnected,
}

/// Session-layer consumer of both channels' events.
pub(crate) struct EventHooks {
    pub refresher: Arc<Refresher>,
    pub notifier: Arc<dyn Notifier>,
    pub activity: Arc<ActivityLog>,
    pub countdowns: Arc<CountdownRegistry>,
    pub end_tx: mpsc::UnboundedSender<SessionEnd>,
}

impl EventHooks {
    fn spawn_questions(&self, role: Role) {
        let refresher = Arc::clone(&self.refresher);
        let _ = tokio::spawn(async move { refresher.load_active_questions(role).await });
    }

    fn spawn_aforo(&self) {
        let refresher = Arc::clone(&self.refresher);
        let _ = tokio::spawn(async move { refresher.load_aforo().await });
    }

    fn spawn_participants(&self) {
        let refresher = Arc::clone(&self.refresher);
        let _ = tokio::spawn(async move { refresher.load_participants().await });
    }

    fn end(&self, end: SessionEnd) {
        if self.end_tx.send(end).is_err() {
            warn!("session end signal dropped, controller gone");
        }
    }
}

impl VoterHandler for EventHooks {
    fn handle(&self, event: VoterEvent) -> Result<(), HandlerError> {
        match event {
            VoterEvent::NewQuestion(question) => {
                self.notifier
                    .notify(Notice::info(format!("Nueva pregunta: {}", question.text)));
                self.spawn_questions(Role::Voter);
            }
            VoterEvent::QuestionStatus(_) => self.spawn_questions(Role::Voter),
            VoterEvent::QuestionDeleted { question_id } => {
                self.countdowns.remove(question_id);
                self.spawn_questions(Role::Voter);
            }
            VoterEvent::CountdownExtended(extended) => {
                self.countdowns
                    .register(extended.question_id, extended.remaining_seconds);
            }
            VoterEvent::AdminBroadcast { message } => {
                self.notifier.notify(Notice::info(message));
            }
            VoterEvent::SystemReset => {
                self.notifier.notify(
                    Notice::warning("La asamblea fue reiniciada. La aplicación se recargará.")
                        .sticky(),
                );
                self.end(SessionEnd::Reset);
            }
            VoterEvent::ForceDisconnect { reason } => {
                let text =
                    reason.unwrap_or_else(|| "El administrador cerró tu sesión".to_string());
                self.notifier.notify(Notice::warning(text).sticky());
                self.end(SessionEnd::Disconnected);
            }
        }
        Ok(())
    }
}

impl AdminHandler for EventHooks {
    fn handle(&self, event: AdminEvent) -> Result<(), HandlerError> {
        match event {
            AdminEvent::AttendanceRegistered { code, name } => {
                let who = name.unwrap_or_else(|| code.clone());
                self.activity
                    .push(Severity::Info, format!("Asistencia registrada: {who}"));
                self.spawn_aforo();
                self.spawn_participants();
            }
            AdminEvent::VoteRegistered { question_id } => {
                let text = match question_id {
                    Some(id) => format!("Voto registrado en la pregunta {id}"),
                    None => "Voto registrado".to_string(),
                };
                self.activity.push(Severity::Info, text);
                self.spawn_aforo();
            }
            AdminEvent::QuestionCreated { question_id } => {
                self.activity
                    .push(Severity::Info, format!("Pregunta {question_id} creada"));
                self.spawn_questions(Role::Admin);
            }
            AdminEvent::ParticipantRemoved { code } => {
                self.activity
                    .push(Severity::Info, format!("Participante retirado: {code}"));
                self.spawn_participants();
                self.spawn_aforo();
            }
            AdminEvent::QuestionExpired(expired) => {
                // Repeats within the window never reach here — the router
                // deduplicates per question id.
                self.activity
                    .push(Severity::Warning, format!("Pregunta expirada: {}", expired.text));
                self.notifier
                    .notify(Notice::warning(format!("Pregunta expirada: {}", expired.text)));
                self.spawn_questions(Role::Admin);
            }
            AdminEvent::Notification { message, level } => {
                let notice = match level {
                    NoticeLevel::Info => Notice::info(message),
                    NoticeLevel::Warning => Notice::warning(message),
                    NoticeLevel::Error => Notice::error(message),
                };
                self.notifier.notify(notice);
            }
        }
        Ok(())
    }
}
