//! Session controller.
//!
//! Owns the single live session, both channel supervisors, the countdown
//! registry and the refresh scheduler. Login and logout are the only paths
//! that create or destroy any of them — nothing else may touch a channel or
//! clear the registry, so partial teardown cannot interleave.
//!
//! The demo access code short-circuits before any credential exchange: a
//! demo session never opens a channel and never touches backend state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

use asamblea_client::config::ClientConfig;
use asamblea_client::{ApiClient, TokenStore};
use asamblea_core::constants::SESSION_END_DELAY_MS;
use asamblea_core::models::{
    ActiveQuestion, BulkEntry, Identity, NewQuestion, Role, Session, VoteAnswer, VoteRequest,
};
use asamblea_core::validate::{
    ValidationError, check_access_code, check_answer, check_new_question,
};
use asamblea_realtime::router::{AdminRouter, VoterRouter};
use asamblea_realtime::{ChannelSupervisor, CountdownRegistry, RefreshScheduler};

use crate::confirm::ConfirmGate;
use crate::error::SessionError;
use crate::frontend::Frontend;
use crate::hooks::{EventHooks, SessionEnd};
use crate::notify::{ActivityLog, Notice, Notifier};
use crate::refresher::Refresher;

/// Token marking a demo session; never sent to the backend.
pub(crate) const DEMO_TOKEN: &str = "demo";

/// The tab-lifetime owner of session state.
pub struct SessionController {
    config: ClientConfig,
    api: ApiClient,
    store: Arc<TokenStore>,
    frontend: Arc<dyn Frontend>,
    notifier: Arc<dyn Notifier>,
    activity: Arc<ActivityLog>,
    countdowns: Arc<CountdownRegistry>,
    scheduler: Arc<RefreshScheduler>,
    refresher: Arc<Refresher>,
    admin_channel: ChannelSupervisor,
    voter_channel: ChannelSupervisor,
    confirm: ConfirmGate,
    session: Mutex<Option<Session>>,
    end_tx: mpsc::UnboundedSender<SessionEnd>,
}

impl SessionController {
    /// Build the controller and its background listeners.
    pub fn new(
        config: ClientConfig,
        frontend: Arc<dyn Frontend>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Arc<Self>, SessionError> {
        let store = Arc::new(TokenStore::new(config.storage_path.clone()));
        let api = ApiClient::new(&config, Arc::clone(&store))?;

        let (expire_tx, mut expire_rx) = mpsc::unbounded_channel::<i64>();
        let countdowns = Arc::new(CountdownRegistry::new(Arc::new(move |subject| {
            let _ = expire_tx.send(subject);
        })));

        let refresher = Arc::new(Refresher {
            api: api.clone(),
            frontend: Arc::clone(&frontend),
            countdowns: Arc::clone(&countdowns),
            current_role: Mutex::new(None),
        });

        // Countdown zero-crossings re-sync from the authoritative source.
        let _ = tokio::spawn({
            let refresher = Arc::clone(&refresher);
            async move {
                while let Some(subject) = expire_rx.recv().await {
                    refresher.on_countdown_expired(subject).await;
                }
            }
        });

        let (end_tx, mut end_rx) = mpsc::unbounded_channel::<SessionEnd>();

        let controller = Arc::new(Self {
            config,
            api,
            store,
            frontend,
            notifier,
            activity: Arc::new(ActivityLog::default()),
            countdowns,
            scheduler: Arc::new(RefreshScheduler::new()),
            refresher,
            admin_channel: ChannelSupervisor::new(Role::Admin),
            voter_channel: ChannelSupervisor::new(Role::Voter),
            confirm: ConfirmGate::new(),
            session: Mutex::new(None),
            end_tx,
        });

        // Terminal transitions run here, never inside the channel read loop.
        let weak = Arc::downgrade(&controller);
        let _ = tokio::spawn(async move {
            while let Some(end) = end_rx.recv().await {
                let Some(controller) = weak.upgrade() else { break };
                controller.finish_session(end).await;
            }
        });

        Ok(controller)
    }

    // ─── Status queries ──────────────────────────────────────────────────

    /// Current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    /// Current role, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.session.lock().as_ref().map(|s| s.role)
    }

    /// Whether the current session is the demo session.
    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|s| s.token == DEMO_TOKEN)
    }

    /// Whether the channel for a role is currently running.
    #[must_use]
    pub fn channel_open(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.admin_channel.is_open(),
            Role::Voter => self.voter_channel.is_open(),
        }
    }

    /// Admin console activity feed.
    #[must_use]
    pub fn activity_log(&self) -> Arc<ActivityLog> {
        Arc::clone(&self.activity)
    }

    /// Display seconds left for a countdown, if registered.
    #[must_use]
    pub fn countdown_remaining(&self, subject: i64) -> Option<u64> {
        self.countdowns.remaining(subject)
    }

    fn require_role(&self, role: Role) -> Result<Session, SessionError> {
        let session = self
            .session
            .lock()
            .clone()
            .ok_or(SessionError::NotAuthenticated)?;
        if session.role == role {
            Ok(session)
        } else {
            Err(SessionError::WrongRole(role.as_str()))
        }
    }

    fn hooks(&self) -> Arc<EventHooks> {
        Arc::new(EventHooks {
            refresher: Arc::clone(&self.refresher),
            notifier: Arc::clone(&self.notifier),
            activity: Arc::clone(&self.activity),
            countdowns: Arc::clone(&self.countdowns),
            end_tx: self.end_tx.clone(),
        })
    }

    fn exhausted_warning(&self) -> Arc<dyn Fn() + Send + Sync> {
        let notifier = Arc::clone(&self.notifier);
        Arc::new(move || {
            notifier.notify(
                Notice::error(
                    "Se perdió la conexión en tiempo real. Recarga la página para reintentar.",
                )
                .sticky(),
            );
        })
    }

    // ─── Login / resume ──────────────────────────────────────────────────

    /// Exchange admin credentials and enter the console.
    pub async fn login_admin(&self, username: &str, password: &str) -> Result<(), SessionError> {
        if username.trim().is_empty() {
            let e = ValidationError::EmptyField("usuario");
            self.notifier.notify(Notice::error(e.to_string()));
            return Err(e.into());
        }
        if password.is_empty() {
            let e = ValidationError::EmptyField("contraseña");
            self.notifier.notify(Notice::error(e.to_string()));
            return Err(e.into());
        }

        let reply = match self.api.login_admin(username.trim(), password).await {
            Ok(reply) => reply,
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                return Err(e.into());
            }
        };
        self.store.set_token(Role::Admin, &reply.access_token)?;
        self.activate_admin(reply.access_token, username.trim().to_string());
        self.notifier
            .notify(Notice::success("Sesión de administrador iniciada"));
        Ok(())
    }

    /// Exchange a voter access code and enter the voting screen. The code
    /// is validated locally first; a malformed code never reaches the
    /// network. The demo code starts a local-only session.
    pub async fn login_voter(&self, raw_code: &str, is_power: bool) -> Result<(), SessionError> {
        let code = match check_access_code(raw_code) {
            Ok(code) => code,
            Err(e) => {
                self.notifier.notify(Notice::error(e.to_string()));
                return Err(e.into());
            }
        };

        if code == self.config.demo_code {
            self.start_demo_session(code);
            return Ok(());
        }

        let reply = match self.api.login_voter(&code, is_power).await {
            Ok(reply) => reply,
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                return Err(e.into());
            }
        };
        self.store.set_token(Role::Voter, &reply.access_token)?;
        self.store.set_voter_code(&reply.code)?;
        let identity = Identity {
            code: reply.code,
            name: reply.name.clone(),
            coefficient: None,
        };
        self.activate_voter(reply.access_token, identity, reply.skip_power_question);
        self.notifier
            .notify(Notice::success(format!("Bienvenido, {}", reply.name)));
        Ok(())
    }

    /// Try to restore a session from stored tokens. Admin wins when both
    /// are present. Stale tokens are cleared silently.
    pub async fn resume(&self) -> Result<bool, SessionError> {
        if self.session.lock().is_some() {
            return Ok(true);
        }

        if let Some(token) = self.store.token(Role::Admin) {
            match self.api.probe(Role::Admin).await {
                Ok(()) => {
                    self.activate_admin(token, "admin".to_string());
                    info!("admin session resumed");
                    return Ok(true);
                }
                Err(e) if e.is_auth() => {
                    let _ = self.store.clear(Role::Admin);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let (Some(token), Some(code)) = (self.store.token(Role::Voter), self.store.voter_code())
        {
            match self.api.probe(Role::Voter).await {
                Ok(()) => {
                    let identity = Identity {
                        code: code.clone(),
                        name: code,
                        coefficient: None,
                    };
                    self.activate_voter(token, identity, true);
                    info!("voter session resumed");
                    return Ok(true);
                }
                Err(e) if e.is_auth() => {
                    let _ = self.store.clear(Role::Voter);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(false)
    }

    fn start_demo_session(&self, code: String) {
        let identity = Identity {
            code,
            name: "Demostración".into(),
            coefficient: None,
        };
        *self.session.lock() = Some(Session {
            role: Role::Voter,
            token: DEMO_TOKEN.into(),
            identity: identity.clone(),
        });
        *self.refresher.current_role.lock() = Some(Role::Voter);
        self.notifier
            .notify(Notice::info("Modo demostración: sin conexión en vivo"));
        self.frontend.show_voter_home(identity, true);
        self.frontend.show_active_questions(Vec::new());
    }

    fn activate_admin(&self, token: String, username: String) {
        *self.session.lock() = Some(Session {
            role: Role::Admin,
            token,
            identity: Identity {
                code: "admin".into(),
                name: username,
                coefficient: None,
            },
        });
        *self.refresher.current_role.lock() = Some(Role::Admin);

        match self.config.ws_endpoint(Role::Admin, "") {
            Ok(url) => self.admin_channel.start(
                url,
                Arc::new(AdminRouter::new(self.hooks())),
                self.exhausted_warning(),
            ),
            Err(e) => warn!(error = %e, "cannot derive admin channel url"),
        }

        let refresher = Arc::clone(&self.refresher);
        let _ = tokio::spawn(async move {
            refresher.load_aforo().await;
            refresher.load_participants().await;
            refresher.load_active_questions(Role::Admin).await;
        });

        let refresher = Arc::clone(&self.refresher);
        self.scheduler.start(
            "aforo_poll",
            Duration::from_secs(self.config.aforo_poll_secs),
            move || {
                let refresher = Arc::clone(&refresher);
                async move { refresher.load_aforo().await }
            },
        );
    }

    fn activate_voter(&self, token: String, identity: Identity, skip_power_question: bool) {
        let code = identity.code.clone();
        *self.session.lock() = Some(Session {
            role: Role::Voter,
            token,
            identity: identity.clone(),
        });
        *self.refresher.current_role.lock() = Some(Role::Voter);
        self.frontend.show_voter_home(identity, skip_power_question);

        match self.config.ws_endpoint(Role::Voter, &code) {
            Ok(url) => self.voter_channel.start(
                url,
                Arc::new(VoterRouter::new(self.hooks())),
                self.exhausted_warning(),
            ),
            Err(e) => warn!(error = %e, "cannot derive voter channel url"),
        }

        let refresher = Arc::clone(&self.refresher);
        let _ = tokio::spawn(async move {
            refresher.load_active_questions(Role::Voter).await;
            refresher.load_my_votes().await;
        });

        let refresher = Arc::clone(&self.refresher);
        self.scheduler.start(
            "questions_poll",
            Duration::from_secs(self.config.questions_poll_secs),
            move || {
                let refresher = Arc::clone(&refresher);
                async move { refresher.load_active_questions(Role::Voter).await }
            },
        );
    }

    // ─── Logout / terminal transitions ───────────────────────────────────

    /// Close the session. A second call with no session is a no-op.
    pub fn logout(&self) {
        if self.teardown() {
            info!("session closed");
            self.frontend.show_login();
        }
    }

    /// Tear everything down. Returns whether a session existed.
    fn teardown(&self) -> bool {
        let had_session = self.session.lock().take().is_some();
        if !had_session {
            return false;
        }
        // Both channels defensively; stop is a no-op when idle.
        self.admin_channel.stop();
        self.voter_channel.stop();
        self.scheduler.stop_all();
        self.countdowns.clear();
        self.activity.clear();
        *self.refresher.current_role.lock() = None;
        if let Err(e) = self.store.clear_all() {
            warn!(error = %e, "failed to clear token storage");
        }
        true
    }

    /// Terminal transition after a reset or forced disconnect: tear down
    /// now, give the user a moment to read the notice, then move screens.
    async fn finish_session(&self, end: SessionEnd) {
        let _ = self.teardown();
        tokio::time::sleep(Duration::from_millis(SESSION_END_DELAY_MS)).await;
        match end {
            SessionEnd::Reset => self.frontend.reload(),
            SessionEnd::Disconnected => self.frontend.show_login(),
        }
    }

    // ─── Voter operations ────────────────────────────────────────────────

    /// Submit a vote after confirmation. On success the active-questions
    /// view reloads; a duplicate vote surfaces as a fixed warning.
    pub async fn vote(
        &self,
        question: &ActiveQuestion,
        answer: VoteAnswer,
    ) -> Result<(), SessionError> {
        let session = self.require_role(Role::Voter)?;
        if let Err(e) = check_answer(&answer, question.allow_multiple, question.max_selections) {
            self.notifier.notify(Notice::error(e.to_string()));
            return Err(e.into());
        }

        let (decision, ticket) = self
            .confirm
            .pair(format!("¿Confirmas tu voto en \"{}\"?", question.text));
        self.frontend.request_confirm(ticket);
        if !decision.decided().await {
            self.notifier.notify(Notice::info("Voto cancelado"));
            return Ok(());
        }

        if session.token == DEMO_TOKEN {
            self.notifier
                .notify(Notice::success("Voto registrado (demostración)"));
            return Ok(());
        }

        let request = VoteRequest {
            question_id: question.id,
            answer,
        };
        match self.api.vote(&request).await {
            Ok(_) => {
                self.notifier.notify(Notice::success("Voto registrado"));
                self.refresher.load_active_questions(Role::Voter).await;
                self.refresher.load_my_votes().await;
                Ok(())
            }
            Err(e) if e.is_already_voted() => {
                self.notifier
                    .notify(Notice::warning("Ya has votado en esta pregunta"));
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    // ─── Admin operations ────────────────────────────────────────────────

    /// Create a question. Client-side validation mirrors the backend rules.
    pub async fn create_question(&self, question: NewQuestion) -> Result<i64, SessionError> {
        let _ = self.require_role(Role::Admin)?;
        if let Err(e) = check_new_question(&question) {
            self.notifier.notify(Notice::error(e.to_string()));
            return Err(e.into());
        }
        match self.api.create_question(&question).await {
            Ok(created) => {
                self.notifier.notify(Notice::success("Pregunta creada"));
                self.refresher.load_active_questions(Role::Admin).await;
                Ok(created.id)
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    /// Open or close a question. Returns the new closed state.
    pub async fn toggle_question(&self, question_id: i64) -> Result<bool, SessionError> {
        let _ = self.require_role(Role::Admin)?;
        match self.api.toggle_question(question_id).await {
            Ok(outcome) => {
                self.refresher.load_active_questions(Role::Admin).await;
                Ok(outcome.closed)
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    /// Delete a question (and its votes) after confirmation.
    pub async fn delete_question(&self, question_id: i64) -> Result<(), SessionError> {
        let _ = self.require_role(Role::Admin)?;

        let (decision, ticket) = self
            .confirm
            .pair("¿Eliminar la pregunta? Se borrarán sus votos.");
        self.frontend.request_confirm(ticket);
        if !decision.decided().await {
            self.notifier.notify(Notice::info("Eliminación cancelada"));
            return Ok(());
        }

        match self.api.delete_question(question_id).await {
            Ok(_) => {
                self.countdowns.remove(question_id);
                self.notifier.notify(Notice::success("Pregunta eliminada"));
                self.refresher.load_active_questions(Role::Admin).await;
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    /// Load one question's live results into the frontend.
    pub async fn show_results(&self, question_id: i64) -> Result<(), SessionError> {
        let _ = self.require_role(Role::Admin)?;
        match self.api.results(question_id).await {
            Ok(results) => {
                self.frontend.show_results(results);
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    /// Manual refresh of the whole console.
    pub async fn refresh_admin(&self) -> Result<(), SessionError> {
        let _ = self.require_role(Role::Admin)?;
        self.refresher.load_aforo().await;
        self.refresher.load_participants().await;
        self.refresher.load_active_questions(Role::Admin).await;
        Ok(())
    }

    /// Wipe the assembly after confirmation. Terminal for this session.
    pub async fn reset_assembly(&self) -> Result<(), SessionError> {
        let _ = self.require_role(Role::Admin)?;

        let (decision, ticket) = self.confirm.pair(
            "¿Reiniciar la asamblea? Se borrarán preguntas, votos y participantes.",
        );
        self.frontend.request_confirm(ticket);
        if !decision.decided().await {
            self.notifier.notify(Notice::info("Reinicio cancelado"));
            return Ok(());
        }

        match self.api.reset_assembly().await {
            Ok(_) => {
                self.notifier
                    .notify(Notice::warning("Asamblea reiniciada").sticky());
                let _ = self.end_tx.send(SessionEnd::Reset);
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    /// Upload the roster spreadsheet.
    pub async fn upload_roster(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<u64, SessionError> {
        let _ = self.require_role(Role::Admin)?;
        match self.api.upload_roster(filename, bytes).await {
            Ok(summary) => {
                self.notifier.notify(Notice::success(format!(
                    "{} participantes cargados",
                    summary.inserted
                )));
                self.refresher.load_participants().await;
                self.refresher.load_aforo().await;
                Ok(summary.inserted)
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    /// Upload a pre-generated participant map.
    pub async fn bulk_upload(
        &self,
        entries: &std::collections::BTreeMap<String, BulkEntry>,
    ) -> Result<u64, SessionError> {
        let _ = self.require_role(Role::Admin)?;
        match self.api.bulk_upload(entries).await {
            Ok(summary) => {
                self.notifier.notify(Notice::success(format!(
                    "{} participantes cargados",
                    summary.count
                )));
                self.refresher.load_participants().await;
                self.refresher.load_aforo().await;
                Ok(summary.count)
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    /// Store the organization name used in reports.
    pub async fn set_conjunto(&self, nombre: &str) -> Result<(), SessionError> {
        let _ = self.require_role(Role::Admin)?;
        if nombre.trim().is_empty() {
            let e = ValidationError::EmptyField("nombre");
            self.notifier.notify(Notice::error(e.to_string()));
            return Err(e.into());
        }
        match self.api.set_conjunto_name(nombre.trim()).await {
            Ok(_) => {
                self.notifier.notify(Notice::success("Nombre guardado"));
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }

    /// Download the full assembly report (PDF).
    pub async fn download_attendance_pdf(&self) -> Result<(), SessionError> {
        self.download_report(ReportKind::Pdf).await
    }

    /// Download the attendance sheet (spreadsheet).
    pub async fn download_attendance_xlsx(&self) -> Result<(), SessionError> {
        self.download_report(ReportKind::Xlsx).await
    }

    async fn download_report(&self, kind: ReportKind) -> Result<(), SessionError> {
        let _ = self.require_role(Role::Admin)?;
        // Prefer the backend's stored name; fall back to configuration.
        let conjunto = match self.api.conjunto_name().await {
            Ok(name) if !name.is_empty() => name,
            _ => self.config.conjunto.clone(),
        };
        let result = match kind {
            ReportKind::Pdf => self.api.attendance_pdf(&conjunto).await,
            ReportKind::Xlsx => self.api.attendance_xlsx(&conjunto).await,
        };
        match result {
            Ok(download) => {
                self.frontend.deliver_download(download);
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error(e.detail()));
                Err(e.into())
            }
        }
    }
}

#[derive(Clone, Copy)]
enum ReportKind {
    Pdf,
    Xlsx,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use asamblea_core::models::QuestionType;
    use asamblea_realtime::FrameSink;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::confirm::ConfirmTicket;
    use crate::notify::Severity;

    #[derive(Default)]
    struct TestFrontend {
        login_screens: AtomicU32,
        reloads: AtomicU32,
        homes: Mutex<Vec<(Identity, bool)>>,
        question_views: Mutex<Vec<Vec<ActiveQuestion>>>,
        confirm_answer: Option<bool>,
    }

    impl TestFrontend {
        fn confirming(answer: bool) -> Self {
            Self {
                confirm_answer: Some(answer),
                ..Self::default()
            }
        }
    }

    impl Frontend for TestFrontend {
        fn show_login(&self) {
            let _ = self.login_screens.fetch_add(1, Ordering::SeqCst);
        }

        fn reload(&self) {
            let _ = self.reloads.fetch_add(1, Ordering::SeqCst);
        }

        fn show_voter_home(&self, identity: Identity, skip_power_question: bool) {
            self.homes.lock().push((identity, skip_power_question));
        }

        fn show_active_questions(&self, questions: Vec<ActiveQuestion>) {
            self.question_views.lock().push(questions);
        }

        fn request_confirm(&self, ticket: ConfirmTicket) {
            match self.confirm_answer {
                Some(answer) => ticket.resolve(answer),
                None => drop(ticket),
            }
        }
    }

    #[derive(Default)]
    struct TestNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl Notifier for TestNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().push(notice);
        }
    }

    impl TestNotifier {
        fn texts(&self) -> Vec<String> {
            self.notices.lock().iter().map(|n| n.text.clone()).collect()
        }

        fn has(&self, severity: Severity, needle: &str) -> bool {
            self.notices
                .lock()
                .iter()
                .any(|n| n.severity == severity && n.text.contains(needle))
        }
    }

    struct Harness {
        controller: Arc<SessionController>,
        frontend: Arc<TestFrontend>,
        notifier: Arc<TestNotifier>,
        _dir: TempDir,
    }

    fn harness(server_uri: &str, frontend: TestFrontend) -> Harness {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig {
            api_root: server_uri.to_string(),
            storage_path: dir.path().join("tokens.json"),
            ..ClientConfig::default()
        };
        let frontend = Arc::new(frontend);
        let notifier = Arc::new(TestNotifier::default());
        let controller = SessionController::new(
            config,
            Arc::clone(&frontend) as Arc<dyn Frontend>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        )
        .unwrap();
        Harness {
            controller,
            frontend,
            notifier,
            _dir: dir,
        }
    }

    async fn mount_voter_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/auth/login/voter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-voter",
                "token_type": "bearer",
                "name": "Carlos Pérez",
                "code": "1-201",
                "skip_power_question": false
            })))
            .mount(server)
            .await;
    }

    fn yes_no_question(id: i64) -> ActiveQuestion {
        ActiveQuestion {
            id,
            text: "¿Aprueba el presupuesto?".into(),
            question_type: QuestionType::YesNo,
            closed: false,
            allow_multiple: false,
            max_selections: 1,
            options: vec![],
            remaining_seconds: None,
        }
    }

    #[tokio::test]
    async fn malformed_code_blocks_network_entirely() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());

        let err = h.controller.login_voter("abc", false).await.unwrap_err();
        assert_matches!(
            err,
            SessionError::Validation(ValidationError::BadAccessCode)
        );
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(h.notifier.has(Severity::Error, "Código inválido"));
        assert!(h.controller.session().is_none());
    }

    #[tokio::test]
    async fn voter_login_persists_token_and_enters_home() {
        let server = MockServer::start().await;
        mount_voter_login(&server).await;

        let h = harness(&server.uri(), TestFrontend::default());
        h.controller.login_voter(" 1-201 ", false).await.unwrap();

        let session = h.controller.session().unwrap();
        assert_eq!(session.role, Role::Voter);
        assert_eq!(session.identity.name, "Carlos Pérez");

        let homes = h.frontend.homes.lock();
        assert_eq!(homes.len(), 1);
        assert!(!homes[0].1);
        drop(homes);

        assert!(h.notifier.has(Severity::Success, "Bienvenido, Carlos Pérez"));

        // Token and code were persisted for resumption.
        let store = TokenStore::new(h._dir.path().join("tokens.json"));
        assert_eq!(store.token(Role::Voter).as_deref(), Some("tok-voter"));
        assert_eq!(store.voter_code().as_deref(), Some("1-201"));
    }

    #[tokio::test]
    async fn demo_code_never_touches_the_backend() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());

        h.controller.login_voter("0-000", false).await.unwrap();

        assert!(h.controller.is_demo());
        assert!(!h.controller.channel_open(Role::Voter));
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(h.notifier.has(Severity::Info, "demostración"));
        // The UI still gets an (empty) questions view to exercise.
        assert_eq!(h.frontend.question_views.lock().len(), 1);
    }

    #[tokio::test]
    async fn logout_twice_is_a_noop_the_second_time() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());

        h.controller.login_voter("0-000", false).await.unwrap();
        h.controller.logout();
        assert!(h.controller.session().is_none());
        assert_eq!(h.frontend.login_screens.load(Ordering::SeqCst), 1);

        h.controller.logout();
        assert_eq!(h.frontend.login_screens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn vote_success_reloads_questions_and_toasts() {
        let server = MockServer::start().await;
        mount_voter_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/voting/vote"))
            .and(body_json(json!({"question_id": 42, "answer": "SÍ"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "voto registrado",
                "answers": ["SÍ"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/voting/questions/active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/voting/my-votes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let h = harness(&server.uri(), TestFrontend::confirming(true));
        h.controller.login_voter("1-201", false).await.unwrap();

        let views_before = h.frontend.question_views.lock().len();
        h.controller
            .vote(&yes_no_question(42), VoteAnswer::One("SÍ".into()))
            .await
            .unwrap();

        assert!(h.notifier.has(Severity::Success, "Voto registrado"));
        // The reload after voting is awaited inline.
        assert!(h.frontend.question_views.lock().len() > views_before);
    }

    #[tokio::test]
    async fn duplicate_vote_shows_fixed_warning() {
        let server = MockServer::start().await;
        mount_voter_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/voting/vote"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"detail": "Ya votó en esta pregunta"})),
            )
            .mount(&server)
            .await;

        let h = harness(&server.uri(), TestFrontend::confirming(true));
        h.controller.login_voter("1-201", false).await.unwrap();

        h.controller
            .vote(&yes_no_question(42), VoteAnswer::One("SÍ".into()))
            .await
            .unwrap();

        assert!(h.notifier.has(Severity::Warning, "Ya has votado en esta pregunta"));
    }

    #[tokio::test]
    async fn denied_confirmation_sends_nothing() {
        let server = MockServer::start().await;
        mount_voter_login(&server).await;

        let h = harness(&server.uri(), TestFrontend::confirming(false));
        h.controller.login_voter("1-201", false).await.unwrap();

        h.controller
            .vote(&yes_no_question(42), VoteAnswer::One("SÍ".into()))
            .await
            .unwrap();

        let vote_requests: usize = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/voting/vote")
            .count();
        assert_eq!(vote_requests, 0);
        assert!(h.notifier.has(Severity::Info, "Voto cancelado"));
    }

    #[tokio::test]
    async fn vote_without_session_is_rejected() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::confirming(true));

        let err = h
            .controller
            .vote(&yes_no_question(1), VoteAnswer::One("Sí".into()))
            .await
            .unwrap_err();
        assert_matches!(err, SessionError::NotAuthenticated);
    }

    #[tokio::test]
    async fn too_many_selections_blocked_before_network() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::confirming(true));
        h.controller.login_voter("0-000", false).await.unwrap();

        let question = ActiveQuestion {
            allow_multiple: true,
            max_selections: 2,
            ..yes_no_question(9)
        };
        let err = h
            .controller
            .vote(
                &question,
                VoteAnswer::Many(vec!["a".into(), "b".into(), "c".into()]),
            )
            .await
            .unwrap_err();
        assert_matches!(
            err,
            SessionError::Validation(ValidationError::TooManySelections(2))
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_login_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-admin",
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let h = harness(&server.uri(), TestFrontend::default());
        h.controller.login_admin("admin", "secreto").await.unwrap();

        assert_eq!(h.controller.role(), Some(Role::Admin));
        assert!(h.notifier.has(Severity::Success, "administrador"));

        let store = TokenStore::new(h._dir.path().join("tokens.json"));
        assert_eq!(store.token(Role::Admin).as_deref(), Some("tok-admin"));
    }

    #[tokio::test]
    async fn empty_admin_credentials_rejected_locally() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());

        let err = h.controller.login_admin("  ", "x").await.unwrap_err();
        assert_matches!(err, SessionError::Validation(ValidationError::EmptyField("usuario")));
        let err = h.controller.login_admin("admin", "").await.unwrap_err();
        assert_matches!(
            err,
            SessionError::Validation(ValidationError::EmptyField("contraseña"))
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resume_restores_admin_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/solo-admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"msg": "ok"})))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        store.set_token(Role::Admin, "tok-admin").unwrap();

        let config = ClientConfig {
            api_root: server.uri(),
            storage_path: dir.path().join("tokens.json"),
            ..ClientConfig::default()
        };
        let frontend = Arc::new(TestFrontend::default());
        let notifier = Arc::new(TestNotifier::default());
        let controller = SessionController::new(
            config,
            Arc::clone(&frontend) as Arc<dyn Frontend>,
            notifier as Arc<dyn Notifier>,
        )
        .unwrap();

        assert!(controller.resume().await.unwrap());
        assert_eq!(controller.role(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn resume_clears_stale_token_silently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/solo-admin"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expirado"})))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        store.set_token(Role::Admin, "stale").unwrap();

        let config = ClientConfig {
            api_root: server.uri(),
            storage_path: dir.path().join("tokens.json"),
            ..ClientConfig::default()
        };
        let frontend = Arc::new(TestFrontend::default());
        let notifier = Arc::new(TestNotifier::default());
        let controller = SessionController::new(
            config,
            frontend as Arc<dyn Frontend>,
            notifier as Arc<dyn Notifier>,
        )
        .unwrap();

        assert!(!controller.resume().await.unwrap());
        assert!(store.token(Role::Admin).is_none());
        assert!(controller.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn question_expired_logs_warning_once_per_window() {
        let server_uri = "http://127.0.0.1:1"; // never reached in this test
        let h = harness(server_uri, TestFrontend::default());

        let router = AdminRouter::new(h.controller.hooks());
        let frame = r#"{"type":"question_expired","data":{"question_id":7,"text":"X"}}"#;

        router.dispatch(frame);
        // Identical repeat one second later: suppressed by the router.
        tokio::time::advance(Duration::from_secs(1)).await;
        router.dispatch(frame);

        let log = h.controller.activity_log();
        let warnings: Vec<_> = log
            .entries()
            .into_iter()
            .filter(|e| e.tag == "warning")
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].text.contains("Pregunta expirada"));
        assert_eq!(
            h.notifier
                .notices
                .lock()
                .iter()
                .filter(|n| n.severity == Severity::Warning)
                .count(),
            1
        );

        // Past the dedup window the next expiry is recorded again.
        tokio::time::advance(Duration::from_secs(5)).await;
        router.dispatch(frame);
        let warnings = log
            .entries()
            .into_iter()
            .filter(|e| e.tag == "warning")
            .count();
        assert_eq!(warnings, 2);
    }

    #[tokio::test]
    async fn forced_disconnect_tears_down_then_shows_login() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());
        h.controller.login_voter("0-000", false).await.unwrap();

        let router = VoterRouter::new(h.controller.hooks());
        router.dispatch(r#"{"type":"force_disconnect","data":{"reason":"sesión duplicada"}}"#);

        // Teardown happens promptly; the screen transition waits ~2 s.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(h.controller.session().is_none());
        assert_eq!(h.frontend.login_screens.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(SESSION_END_DELAY_MS)).await;
        assert_eq!(h.frontend.login_screens.load(Ordering::SeqCst), 1);
        assert!(h.notifier.has(Severity::Warning, "sesión duplicada"));
    }

    #[tokio::test]
    async fn system_reset_reloads_the_client() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());
        h.controller.login_voter("0-000", false).await.unwrap();

        let router = VoterRouter::new(h.controller.hooks());
        router.dispatch(r#"{"type":"system_reset","data":{}}"#);

        tokio::time::sleep(Duration::from_millis(SESSION_END_DELAY_MS + 500)).await;
        assert!(h.controller.session().is_none());
        assert_eq!(h.frontend.reloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wrong_role_is_rejected() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());
        h.controller.login_voter("0-000", false).await.unwrap();

        let err = h.controller.refresh_admin().await.unwrap_err();
        assert_matches!(err, SessionError::WrongRole("admin"));
    }

    #[tokio::test]
    async fn countdown_extension_updates_registry() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());
        h.controller.login_voter("0-000", false).await.unwrap();

        let router = VoterRouter::new(h.controller.hooks());
        router.dispatch(
            r#"{"type":"countdown_extended","data":{"question_id":4,"remaining_seconds":120}}"#,
        );
        assert_eq!(h.controller.countdown_remaining(4), Some(120));

        // Deleting the question drops its countdown.
        router.dispatch(r#"{"type":"question_deleted","data":{"question_id":4}}"#);
        assert!(h.controller.countdown_remaining(4).is_none());
    }

    #[tokio::test]
    async fn notifier_sees_every_severity_used() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), TestFrontend::default());
        h.controller.login_voter("0-000", false).await.unwrap();

        let router = VoterRouter::new(h.controller.hooks());
        router.dispatch(r#"{"type":"admin_broadcast","data":{"message":"La asamblea empieza"}}"#);
        assert!(h.notifier.texts().iter().any(|t| t == "La asamblea empieza"));
    }
}
