//! REST client for the assembly backend.
//!
//! One [`ApiClient`] serves both roles; each call attaches the bearer token
//! stored for the role that endpoint requires. Paths and payload shapes are
//! the backend's wire contract and must not drift.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use asamblea_core::models::{
    ActiveQuestion, AdminLoginReply, AforoSnapshot, BulkEntry, BulkSummary, CreatedQuestion,
    MyVote, NewQuestion, Participant, QuestionResults, Role, StatusReply, ToggleOutcome,
    UploadSummary, VoteReceipt, VoteRequest, VoterLoginReply,
};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::storage::TokenStore;

/// A downloaded report: bytes plus the filename to save them under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    /// Suggested filename, derived from the organization name.
    pub filename: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

#[derive(Deserialize)]
struct MsgReply {
    msg: String,
}

#[derive(Deserialize)]
struct ConjuntoReply {
    nombre: String,
}

/// REST client over the configured API root.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    store: Arc<TokenStore>,
}

impl ApiClient {
    /// Build a client for the configured API root.
    pub fn new(config: &ClientConfig, store: Arc<TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base: config.api_root.trim_end_matches('/').to_string(),
            store,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn bearer(&self, role: Role) -> Result<String, ApiError> {
        self.store
            .token(role)
            .ok_or(ApiError::MissingToken(role.as_str()))
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    // ─── Auth ────────────────────────────────────────────────────────────

    /// Admin credential exchange. The backend expects an OAuth2 password
    /// form, not JSON.
    pub async fn login_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminLoginReply, ApiError> {
        let response = self
            .http
            .post(self.endpoint("/auth/login/admin"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Voter credential exchange by access code. Marks attendance
    /// server-side.
    pub async fn login_voter(
        &self,
        code: &str,
        is_power: bool,
    ) -> Result<VoterLoginReply, ApiError> {
        let response = self
            .http
            .post(self.endpoint("/auth/login/voter"))
            .json(&serde_json::json!({ "code": code, "is_power": is_power }))
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Create a backend user (admin bootstrap flows).
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.endpoint("/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "role": role.as_str(),
            }))
            .send()
            .await?;
        let reply: MsgReply = Self::checked(response).await?.json().await?;
        Ok(reply.msg)
    }

    /// Probe a stored token for session resumption.
    pub async fn probe(&self, role: Role) -> Result<(), ApiError> {
        let path = match role {
            Role::Admin => "/auth/solo-admin",
            Role::Voter => "/auth/solo-voter",
        };
        let response = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(self.bearer(role)?)
            .send()
            .await?;
        let _ = Self::checked(response).await?;
        Ok(())
    }

    // ─── Voting ──────────────────────────────────────────────────────────

    /// Active questions with options. Available to both roles.
    pub async fn active_questions(&self, role: Role) -> Result<Vec<ActiveQuestion>, ApiError> {
        let response = self
            .http
            .get(self.endpoint("/voting/questions/active"))
            .bearer_auth(self.bearer(role)?)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Create a question (admin).
    pub async fn create_question(&self, question: &NewQuestion) -> Result<CreatedQuestion, ApiError> {
        let response = self
            .http
            .post(self.endpoint("/voting/questions"))
            .bearer_auth(self.bearer(Role::Admin)?)
            .json(question)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Submit a vote (voter).
    pub async fn vote(&self, request: &VoteRequest) -> Result<VoteReceipt, ApiError> {
        debug!(question_id = request.question_id, "submitting vote");
        let response = self
            .http
            .post(self.endpoint("/voting/vote"))
            .bearer_auth(self.bearer(Role::Voter)?)
            .json(request)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// This voter's recorded votes.
    pub async fn my_votes(&self) -> Result<Vec<MyVote>, ApiError> {
        let response = self
            .http
            .get(self.endpoint("/voting/my-votes"))
            .bearer_auth(self.bearer(Role::Voter)?)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Toggle a question open/closed (admin).
    pub async fn toggle_question(&self, question_id: i64) -> Result<ToggleOutcome, ApiError> {
        let response = self
            .http
            .put(self.endpoint(&format!("/voting/questions/{question_id}/toggle")))
            .bearer_auth(self.bearer(Role::Admin)?)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Delete a question and its votes (admin).
    pub async fn delete_question(&self, question_id: i64) -> Result<StatusReply, ApiError> {
        let response = self
            .http
            .delete(self.endpoint(&format!("/voting/questions/{question_id}")))
            .bearer_auth(self.bearer(Role::Admin)?)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Live results for one question (admin).
    pub async fn results(&self, question_id: i64) -> Result<QuestionResults, ApiError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/voting/results/{question_id}")))
            .bearer_auth(self.bearer(Role::Admin)?)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Quorum snapshot (admin).
    pub async fn aforo(&self) -> Result<AforoSnapshot, ApiError> {
        let response = self
            .http
            .get(self.endpoint("/voting/aforo"))
            .bearer_auth(self.bearer(Role::Admin)?)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Wipe questions, votes and the roster (admin).
    pub async fn reset_assembly(&self) -> Result<StatusReply, ApiError> {
        let response = self
            .http
            .delete(self.endpoint("/voting/admin/reset"))
            .bearer_auth(self.bearer(Role::Admin)?)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    // ─── Participants ────────────────────────────────────────────────────

    /// Full roster (admin). Note the trailing slash: the backend router
    /// serves the collection at `/participants/`.
    pub async fn participants(&self) -> Result<Vec<Participant>, ApiError> {
        let response = self
            .http
            .get(self.endpoint("/participants/"))
            .bearer_auth(self.bearer(Role::Admin)?)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Bulk roster upload from the pre-generated JSON map (admin).
    pub async fn bulk_upload(
        &self,
        entries: &BTreeMap<String, BulkEntry>,
    ) -> Result<BulkSummary, ApiError> {
        let response = self
            .http
            .post(self.endpoint("/participants/bulk"))
            .bearer_auth(self.bearer(Role::Admin)?)
            .json(entries)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Upload the roster spreadsheet (admin).
    pub async fn upload_roster(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadSummary, ApiError> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        let response = self
            .http
            .post(self.endpoint("/participants/upload-xlsx"))
            .bearer_auth(self.bearer(Role::Admin)?)
            .multipart(form)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Stored organization name (admin).
    pub async fn conjunto_name(&self) -> Result<String, ApiError> {
        let response = self
            .http
            .get(self.endpoint("/participants/conjunto/nombre"))
            .bearer_auth(self.bearer(Role::Admin)?)
            .send()
            .await?;
        let reply: ConjuntoReply = Self::checked(response).await?.json().await?;
        Ok(reply.nombre)
    }

    /// Store the organization name (admin).
    pub async fn set_conjunto_name(&self, nombre: &str) -> Result<StatusReply, ApiError> {
        let response = self
            .http
            .post(self.endpoint("/participants/conjunto/nombre"))
            .bearer_auth(self.bearer(Role::Admin)?)
            .json(&serde_json::json!({ "nombre": nombre }))
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Full assembly report as PDF (admin).
    pub async fn attendance_pdf(&self, conjunto: &str) -> Result<Download, ApiError> {
        self.download(
            "/participants/asistencia/pdf",
            format!("reporte_completo_{}.pdf", filename_part(conjunto)),
        )
        .await
    }

    /// Attendance sheet as a spreadsheet (admin).
    pub async fn attendance_xlsx(&self, conjunto: &str) -> Result<Download, ApiError> {
        self.download(
            "/participants/asistencia/xlsx",
            format!("asistencia_{}.xlsx", filename_part(conjunto)),
        )
        .await
    }

    async fn download(&self, path: &str, filename: String) -> Result<Download, ApiError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(self.bearer(Role::Admin)?)
            .send()
            .await?;
        let bytes = Self::checked(response).await?.bytes().await?;
        Ok(Download {
            filename,
            bytes: bytes.to_vec(),
        })
    }
}

/// The backend derives report filenames from the organization name with
/// spaces replaced by underscores; mirror that here.
fn filename_part(conjunto: &str) -> String {
    conjunto.replace(' ', "_")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
