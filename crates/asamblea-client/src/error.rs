//! REST error convention.
//!
//! Non-2xx responses carry a JSON body whose `detail` field is the
//! user-facing message; when the body is absent or unparseable the message
//! falls back to `HTTP <status>`. REST calls are never retried
//! automatically — the user retries through the UI.

use thiserror::Error;

/// A failed REST call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the request. `detail` is already user-facing.
    #[error("{detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Backend `detail` message, or `HTTP <status>`.
        detail: String,
    },

    /// The request never produced a response (connection refused, DNS,
    /// timeout, body decode).
    #[error("error de red: {0}")]
    Transport(#[from] reqwest::Error),

    /// No stored token for the role this endpoint requires.
    #[error("no hay sesión activa de {0}")]
    MissingToken(&'static str),
}

impl ApiError {
    /// Build a `Status` error from a non-2xx response, extracting `detail`.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let detail = match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("detail")
                .and_then(|d| d.as_str())
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("HTTP {status}")),
            Err(_) => format!("HTTP {status}"),
        };
        Self::Status { status, detail }
    }

    /// User-facing message.
    #[must_use]
    pub fn detail(&self) -> String {
        self.to_string()
    }

    /// Whether this is an authentication/authorization rejection.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == 401 || *status == 403)
            || matches!(self, Self::MissingToken(_))
    }

    /// Whether the backend rejected a vote as a duplicate. Both backend
    /// revisions of the message are accepted.
    #[must_use]
    pub fn is_already_voted(&self) -> bool {
        matches!(
            self,
            Self::Status { detail, .. }
                if detail.contains("Ya votó") || detail.contains("Ya has votado")
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
