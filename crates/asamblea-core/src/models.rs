//! Domain types mirrored from the backend wire format.
//!
//! Field names and casing follow the backend JSON exactly; where the
//! backend emits SQLite integers for booleans (participant rows), the
//! [`int_bool`] codec accepts both forms.

use serde::{Deserialize, Serialize};

use crate::constants::QUORUM_THRESHOLD_PERCENT;

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Authenticated role. At most one live session per controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Assembly administrator.
    Admin,
    /// Registered participant (or proxy holder).
    Voter,
}

impl Role {
    /// Lowercase wire/storage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Voter => "voter",
        }
    }
}

/// Who the session belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Access code (`torre-apto`) for voters, a fixed label for admins.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Voting-weight percentage. Not reported by the login endpoints for
    /// admins, hence optional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<f64>,
}

/// A live authenticated session.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// Role the bearer token was issued for.
    pub role: Role,
    /// Opaque bearer token.
    pub token: String,
    /// Owner identity.
    pub identity: Identity,
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth replies
// ─────────────────────────────────────────────────────────────────────────────

/// Reply to `POST /auth/login/admin`.
#[derive(Clone, Debug, Deserialize)]
pub struct AdminLoginReply {
    /// Bearer token.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
}

/// Reply to `POST /auth/login/voter`.
#[derive(Clone, Debug, Deserialize)]
pub struct VoterLoginReply {
    /// Bearer token.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
    /// Participant display name.
    pub name: String,
    /// Normalized access code.
    pub code: String,
    /// True when the participant already answered the proxy question on a
    /// previous login; the prompt is not shown again.
    pub skip_power_question: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Questions and votes
// ─────────────────────────────────────────────────────────────────────────────

/// Question kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Two fixed options, `Sí` and `No`.
    YesNo,
    /// Free-form option list, at least two entries.
    Multiple,
}

impl QuestionType {
    /// Wire name (`yesno` / `multiple`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YesNo => "yesno",
            Self::Multiple => "multiple",
        }
    }
}

/// One selectable option of an active question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Option label.
    pub text: String,
}

/// An active question as returned by `GET /voting/questions/active`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveQuestion {
    /// Question id.
    pub id: i64,
    /// Question text.
    pub text: String,
    /// Question kind.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Closed questions are visible but no longer accept votes.
    pub closed: bool,
    /// Whether more than one option may be selected.
    pub allow_multiple: bool,
    /// Selection ceiling when `allow_multiple` is set (1 otherwise).
    pub max_selections: u32,
    /// Options in display order.
    pub options: Vec<QuestionOption>,
    /// Seconds until server-side expiration for timed questions. Display
    /// approximation only; the server enforces the real deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
}

impl ActiveQuestion {
    /// Seconds worth registering as a countdown: present only for open,
    /// timed questions that have time left. A server value of zero means
    /// the question already expired.
    #[must_use]
    pub fn countdown_seconds(&self) -> Option<u64> {
        match self.remaining_seconds {
            Some(seconds) if !self.closed && seconds > 0 => Some(seconds),
            _ => None,
        }
    }
}

/// Payload for `POST /voting/questions`.
#[derive(Clone, Debug, Serialize)]
pub struct NewQuestion {
    /// Question text.
    pub text: String,
    /// Question kind.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Options for `multiple` questions; ignored for `yesno`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Whether voters may pick several options.
    pub allow_multiple: bool,
    /// Selection ceiling when `allow_multiple` is set.
    pub max_selections: u32,
}

/// Reply to question creation.
#[derive(Clone, Debug, Deserialize)]
pub struct CreatedQuestion {
    /// Backend status string.
    pub status: String,
    /// New question id.
    pub id: i64,
}

/// A vote answer: a single option or a multi-selection list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VoteAnswer {
    /// Single selected option.
    One(String),
    /// Multi-selection, bounded by the question's `max_selections`.
    Many(Vec<String>),
}

impl VoteAnswer {
    /// Number of selected options.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(answers) => answers.len(),
        }
    }

    /// True when no option is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(answer) => answer.is_empty(),
            Self::Many(answers) => answers.is_empty(),
        }
    }
}

/// Payload for `POST /voting/vote`.
#[derive(Clone, Debug, Serialize)]
pub struct VoteRequest {
    /// Target question.
    pub question_id: i64,
    /// Selected answer(s).
    pub answer: VoteAnswer,
}

/// Reply to a registered vote.
#[derive(Clone, Debug, Deserialize)]
pub struct VoteReceipt {
    /// Backend status string (`voto registrado`).
    pub status: String,
    /// Normalized answer list.
    pub answers: Vec<String>,
}

/// One row of `GET /voting/my-votes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MyVote {
    /// Question voted on.
    pub question_id: i64,
    /// Stored answer string (comma-joined for multi-selection).
    pub answer: String,
}

/// Reply to `PUT /voting/questions/{id}/toggle`.
#[derive(Clone, Debug, Deserialize)]
pub struct ToggleOutcome {
    /// New closed state.
    pub closed: bool,
}

/// Generic `{status}` reply (delete, reset, conjunto updates).
#[derive(Clone, Debug, Deserialize)]
pub struct StatusReply {
    /// Backend status string.
    pub status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Results and aforo
// ─────────────────────────────────────────────────────────────────────────────

/// Tally for one option, percentage expressed as summed coefficient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionTally {
    /// Option label.
    pub answer: String,
    /// Participant count that picked this option.
    pub votes: u64,
    /// Summed coefficient of those participants.
    pub percentage: f64,
}

/// Reply to `GET /voting/results/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionResults {
    /// Question id.
    pub question_id: i64,
    /// Question text.
    pub question_text: String,
    /// Question kind.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Unique participants that voted.
    pub total_participants: u64,
    /// Total recorded votes.
    pub total_votes: u64,
    /// Summed coefficient of unique participants.
    pub total_participant_coefficient: f64,
    /// Per-option tallies, sorted by percentage descending.
    pub results: Vec<OptionTally>,
}

/// Quorum snapshot from `GET /voting/aforo`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AforoSnapshot {
    /// Registered participants.
    pub total_participants: u64,
    /// Summed coefficient of all participants.
    pub total_coefficient: f64,
    /// Participants marked present.
    pub present_count: u64,
    /// Summed coefficient of present participants.
    pub present_coefficient: f64,
    /// Present participants voting for their own unit.
    pub own_votes: u64,
    /// Present participants voting by proxy.
    pub power_votes: u64,
    /// Present participants that voted on every active question.
    pub voted_count: u64,
    /// Present / total, percent.
    pub participation_rate_percent: f64,
    /// Present coefficient, percent.
    pub coefficient_rate_percent: f64,
}

impl AforoSnapshot {
    /// Whether the assembly currently has quorum.
    #[must_use]
    pub fn quorum_met(&self) -> bool {
        self.coefficient_rate_percent >= QUORUM_THRESHOLD_PERCENT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Participants
// ─────────────────────────────────────────────────────────────────────────────

/// Boolean codec for SQLite-backed rows that arrive as `0`/`1` integers.
pub mod int_bool {
    use serde::de::{self, Deserializer, Unexpected};
    use serde::ser::Serializer;
    use serde::Deserialize;
    use serde_json::Value;

    /// Serialize a bool back to the integer form the backend emits.
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    /// Accept `true`/`false`, `0`/`1`, or `null` (treated as false).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(de::Error::invalid_value(
                    Unexpected::Other("out-of-range integer"),
                    &"0 or 1",
                )),
            },
            Value::Null => Ok(false),
            other => Err(de::Error::invalid_value(
                Unexpected::Other(&format!("{other}")),
                &"boolean or 0/1",
            )),
        }
    }
}

/// One participant row from `GET /participants/`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Access code (`torre-apto`), uppercase.
    pub code: String,
    /// Owner name.
    pub name: String,
    /// Voting-weight percentage.
    pub coefficient: f64,
    /// Marked present after first login.
    #[serde(with = "int_bool", default)]
    pub present: bool,
    /// Attending by proxy.
    #[serde(with = "int_bool", default)]
    pub is_power: bool,
    /// Voted on every active question.
    #[serde(with = "int_bool", default)]
    pub has_voted: bool,
    /// First login timestamp (ISO 8601), absent until attendance.
    #[serde(default)]
    pub login_time: Option<String>,
}

/// One entry of the bulk-upload map (`POST /participants/bulk`). The wire
/// keys are the Spanish ones the roster script generates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkEntry {
    /// Owner name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Voting-weight percentage.
    #[serde(rename = "coeficiente")]
    pub coefficient: f64,
    /// Pre-marked as having voted (normally false).
    #[serde(rename = "ha_votado")]
    pub has_voted: bool,
}

/// Reply to the bulk upload.
#[derive(Clone, Debug, Deserialize)]
pub struct BulkSummary {
    /// Backend status string.
    pub status: String,
    /// Rows inserted or replaced.
    #[serde(rename = "cantidad")]
    pub count: u64,
}

/// Reply to the roster spreadsheet upload.
#[derive(Clone, Debug, Deserialize)]
pub struct UploadSummary {
    /// Backend status string.
    pub status: String,
    /// Rows inserted or replaced.
    pub inserted: u64,
    /// Workbook sheets processed.
    pub sheets_processed: u64,
}

/// Organization name payload (`/participants/conjunto/nombre`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConjuntoName {
    /// Display name of the residential complex.
    pub nombre: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
