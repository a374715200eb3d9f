//! Push-channel wire messages.
//!
//! Every inbound frame is a JSON object `{"type": string, "data": object}`.
//! The envelope is parsed first ([`Frame`]), then the `type` tag selects a
//! typed payload. Unknown tags decode to `None` so the router can log and
//! ignore them without treating the frame as malformed — new backend
//! message kinds must not break older clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::ActiveQuestion;

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Raw inbound frame envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Message kind tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    /// Parse a frame from raw channel text.
    pub fn parse(raw: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Frame decoding failure. Malformed frames are dropped with a log; they
/// never crash the read loop.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame or its payload was not valid JSON for the expected shape.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Voter channel events
// ─────────────────────────────────────────────────────────────────────────────

/// Payload of `question_status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionStatus {
    /// Affected question.
    pub question_id: i64,
    /// New closed state.
    pub closed: bool,
}

/// Payload of `countdown_extended`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountdownExtended {
    /// Affected question.
    pub question_id: i64,
    /// Authoritative remaining seconds; replaces the local countdown.
    pub remaining_seconds: u64,
}

/// Typed events on the voter channel.
#[derive(Clone, Debug, PartialEq)]
pub enum VoterEvent {
    /// A new question is open for voting.
    NewQuestion(ActiveQuestion),
    /// A question was opened or closed.
    QuestionStatus(QuestionStatus),
    /// A question was deleted.
    QuestionDeleted {
        /// Deleted question id.
        question_id: i64,
    },
    /// A timed question's deadline moved.
    CountdownExtended(CountdownExtended),
    /// Free-text broadcast from the administrator.
    AdminBroadcast {
        /// Broadcast text.
        message: String,
    },
    /// The assembly was reset. Terminal for the session.
    SystemReset,
    /// The server evicted this client. Terminal for the session.
    ForceDisconnect {
        /// Optional human-readable reason.
        reason: Option<String>,
    },
}

impl VoterEvent {
    /// Wire tag of this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewQuestion(_) => "new_question",
            Self::QuestionStatus(_) => "question_status",
            Self::QuestionDeleted { .. } => "question_deleted",
            Self::CountdownExtended(_) => "countdown_extended",
            Self::AdminBroadcast { .. } => "admin_broadcast",
            Self::SystemReset => "system_reset",
            Self::ForceDisconnect { .. } => "force_disconnect",
        }
    }

    /// Decode a voter-channel frame. `Ok(None)` means the tag is unknown.
    pub fn decode(frame: &Frame) -> Result<Option<Self>, FrameError> {
        let data = &frame.data;
        let event = match frame.kind.as_str() {
            "new_question" => Self::NewQuestion(from_data(data)?),
            "question_status" => Self::QuestionStatus(from_data(data)?),
            "question_deleted" => Self::QuestionDeleted {
                question_id: field(data, "question_id")?,
            },
            "countdown_extended" => Self::CountdownExtended(from_data(data)?),
            "admin_broadcast" => Self::AdminBroadcast {
                message: field(data, "message")?,
            },
            "system_reset" => Self::SystemReset,
            "force_disconnect" => Self::ForceDisconnect {
                reason: optional_field(data, "reason"),
            },
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin channel events
// ─────────────────────────────────────────────────────────────────────────────

/// Payload of `question_expired`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionExpired {
    /// Expired question.
    pub question_id: i64,
    /// Question text, for the activity log.
    pub text: String,
}

/// Severity attached to a generic admin notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational.
    #[default]
    Info,
    /// Needs attention.
    Warning,
    /// Something failed.
    Error,
}

/// Typed events on the admin channel.
#[derive(Clone, Debug, PartialEq)]
pub enum AdminEvent {
    /// A participant registered attendance.
    AttendanceRegistered {
        /// Participant access code.
        code: String,
        /// Participant name, when the server includes it.
        name: Option<String>,
    },
    /// A vote was recorded.
    VoteRegistered {
        /// Question voted on, when the server includes it.
        question_id: Option<i64>,
    },
    /// A question was created.
    QuestionCreated {
        /// New question id.
        question_id: i64,
    },
    /// A participant was removed from the roster.
    ParticipantRemoved {
        /// Removed participant's access code.
        code: String,
    },
    /// A timed question reached its deadline. Deduplicated per question id
    /// by the router.
    QuestionExpired(QuestionExpired),
    /// Generic server notification.
    Notification {
        /// Message text.
        message: String,
        /// Display severity.
        level: NoticeLevel,
    },
}

impl AdminEvent {
    /// Wire tag of this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AttendanceRegistered { .. } => "attendance_registered",
            Self::VoteRegistered { .. } => "vote_registered",
            Self::QuestionCreated { .. } => "question_created",
            Self::ParticipantRemoved { .. } => "participant_removed",
            Self::QuestionExpired(_) => "question_expired",
            Self::Notification { .. } => "notification",
        }
    }

    /// Decode an admin-channel frame. `Ok(None)` means the tag is unknown.
    pub fn decode(frame: &Frame) -> Result<Option<Self>, FrameError> {
        let data = &frame.data;
        let event = match frame.kind.as_str() {
            "attendance_registered" => Self::AttendanceRegistered {
                code: field(data, "code")?,
                name: optional_field(data, "name"),
            },
            "vote_registered" => Self::VoteRegistered {
                question_id: optional_field(data, "question_id"),
            },
            "question_created" => Self::QuestionCreated {
                question_id: field(data, "question_id")?,
            },
            "participant_removed" => Self::ParticipantRemoved {
                code: field(data, "code")?,
            },
            "question_expired" => Self::QuestionExpired(from_data(data)?),
            "notification" => Self::Notification {
                message: field(data, "message")?,
                level: optional_field(data, "level").unwrap_or_default(),
            },
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload helpers
// ─────────────────────────────────────────────────────────────────────────────

fn from_data<T: serde::de::DeserializeOwned>(data: &Value) -> Result<T, FrameError> {
    Ok(serde_json::from_value(data.clone())?)
}

fn field<T: serde::de::DeserializeOwned>(data: &Value, name: &str) -> Result<T, FrameError> {
    Ok(serde_json::from_value(
        data.get(name).cloned().unwrap_or(Value::Null),
    )?)
}

fn optional_field<T: serde::de::DeserializeOwned>(data: &Value, name: &str) -> Option<T> {
    data.get(name)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn frame(kind: &str, data: Value) -> Frame {
        Frame {
            kind: kind.into(),
            data,
        }
    }

    #[test]
    fn parse_frame_envelope() {
        let f = Frame::parse(r#"{"type": "system_reset", "data": {}}"#).unwrap();
        assert_eq!(f.kind, "system_reset");
    }

    #[test]
    fn parse_frame_without_data_field() {
        let f = Frame::parse(r#"{"type": "system_reset"}"#).unwrap();
        assert_eq!(f.data, Value::Null);
        assert_matches!(
            VoterEvent::decode(&f).unwrap(),
            Some(VoterEvent::SystemReset)
        );
    }

    #[test]
    fn parse_malformed_frame_is_error() {
        assert!(Frame::parse("{not json").is_err());
        assert!(Frame::parse(r#"{"data": {}}"#).is_err());
    }

    #[test]
    fn voter_new_question_decodes() {
        let f = frame(
            "new_question",
            json!({
                "id": 9,
                "text": "¿Aprueba?",
                "type": "yesno",
                "closed": false,
                "allow_multiple": false,
                "max_selections": 1,
                "options": [{"text": "Sí"}, {"text": "No"}]
            }),
        );
        let event = VoterEvent::decode(&f).unwrap().unwrap();
        assert_eq!(event.kind(), "new_question");
        assert_matches!(event, VoterEvent::NewQuestion(q) if q.id == 9);
    }

    #[test]
    fn voter_question_status_decodes() {
        let f = frame("question_status", json!({"question_id": 4, "closed": true}));
        assert_matches!(
            VoterEvent::decode(&f).unwrap(),
            Some(VoterEvent::QuestionStatus(QuestionStatus {
                question_id: 4,
                closed: true,
            }))
        );
    }

    #[test]
    fn voter_countdown_extended_decodes() {
        let f = frame(
            "countdown_extended",
            json!({"question_id": 4, "remaining_seconds": 120}),
        );
        assert_matches!(
            VoterEvent::decode(&f).unwrap(),
            Some(VoterEvent::CountdownExtended(CountdownExtended {
                question_id: 4,
                remaining_seconds: 120,
            }))
        );
    }

    #[test]
    fn voter_force_disconnect_with_and_without_reason() {
        let f = frame("force_disconnect", json!({"reason": "sesión duplicada"}));
        assert_matches!(
            VoterEvent::decode(&f).unwrap(),
            Some(VoterEvent::ForceDisconnect { reason: Some(r) }) if r == "sesión duplicada"
        );

        let f = frame("force_disconnect", json!({}));
        assert_matches!(
            VoterEvent::decode(&f).unwrap(),
            Some(VoterEvent::ForceDisconnect { reason: None })
        );
    }

    #[test]
    fn voter_unknown_kind_is_none() {
        let f = frame("confetti", json!({"x": 1}));
        assert!(VoterEvent::decode(&f).unwrap().is_none());
    }

    #[test]
    fn voter_malformed_payload_is_error() {
        let f = frame("question_status", json!({"question_id": "not a number"}));
        assert!(VoterEvent::decode(&f).is_err());
    }

    #[test]
    fn admin_question_expired_decodes() {
        let f = frame("question_expired", json!({"question_id": 7, "text": "X"}));
        let event = AdminEvent::decode(&f).unwrap().unwrap();
        assert_eq!(event.kind(), "question_expired");
        assert_matches!(
            event,
            AdminEvent::QuestionExpired(QuestionExpired { question_id: 7, .. })
        );
    }

    #[test]
    fn admin_attendance_with_optional_name() {
        let f = frame("attendance_registered", json!({"code": "1-201"}));
        assert_matches!(
            AdminEvent::decode(&f).unwrap(),
            Some(AdminEvent::AttendanceRegistered { code, name: None }) if code == "1-201"
        );
    }

    #[test]
    fn admin_notification_default_level() {
        let f = frame("notification", json!({"message": "hola"}));
        assert_matches!(
            AdminEvent::decode(&f).unwrap(),
            Some(AdminEvent::Notification {
                level: NoticeLevel::Info,
                ..
            })
        );

        let f = frame(
            "notification",
            json!({"message": "ojo", "level": "warning"}),
        );
        assert_matches!(
            AdminEvent::decode(&f).unwrap(),
            Some(AdminEvent::Notification {
                level: NoticeLevel::Warning,
                ..
            })
        );
    }

    #[test]
    fn admin_unknown_kind_is_none() {
        let f = frame("new_question", json!({}));
        // Voter kinds are unknown on the admin channel.
        assert!(AdminEvent::decode(&f).unwrap().is_none());
    }

    #[test]
    fn admin_missing_required_field_is_error() {
        let f = frame("participant_removed", json!({}));
        assert!(AdminEvent::decode(&f).is_err());
    }
}
