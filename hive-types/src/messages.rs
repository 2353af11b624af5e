//! Frames exchanged over the persistent connection.
//!
//! Inbound frames are `{ "type": ..., "data": ..., "timestamp": ... }` JSON
//! objects whose `data` shape depends on `type`. [`ServerEvent`] turns that
//! loosely-typed envelope into one variant per known tag, with an explicit
//! [`ServerEvent::Unknown`] for everything else.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Question, TypesError};

/// Raw inbound envelope, before the payload is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    /// Event tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Tag-dependent payload.
    #[serde(default)]
    pub data: Option<Value>,
    /// Server send time, informational only.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A typed server push event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Full snapshot sent right after the connection opens.
    InitialData(Vec<Question>),
    /// Full snapshot in reply to `get_questions`.
    QuestionsList(Vec<Question>),
    /// Full snapshot in reply to `refresh`.
    RefreshData(Vec<Question>),
    /// A question was created.
    NewQuestion(Question),
    /// An answer was appended; carries the whole updated question.
    AnswerAdded(Question),
    /// A question changed status; carries the whole updated question.
    QuestionStatusChanged(Question),
    /// Heartbeat reply.
    Pong,
    /// Any tag this client does not know.
    Unknown {
        /// The unrecognised tag.
        kind: String,
        /// Payload, left uninterpreted.
        data: Option<Value>,
    },
}

impl ServerEvent {
    /// Parse a raw text frame.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let frame: InboundFrame = serde_json::from_str(raw).map_err(TypesError::Malformed)?;
        Self::from_frame(frame)
    }

    /// Interpret an already-decoded envelope.
    pub fn from_frame(frame: InboundFrame) -> Result<Self, TypesError> {
        let InboundFrame { kind, data, .. } = frame;
        let event = match kind.as_str() {
            "initial_data" => Self::InitialData(snapshot(&kind, data)?),
            "questions_list" => Self::QuestionsList(snapshot(&kind, data)?),
            "refresh_data" => Self::RefreshData(snapshot(&kind, data)?),
            "new_question" => Self::NewQuestion(record(&kind, data)?),
            "answer_added" => Self::AnswerAdded(record(&kind, data)?),
            "question_status_changed" => Self::QuestionStatusChanged(record(&kind, data)?),
            "pong" => Self::Pong,
            _ => Self::Unknown { kind, data },
        };
        Ok(event)
    }

    /// The wire tag of this event.
    pub fn kind(&self) -> &str {
        match self {
            Self::InitialData(_) => "initial_data",
            Self::QuestionsList(_) => "questions_list",
            Self::RefreshData(_) => "refresh_data",
            Self::NewQuestion(_) => "new_question",
            Self::AnswerAdded(_) => "answer_added",
            Self::QuestionStatusChanged(_) => "question_status_changed",
            Self::Pong => "pong",
            Self::Unknown { kind, .. } => kind,
        }
    }
}

/// Snapshot payloads: absent or null means "no questions".
fn snapshot(kind: &str, data: Option<Value>) -> Result<Vec<Question>, TypesError> {
    match data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(|source| TypesError::InvalidPayload {
            kind: kind.to_string(),
            source,
        }),
    }
}

fn record(kind: &str, data: Option<Value>) -> Result<Question, TypesError> {
    let value = data.ok_or_else(|| TypesError::MissingPayload(kind.to_string()))?;
    serde_json::from_value(value).map_err(|source| TypesError::InvalidPayload {
        kind: kind.to_string(),
        source,
    })
}

/// Frames the client sends on the persistent connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Heartbeat.
    Ping,
    /// Ask for a `questions_list` snapshot.
    GetQuestions,
    /// Ask for a `refresh_data` snapshot.
    Refresh,
}

impl OutboundMessage {
    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, TypesError> {
        serde_json::to_string(self).map_err(TypesError::Serialization)
    }
}
