//! Forum domain records as the server reports them.
//!
//! The server is authoritative for every field. The client replaces whole
//! records on update instead of patching individual fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AnswerId, QuestionId, UserId};

/// Lifecycle status of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    /// Waiting for an answer.
    Pending,
    /// Flagged for attention by an admin.
    Escalated,
    /// Marked as answered. Terminal.
    Answered,
}

impl QuestionStatus {
    /// Wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Escalated => "escalated",
            Self::Answered => "answered",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reply attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Server-assigned id.
    pub id: AnswerId,
    /// Author, absent for anonymous or system answers.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Body text.
    pub message: String,
    /// When the answer was posted.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Answer {
    /// Create an answer without an author.
    pub fn new(id: AnswerId, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: None,
            message: message.into(),
            created_at,
        }
    }
}

/// A question together with its answers in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Server-assigned id, unique within the store.
    pub id: QuestionId,
    /// Author, absent for guest questions.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Body text.
    pub message: String,
    /// Current lifecycle status.
    pub status: QuestionStatus,
    /// When the question was asked.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Answers, oldest first.
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl Question {
    /// Create a question without author or answers.
    pub fn new(
        id: QuestionId,
        message: impl Into<String>,
        status: QuestionStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: None,
            message: message.into(),
            status,
            created_at,
            answers: Vec::new(),
        }
    }

    /// Append an answer, returning the updated record.
    pub fn with_answer(mut self, answer: Answer) -> Self {
        self.answers.push(answer);
        self
    }
}

/// A user account as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned id.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact address, not always disclosed.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the account may escalate and mark questions answered.
    #[serde(default)]
    pub is_admin: bool,
}

/// Response body of `register` and `login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer credential for subsequent requests.
    pub access_token: String,
    /// Usually `"bearer"`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// The signed-in account.
    pub user: User,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("user", &self.user)
            .finish()
    }
}

/// RFC 3339 timestamps, also accepting naive ISO-8601 values as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Ok(dt.with_timezone(&Utc)),
            Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc()),
        }
    }
}
