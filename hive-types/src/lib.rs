//! # askhive-types
//!
//! Wire format and domain types for the askhive Q&A client.
//!
//! This crate provides the foundational types used across all askhive crates:
//! - [`QuestionId`], [`AnswerId`], [`UserId`] - Server-assigned identities
//! - [`Question`], [`Answer`], [`QuestionStatus`], [`User`] - The forum domain
//! - [`ServerEvent`] - Typed inbound push events (with an explicit `Unknown` variant)
//! - [`OutboundMessage`] - Frames the client sends on the persistent connection
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod domain;
mod error;
mod ids;
mod messages;

pub use domain::{Answer, AuthResponse, Question, QuestionStatus, User};
pub use error::TypesError;
pub use ids::{AnswerId, QuestionId, UserId};
pub use messages::{InboundFrame, OutboundMessage, ServerEvent};
