//! Error types for askhive wire handling.

use thiserror::Error;

/// Errors raised while decoding or encoding frames.
#[derive(Debug, Error)]
pub enum TypesError {
    /// The frame is not a JSON envelope with a `type` tag.
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A known tag carried a payload of the wrong shape.
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        /// The event tag.
        kind: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A known tag that requires a payload arrived without one.
    #[error("{0} frame without data")]
    MissingPayload(String),

    /// Outbound serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}
