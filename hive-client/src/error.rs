//! Errors surfaced by [`ForumService`](crate::ForumService).

use askhive_core::ReconcileError;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::credentials::CredentialError;
use crate::transport::TransportError;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// REST request failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Token storage failed.
    #[error("credential error: {0}")]
    Credentials(#[from] CredentialError),

    /// Configuration is unusable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Persistent connection error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Local status change rejected; nothing was sent or stored.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// A live feed is already running.
    #[error("live feed already running")]
    AlreadyLive,
}

impl ClientError {
    /// Whether the server rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotAuthenticated))
            || matches!(self, Self::Api(e) if matches!(e.status(), Some(401 | 403)))
    }
}
