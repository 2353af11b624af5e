//! # askhive-client
//!
//! Client library for the askhive Q&A forum.
//!
//! Keeps a local copy of the forum's questions current, either over a
//! persistent WebSocket connection or by polling, and performs mutations
//! over the REST API.
//!
//! ## Features
//!
//! - **Live feed**: heartbeat, exponential-backoff reconnect, clean teardown
//! - **Transport abstraction**: pluggable transport layer (WebSocket, mock)
//! - **Pure state machine**: uses askhive-core for side-effect-free logic
//! - **Snapshots**: readers get immutable views; one writer per store
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use askhive_client::{ClientConfig, ForumService, MemoryTokenStore, WsTransport};
//!
//! let config = ClientConfig::load(None)?;
//! let service: ForumService<WsTransport> =
//!     ForumService::new(config, Arc::new(MemoryTokenStore::new()))?;
//!
//! service.sign_in("ana", "hunter2").await?;
//! service.start_live(WsTransport::new()).await?;
//!
//! for question in service.snapshot().prioritized() {
//!     println!("[{}] {}", question.status, question.message);
//! }
//!
//! service.shutdown().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod manager;
pub mod service;
pub mod store;
pub mod transport;

pub use api::{ApiClient, ApiError};
pub use config::{ClientConfig, ConfigError, API_URL_ENV, WS_URL_ENV};
pub use credentials::{
    CredentialError, FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY,
};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::ClientError;
pub use feed::{EventFeed, PollingFeed, QuestionSource};
pub use manager::ConnectionManager;
pub use service::ForumService;
pub use store::QuestionStore;
pub use transport::{MockTransport, Transport, TransportError, WsTransport};

pub use askhive_core::{ConnectionStatus, Phase, ReconnectPolicy, Snapshot, SubscriptionId};
