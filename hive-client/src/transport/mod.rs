//! Transport abstraction for the live question feed.
//!
//! The connection manager drives a [`Transport`] and never touches sockets
//! directly. Production code uses [`WsTransport`]; tests use
//! [`MockTransport`], which lets them inject frames and remote closes.
//!
//! # Design
//!
//! The trait is async and connection-oriented:
//! - `connect()` opens a connection to a `ws://` / `wss://` URL
//! - `send()` transmits one text frame
//! - `recv()` waits for the next text frame
//! - `close()` terminates the connection; calling it twice is harmless

mod mock;
mod websocket;

pub use mock::MockTransport;
pub use websocket::WsTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed by the remote side.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// A text-frame channel to the forum server.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a connection to `url`.
    async fn connect(&self, url: &str) -> Result<(), TransportError>;

    /// Send one text frame.
    async fn send(&self, frame: &str) -> Result<(), TransportError>;

    /// Receive the next text frame.
    ///
    /// Waits until a frame arrives or the connection ends.
    async fn recv(&self) -> Result<String, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection.
    async fn close(&self) -> Result<(), TransportError>;
}
