//! WebSocket transport over `tokio-tungstenite`.

use super::{Transport, TransportError};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client transport.
///
/// Reading and writing use separate halves so a pending `recv()` does not
/// block heartbeat pings.
#[derive(Default)]
pub struct WsTransport {
    sink: Mutex<Option<SplitSink<WsStream, Message>>>,
    stream: Mutex<Option<SplitStream<WsStream>>>,
    connected: AtomicBool,
}

impl WsTransport {
    /// Create a disconnected transport.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> Result<(), TransportError> {
        let (ws, response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        debug!(status = %response.status(), "websocket handshake complete");

        let (sink, stream) = ws.split();
        *self.sink.lock().await = Some(sink);
        *self.stream.lock().await = Some(stream);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        let sink = sink.as_mut().ok_or(TransportError::NotConnected)?;
        sink.send(Message::text(frame))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn recv(&self) -> Result<String, TransportError> {
        let mut stream = self.stream.lock().await;
        let stream = stream.as_mut().ok_or(TransportError::NotConnected)?;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server sent close frame");
                    self.connected.store(false, Ordering::SeqCst);
                    return Err(TransportError::ConnectionClosed);
                }
                // Control and binary frames carry nothing for the feed.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.connected.store(false, Ordering::SeqCst);
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                None => {
                    self.connected.store(false, Ordering::SeqCst);
                    return Err(TransportError::ConnectionClosed);
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                debug!(error = %e, "websocket close handshake failed");
            }
        }
        self.stream.lock().await.take();
        Ok(())
    }
}
