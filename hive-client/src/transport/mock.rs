//! Mock transport for testing.
//!
//! Frames pushed with [`MockTransport::push_frame`] are handed out by
//! `recv()` in order; [`MockTransport::close_remote`] simulates the server
//! dropping the connection. Sent frames are captured for assertions.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Mock transport for testing.
///
/// Clones share state, so a test can keep one handle while the connection
/// manager owns another.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
    arrivals: Arc<Notify>,
}

#[derive(Debug)]
enum Incoming {
    Frame(String),
    Close,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_url: Option<String>,
    connect_count: usize,
    sent_messages: Vec<String>,
    incoming: VecDeque<Incoming>,
    connect_failures: VecDeque<String>,
    refuse_connections: Option<String>,
    fail_next_send: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame for `recv()`.
    pub fn push_frame(&self, frame: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.incoming.push_back(Incoming::Frame(frame.into()));
        drop(inner);
        self.arrivals.notify_waiters();
    }

    /// Simulate the server closing the connection after any queued frames.
    pub fn close_remote(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.incoming.push_back(Incoming::Close);
        drop(inner);
        self.arrivals.notify_waiters();
    }

    /// Get all frames that were sent.
    pub fn sent_messages(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.clone()
    }

    /// Get the last frame that was sent.
    pub fn last_sent(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.last().cloned()
    }

    /// URL of the most recent successful connect.
    pub fn connected_url(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.connected_url.clone()
    }

    /// Number of connect attempts, failed ones included.
    pub fn connect_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.connect_count
    }

    /// Cause the next connect() to fail. Calls queue up.
    pub fn fail_next_connect(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.connect_failures.push_back(error.to_string());
    }

    /// Cause every connect() to fail until [`reset`](Self::reset).
    pub fn refuse_connections(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.refuse_connections = Some(error.to_string());
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Clear all state (messages, queue, connection, failures).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
        drop(inner);
        self.arrivals.notify_waiters();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, url: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connect_count += 1;

        if let Some(error) = inner.connect_failures.pop_front() {
            return Err(TransportError::ConnectionFailed(error));
        }
        if let Some(error) = inner.refuse_connections.clone() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        inner.connected_url = Some(url.to_string());
        Ok(())
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push(frame.to_string());
        Ok(())
    }

    async fn recv(&self) -> Result<String, TransportError> {
        loop {
            // Registered before the queue check so a push in between is not missed.
            let arrival = self.arrivals.notified();
            {
                let mut inner = self.inner.lock().unwrap();
                if !inner.connected {
                    return Err(TransportError::NotConnected);
                }
                match inner.incoming.pop_front() {
                    Some(Incoming::Frame(frame)) => return Ok(frame),
                    Some(Incoming::Close) => {
                        inner.connected = false;
                        return Err(TransportError::ConnectionClosed);
                    }
                    None => {}
                }
            }
            arrival.await;
        }
    }

    fn is_connected(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        drop(inner);
        self.arrivals.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // ===========================================
    // MockTransport Basic Tests
    // ===========================================

    #[tokio::test]
    async fn mock_transport_connects() {
        let transport = MockTransport::new();
        assert!(!transport.is_connected());

        transport.connect("ws://forum.test/ws").await.unwrap();

        assert!(transport.is_connected());
        assert_eq!(
            transport.connected_url(),
            Some("ws://forum.test/ws".to_string())
        );
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test]
    async fn mock_transport_sends_frames() {
        let transport = MockTransport::new();
        transport.connect("ws://x").await.unwrap();

        transport.send(r#"{"type":"ping"}"#).await.unwrap();
        transport.send(r#"{"type":"refresh"}"#).await.unwrap();

        let sent = transport.sent_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], r#"{"type":"refresh"}"#);
    }

    #[tokio::test]
    async fn recv_returns_pushed_frames_in_order() {
        let transport = MockTransport::new();
        transport.connect("ws://x").await.unwrap();

        transport.push_frame("one");
        transport.push_frame("two");

        assert_eq!(transport.recv().await.unwrap(), "one");
        assert_eq!(transport.recv().await.unwrap(), "two");
    }

    #[tokio::test]
    async fn recv_waits_for_a_frame() {
        let transport = MockTransport::new();
        transport.connect("ws://x").await.unwrap();

        let reader = transport.clone();
        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!pending.is_finished());

        transport.push_frame("late");
        assert_eq!(pending.await.unwrap().unwrap(), "late");
    }

    #[tokio::test]
    async fn close_remote_ends_the_connection_after_queued_frames() {
        let transport = MockTransport::new();
        transport.connect("ws://x").await.unwrap();

        transport.push_frame("last words");
        transport.close_remote();

        assert_eq!(transport.recv().await.unwrap(), "last words");
        assert!(matches!(
            transport.recv().await,
            Err(TransportError::ConnectionClosed)
        ));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn local_close_wakes_a_waiting_reader() {
        let transport = MockTransport::new();
        transport.connect("ws://x").await.unwrap();

        let reader = transport.clone();
        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        transport.close().await.unwrap();
        assert!(matches!(
            pending.await.unwrap(),
            Err(TransportError::NotConnected)
        ));
    }

    // ===========================================
    // Error Condition Tests
    // ===========================================

    #[tokio::test]
    async fn send_without_connect_fails() {
        let transport = MockTransport::new();

        let result = transport.send("data").await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn recv_without_connect_fails() {
        let transport = MockTransport::new();

        let result = transport.recv().await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn queued_connect_failures_are_used_once_each() {
        let transport = MockTransport::new();
        transport.fail_next_connect("refused");
        transport.fail_next_connect("refused again");

        assert!(transport.connect("ws://x").await.is_err());
        assert!(transport.connect("ws://x").await.is_err());
        transport.connect("ws://x").await.unwrap();
        assert_eq!(transport.connect_count(), 3);
    }

    #[tokio::test]
    async fn refused_connections_persist_until_reset() {
        let transport = MockTransport::new();
        transport.refuse_connections("server down");

        for _ in 0..3 {
            assert!(matches!(
                transport.connect("ws://x").await,
                Err(TransportError::ConnectionFailed(_))
            ));
        }

        transport.reset();
        transport.connect("ws://x").await.unwrap();
    }

    #[tokio::test]
    async fn forced_send_failure() {
        let transport = MockTransport::new();
        transport.connect("ws://x").await.unwrap();
        transport.fail_next_send("buffer full");

        let result = transport.send("data").await;
        assert!(matches!(result, Err(TransportError::SendFailed(_))));

        transport.send("data").await.unwrap();
        assert_eq!(transport.last_sent(), Some("data".to_string()));
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn mock_transport_clone_shares_state() {
        let transport1 = MockTransport::new();
        let transport2 = transport1.clone();

        transport1.connect("ws://x").await.unwrap();
        assert!(transport2.is_connected());

        transport1.send("from t1").await.unwrap();
        transport2.send("from t2").await.unwrap();

        assert_eq!(transport1.sent_messages().len(), 2);
    }
}
