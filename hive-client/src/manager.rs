//! Connection manager: executes the connection state machine.
//!
//! The pure [`Connection`] machine from `askhive-core` decides what should
//! happen; this module does it. Every event and every inbound frame is
//! handled under one lock, so the machine, the timers and the store always
//! agree about whether the connection is alive.
//!
//! # Architecture
//!
//! ```text
//! owner ──connect()/disconnect()──┐
//! session task ──opened/closed────┼──► Connection::on_event ──► actions
//! heartbeat / reconnect timers ───┘                               │
//!                                          transport, timers, log ◄┘
//! session task ──frames──► Dispatcher ──► QuestionStore
//! ```
//!
//! After [`ConnectionManager::disconnect`] returns, no timer is pending, the
//! frame reader is gone, and the store is never written by this manager
//! again.

use std::collections::VecDeque;
use std::sync::{Arc, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use askhive_core::{Action, Connection, ConnectionEvent, ConnectionStatus, Event, ReconnectPolicy};
use askhive_types::OutboundMessage;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::store::QuestionStore;
use crate::transport::{Transport, TransportError};

/// Live connection to the forum's push endpoint.
///
/// Generic over the transport so tests can drive it with
/// [`MockTransport`](crate::MockTransport).
pub struct ConnectionManager<T: Transport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: Transport> {
    transport: Arc<T>,
    endpoint: String,
    heartbeat_interval: Duration,
    dispatcher: Dispatcher,
    worker: Mutex<Worker>,
    /// Never held across an await, so `Drop` can always take it.
    tasks: std::sync::Mutex<Tasks>,
    status_tx: watch::Sender<ConnectionStatus>,
}

struct Worker {
    machine: Connection,
    last_pong: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Session,
    Heartbeat,
    Reconnect,
}

#[derive(Default)]
struct Tasks {
    session: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
    released: bool,
}

impl Tasks {
    fn slot(&mut self, slot: Slot) -> &mut Option<JoinHandle<()>> {
        match slot {
            Slot::Session => &mut self.session,
            Slot::Heartbeat => &mut self.heartbeat,
            Slot::Reconnect => &mut self.reconnect,
        }
    }

    fn cancel(&mut self, slot: Slot) {
        if let Some(handle) = self.slot(slot).take() {
            handle.abort();
        }
    }

    /// Replace the task in `slot`. Once released, new tasks are aborted
    /// on arrival.
    fn install(&mut self, slot: Slot, handle: JoinHandle<()>) {
        self.cancel(slot);
        if self.released {
            handle.abort();
        } else {
            *self.slot(slot) = Some(handle);
        }
    }

    fn release(&mut self) {
        self.released = true;
        for slot in [Slot::Session, Slot::Heartbeat, Slot::Reconnect] {
            self.cancel(slot);
        }
    }
}

impl<T: Transport> ConnectionManager<T> {
    /// Create a manager. Nothing happens until [`connect`](Self::connect).
    pub fn new(
        transport: T,
        endpoint: impl Into<String>,
        store: QuestionStore,
        heartbeat_interval: Duration,
        policy: ReconnectPolicy,
    ) -> Self {
        let machine = Connection::new(policy);
        let (status_tx, _) = watch::channel(machine.status());
        Self {
            inner: Arc::new(Inner {
                transport: Arc::new(transport),
                endpoint: endpoint.into(),
                heartbeat_interval,
                dispatcher: Dispatcher::new(store),
                worker: Mutex::new(Worker {
                    machine,
                    last_pong: None,
                }),
                tasks: std::sync::Mutex::new(Tasks::default()),
                status_tx,
            }),
        }
    }

    /// Start connecting. Returns once the attempt is under way.
    ///
    /// A no-op while a connection is open or being opened, after
    /// reconnect attempts are exhausted, and after teardown.
    pub async fn connect(&self) {
        self.inner.handle(Event::ConnectRequested).await;
    }

    /// Tear the connection down for good.
    ///
    /// Cancels both timers, detaches the frame reader and closes the
    /// transport. Safe to call more than once.
    pub async fn disconnect(&self) {
        self.inner.handle(Event::DisconnectRequested).await;
    }

    /// Send a message on the open connection.
    pub async fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        let worker = self.inner.worker.lock().await;
        if !worker.machine.can_send() {
            return Err(TransportError::NotConnected);
        }
        let frame = message
            .to_json()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.inner.transport.send(&frame).await
    }

    /// Whether the connection is open.
    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status_tx.borrow()
    }

    /// Receiver that sees every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// When the last pong arrived. Informational; a missing pong does not
    /// close the connection.
    pub async fn last_pong(&self) -> Option<Instant> {
        self.inner.worker.lock().await.last_pong
    }

    /// The store inbound frames are applied to.
    pub fn store(&self) -> &QuestionStore {
        self.inner.dispatcher.store()
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }
}

impl<T: Transport> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        // Tasks hold weak references between steps. A task in the middle of
        // a step stops at its next await; anything it spawns is aborted on
        // install.
        self.inner.tasks().release();
    }
}

impl<T: Transport> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &redact_query(&self.inner.endpoint))
            .field("status", &self.status())
            .finish()
    }
}

impl<T: Transport> Inner<T> {
    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn handle(self: &Arc<Self>, event: Event) {
        let mut worker = self.worker.lock().await;
        self.step(&mut worker, event).await;
    }

    /// Feed one event (and any follow-ups its actions produce) through the
    /// machine. Caller holds the worker lock.
    async fn step(self: &Arc<Self>, worker: &mut Worker, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let (next, actions) = worker.machine.clone().on_event(event);
            worker.machine = next;
            for action in actions {
                if let Some(follow_up) = self.execute(action).await {
                    queue.push_back(follow_up);
                }
            }
        }
        self.status_tx.send_replace(worker.machine.status());
    }

    async fn execute(self: &Arc<Self>, action: Action) -> Option<Event> {
        match action {
            Action::OpenTransport => {
                let session = self.spawn_session();
                self.tasks().install(Slot::Session, session);
            }
            Action::CloseTransport => {
                self.tasks().cancel(Slot::Session);
                if let Err(e) = self.transport.close().await {
                    debug!(error = %e, "transport close failed");
                }
                return Some(Event::TransportClosed {
                    reason: "closed by owner".to_string(),
                });
            }
            Action::StartHeartbeat => {
                let heartbeat = self.spawn_heartbeat();
                self.tasks().install(Slot::Heartbeat, heartbeat);
            }
            Action::StopHeartbeat => self.tasks().cancel(Slot::Heartbeat),
            Action::SendPing => match OutboundMessage::Ping.to_json() {
                Ok(frame) => {
                    if let Err(e) = self.transport.send(&frame).await {
                        // The reader notices a dead socket and drives reconnect.
                        warn!(error = %e, "heartbeat ping failed");
                    }
                }
                Err(e) => error!(error = %e, "could not encode ping"),
            },
            Action::ScheduleReconnect { delay, attempt } => {
                info!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
                let reconnect = self.spawn_reconnect(delay);
                self.tasks().install(Slot::Reconnect, reconnect);
            }
            Action::CancelReconnect => self.tasks().cancel(Slot::Reconnect),
            Action::Emit(event) => log_event(&event),
        }
        None
    }

    fn spawn_session(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let transport = Arc::clone(&self.transport);
        tokio::spawn(Self::run_session(weak, transport))
    }

    /// Open the transport and pump frames. The manager is only upgraded
    /// for each step, never while waiting on the socket.
    async fn run_session(weak: Weak<Self>, transport: Arc<T>) {
        if transport.is_connected() {
            if let Err(e) = transport.close().await {
                debug!(error = %e, "closing previous transport failed");
            }
        }

        let Some(endpoint) = weak.upgrade().map(|inner| inner.endpoint.clone()) else {
            return;
        };
        let opened = transport.connect(&endpoint).await;
        let event = match &opened {
            Ok(()) => Event::TransportOpened,
            Err(e) => Event::TransportClosed {
                reason: e.to_string(),
            },
        };
        let Some(inner) = weak.upgrade() else {
            let _ = transport.close().await;
            return;
        };
        inner.handle(event).await;
        drop(inner);
        if opened.is_err() {
            return;
        }

        loop {
            let received = transport.recv().await;
            let Some(inner) = weak.upgrade() else {
                debug!("manager dropped, closing transport");
                let _ = transport.close().await;
                return;
            };
            match received {
                Ok(frame) => inner.on_frame(&frame).await,
                Err(e) => {
                    inner
                        .handle(Event::TransportClosed {
                            reason: e.to_string(),
                        })
                        .await;
                    return;
                }
            }
        }
    }

    async fn on_frame(&self, frame: &str) {
        let mut worker = self.worker.lock().await;
        if !worker.machine.accepts_frames() {
            debug!("discarding frame received outside an open connection");
            return;
        }
        if self.dispatcher.dispatch(frame) == DispatchOutcome::Pong {
            worker.last_pong = Some(Instant::now());
        }
    }

    fn spawn_heartbeat(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.heartbeat_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.handle(Event::HeartbeatTick).await;
            }
        })
    }

    fn spawn_reconnect(self: &Arc<Self>, delay: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.handle(Event::ReconnectTimerFired).await;
            }
        })
    }
}

fn log_event(event: &ConnectionEvent) {
    match event {
        ConnectionEvent::Connecting { attempt } => debug!(attempt, "connecting"),
        ConnectionEvent::Connected => info!("connected"),
        ConnectionEvent::Disconnected { reason } => warn!(%reason, "disconnected"),
        ConnectionEvent::PersistentFailure { attempts } => {
            error!(attempts, "giving up on reconnecting")
        }
        ConnectionEvent::TornDown => info!("connection torn down"),
    }
}

/// Strip the query string, which carries the auth token.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use askhive_core::Phase;
    use askhive_types::{QuestionId, QuestionStatus};

    const ENDPOINT: &str = "ws://forum.test/ws?token=secret";
    const HEARTBEAT: Duration = Duration::from_secs(30);

    fn manager_with(
        transport: &MockTransport,
        policy: ReconnectPolicy,
    ) -> ConnectionManager<MockTransport> {
        ConnectionManager::new(
            transport.clone(),
            ENDPOINT,
            QuestionStore::new(),
            HEARTBEAT,
            policy,
        )
    }

    fn manager(transport: &MockTransport) -> ConnectionManager<MockTransport> {
        manager_with(transport, ReconnectPolicy::default())
    }

    async fn wait_for(
        manager: &ConnectionManager<MockTransport>,
        done: impl Fn(&ConnectionStatus) -> bool,
    ) -> ConnectionStatus {
        let mut rx = manager.watch_status();
        let status = *rx.wait_for(|s| done(s)).await.unwrap();
        status
    }

    /// Let spawned tasks drain without moving the paused clock far.
    async fn settle() {
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn snapshot_frame(ids: &[u64]) -> String {
        let items: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"id":{id},"message":"q{id}","status":"pending","created_at":"2025-03-01T12:00:00Z"}}"#
                )
            })
            .collect();
        format!(r#"{{"type":"initial_data","data":[{}]}}"#, items.join(","))
    }

    fn pings(transport: &MockTransport) -> usize {
        transport
            .sent_messages()
            .iter()
            .filter(|m| m.as_str() == r#"{"type":"ping"}"#)
            .count()
    }

    // ===========================================
    // Connect and Frames
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn connect_opens_the_transport() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        assert!(!manager.is_connected());

        manager.connect().await;
        let status = wait_for(&manager, |s| s.phase == Phase::Open).await;

        assert_eq!(status.attempt, 0);
        assert!(manager.is_connected());
        assert_eq!(transport.connected_url().as_deref(), Some(ENDPOINT));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_while_open_is_a_no_op() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        manager.connect().await;
        settle().await;
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn frames_reach_the_store() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        transport.push_frame(snapshot_frame(&[1, 2]));
        transport.push_frame(
            r#"{"type":"question_status_changed","data":{"id":2,"message":"q2","status":"escalated","created_at":"2025-03-01T12:00:00Z"}}"#,
        );
        settle().await;

        let snapshot = manager.store().snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.get(QuestionId::new(2)).unwrap().status,
            QuestionStatus::Escalated
        );
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frame_keeps_the_connection() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        transport.push_frame("{not json");
        transport.push_frame(snapshot_frame(&[4]));
        settle().await;

        assert!(manager.is_connected());
        assert_eq!(manager.store().len(), 1);
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn send_requires_an_open_connection() {
        let transport = MockTransport::new();
        let manager = manager(&transport);

        let result = manager.send(OutboundMessage::Refresh).await;
        assert!(matches!(result, Err(TransportError::NotConnected)));

        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;
        manager.send(OutboundMessage::Refresh).await.unwrap();
        assert_eq!(
            transport.last_sent().as_deref(),
            Some(r#"{"type":"refresh"}"#)
        );
    }

    // ===========================================
    // Heartbeat
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn heartbeat_pings_every_interval() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(pings(&transport), 0);

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(pings(&transport), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pong_is_recorded() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;
        assert!(manager.last_pong().await.is_none());

        transport.push_frame(r#"{"type":"pong"}"#);
        settle().await;

        assert!(manager.last_pong().await.is_some());
        assert!(manager.store().is_empty());
    }

    // ===========================================
    // Reconnect
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn remote_close_reconnects_after_backoff() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        transport.close_remote();
        let status = wait_for(&manager, |s| s.phase == Phase::Disconnected).await;
        assert_eq!(status.attempt, 1);
        assert_eq!(transport.connect_count(), 1);

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(transport.connect_count(), 1);

        let status = wait_for(&manager, |s| s.phase == Phase::Open).await;
        assert_eq!(status.attempt, 0);
        assert_eq!(transport.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_stops_while_disconnected() {
        let transport = MockTransport::new();
        let manager = manager_with(
            &transport,
            ReconnectPolicy::new(
                Duration::from_secs(120),
                2,
                Duration::from_secs(120),
                3,
            ),
        );
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        transport.close_remote();
        wait_for(&manager, |s| s.attempt == 1).await;
        tokio::time::sleep(Duration::from_secs(100)).await;

        assert_eq!(pings(&transport), 0);
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_are_a_persistent_failure() {
        let transport = MockTransport::new();
        transport.refuse_connections("server down");
        let manager = manager_with(
            &transport,
            ReconnectPolicy::new(Duration::from_secs(1), 2, Duration::from_secs(30), 2),
        );

        manager.connect().await;
        let status = wait_for(&manager, |s| s.persistent_failure).await;

        assert_eq!(status.phase, Phase::Disconnected);
        assert_eq!(transport.connect_count(), 3);

        // Not even an explicit connect gets past a persistent failure.
        transport.reset();
        manager.connect().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.connect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_policy_never_retries() {
        let transport = MockTransport::new();
        transport.fail_next_connect("refused");
        let manager = manager_with(&transport, ReconnectPolicy::disabled());

        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Disconnected).await;
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(transport.connect_count(), 1);
        assert!(!manager.status().persistent_failure);

        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;
    }

    // ===========================================
    // Teardown
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn disconnect_closes_the_transport() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        manager.disconnect().await;

        let status = manager.status();
        assert!(status.torn_down);
        assert_eq!(status.phase, Phase::Disconnected);
        assert!(!transport.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_after_teardown() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        // Reconnect timer pending and heartbeat stopped.
        transport.close_remote();
        wait_for(&manager, |s| s.attempt == 1).await;

        manager.disconnect().await;
        let sent_before = transport.sent_messages().len();

        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(transport.connect_count(), 1);
        assert_eq!(transport.sent_messages().len(), sent_before);
        assert!(manager.status().torn_down);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_armed_before_teardown_never_fires() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        manager.disconnect().await;
        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;

        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn store_is_frozen_after_teardown() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;
        transport.push_frame(snapshot_frame(&[1]));
        settle().await;

        manager.disconnect().await;
        // A late frame on a connection the test reopens behind our back.
        transport.connect("ws://elsewhere").await.unwrap();
        transport.push_frame(snapshot_frame(&[1, 2, 3]));
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(manager.store().len(), 1);
        assert_eq!(pings(&transport), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_is_permanent_and_idempotent() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        manager.disconnect().await;
        manager.disconnect().await;
        manager.connect().await;
        settle().await;

        assert_eq!(transport.connect_count(), 1);
        assert!(!manager.is_connected());
        assert!(matches!(
            manager.send(OutboundMessage::Ping).await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_before_connect_is_harmless() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        manager.disconnect().await;
        assert!(manager.status().torn_down);
        assert_eq!(transport.connect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_busy_manager_stops_its_tasks() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        let store = manager.store().clone();
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        // Dropped while a step holds the worker lock; the shared state
        // itself stays alive until the end of the test.
        let inner = Arc::clone(&manager.inner);
        let busy = inner.worker.lock().await;
        drop(manager);
        drop(busy);

        transport.push_frame(snapshot_frame(&[1, 2]));
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert!(store.is_empty());
        assert_eq!(pings(&transport), 0);
        assert_eq!(transport.connect_count(), 1);
        drop(inner);
    }

    #[tokio::test(start_paused = true)]
    async fn session_closes_the_transport_once_the_manager_is_gone() {
        let transport = MockTransport::new();
        let manager = manager(&transport);
        let store = manager.store().clone();
        manager.connect().await;
        wait_for(&manager, |s| s.phase == Phase::Open).await;

        // Only the session's own handle is left running.
        manager.inner.tasks().session.take();
        drop(manager);

        transport.push_frame(snapshot_frame(&[1]));
        settle().await;

        assert!(store.is_empty());
        assert!(!transport.is_connected());
    }

    #[test]
    fn debug_output_hides_the_token() {
        let manager = manager(&MockTransport::new());
        let rendered = format!("{manager:?}");
        assert!(rendered.contains("ws://forum.test/ws"));
        assert!(!rendered.contains("secret"));
    }
}
