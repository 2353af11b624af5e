//! Connection state machine for askhive.
//!
//! This module provides a pure, side-effect-free state machine for managing
//! the lifecycle of the persistent connection. The state machine takes events
//! as input and produces a new state plus a list of actions to execute.
//!
//! The actual I/O (opening sockets, running timers, sending pings) is
//! performed by askhive-client, not by this module. This enables instant unit
//! testing without network mocks.
//!
//! Teardown is one-way: once [`Event::DisconnectRequested`] has been applied
//! the machine ignores every later event, so a late timer or transport
//! callback can never reopen a connection its owner has released.

use std::time::Duration;

use crate::ReconnectPolicy;

/// Lifecycle phase of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No transport. Initial state, and the state after any failure.
    Disconnected,
    /// Transport is being opened.
    Connecting,
    /// Transport is open; heartbeat running.
    Open,
    /// Teardown in progress.
    Closing,
}

/// Point-in-time view of the connection, for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Current phase.
    pub phase: Phase,
    /// Reconnect attempts since the last successful open.
    pub attempt: u32,
    /// Reconnect attempts are exhausted; no further retries will happen.
    pub persistent_failure: bool,
    /// The owner tore the connection down.
    pub torn_down: bool,
}

impl ConnectionStatus {
    /// Whether the connection is usable for sending.
    pub fn is_connected(&self) -> bool {
        self.phase == Phase::Open && !self.torn_down
    }
}

/// Connection state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    phase: Phase,
    attempt: u32,
    persistent_failure: bool,
    torn_down: bool,
    policy: ReconnectPolicy,
}

impl Connection {
    /// Create a new state machine in the Disconnected phase.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            phase: Phase::Disconnected,
            attempt: 0,
            persistent_failure: false,
            torn_down: false,
            policy,
        }
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (askhive-client)
    /// is responsible for executing the returned actions in order.
    pub fn on_event(mut self, event: Event) -> (Self, Vec<Action>) {
        match (self.phase, event) {
            // Teardown completion
            (Phase::Closing, Event::TransportClosed { .. }) => {
                self.phase = Phase::Disconnected;
                (self, vec![Action::Emit(ConnectionEvent::TornDown)])
            }

            // Teardown request, from any phase, once
            (_, Event::DisconnectRequested) if self.torn_down => (self, vec![]),
            (_, Event::DisconnectRequested) => {
                self.phase = Phase::Closing;
                self.torn_down = true;
                (
                    self,
                    vec![
                        Action::CancelReconnect,
                        Action::StopHeartbeat,
                        Action::CloseTransport,
                    ],
                )
            }

            // Nothing reaches a torn-down machine
            (_, _) if self.torn_down => (self, vec![]),

            // From Disconnected
            (Phase::Disconnected, Event::ConnectRequested) => {
                if self.persistent_failure {
                    return (self, vec![]);
                }
                self.phase = Phase::Connecting;
                let attempt = self.attempt;
                (
                    self,
                    vec![
                        Action::CancelReconnect,
                        Action::OpenTransport,
                        Action::Emit(ConnectionEvent::Connecting { attempt }),
                    ],
                )
            }
            (Phase::Disconnected, Event::ReconnectTimerFired) => {
                self.phase = Phase::Connecting;
                let attempt = self.attempt;
                (
                    self,
                    vec![
                        Action::OpenTransport,
                        Action::Emit(ConnectionEvent::Connecting { attempt }),
                    ],
                )
            }

            // From Connecting
            (Phase::Connecting, Event::TransportOpened) => {
                self.phase = Phase::Open;
                self.attempt = 0;
                self.persistent_failure = false;
                (
                    self,
                    vec![
                        Action::StartHeartbeat,
                        Action::Emit(ConnectionEvent::Connected),
                    ],
                )
            }

            // Transport loss while connecting or open
            (Phase::Connecting | Phase::Open, Event::TransportClosed { reason }) => {
                self.phase = Phase::Disconnected;
                let mut actions = vec![
                    Action::StopHeartbeat,
                    Action::Emit(ConnectionEvent::Disconnected { reason }),
                ];
                if self.policy.is_enabled() {
                    if self.attempt < self.policy.max_attempts() {
                        self.attempt += 1;
                        actions.push(Action::ScheduleReconnect {
                            delay: self.policy.delay_for(self.attempt),
                            attempt: self.attempt,
                        });
                    } else {
                        self.persistent_failure = true;
                        actions.push(Action::Emit(ConnectionEvent::PersistentFailure {
                            attempts: self.attempt,
                        }));
                    }
                }
                (self, actions)
            }

            // While open
            (Phase::Open, Event::HeartbeatTick) => (self, vec![Action::SendPing]),

            // Invalid transitions - stay in current state
            (_, _) => (self, vec![]),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reconnect attempts since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The reconnect policy in force.
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Check if currently open.
    pub fn is_open(&self) -> bool {
        self.phase == Phase::Open && !self.torn_down
    }

    /// Check if the owner has torn this connection down.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Check if reconnect attempts are exhausted.
    pub fn has_persistently_failed(&self) -> bool {
        self.persistent_failure
    }

    /// Whether outbound frames may be sent.
    pub fn can_send(&self) -> bool {
        self.is_open()
    }

    /// Whether inbound frames may still be applied to the store.
    pub fn accepts_frames(&self) -> bool {
        self.is_open()
    }

    /// Snapshot for observers.
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            phase: self.phase,
            attempt: self.attempt,
            persistent_failure: self.persistent_failure,
            torn_down: self.torn_down,
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

/// Events that can occur in the connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Owner asked to connect.
    ConnectRequested,
    /// Transport reported open.
    TransportOpened,
    /// Transport reported closed, cleanly or not.
    TransportClosed {
        /// Why the transport closed.
        reason: String,
    },
    /// Heartbeat interval elapsed.
    HeartbeatTick,
    /// Reconnect delay elapsed.
    ReconnectTimerFired,
    /// Owner tore the connection down.
    DisconnectRequested,
}

/// Actions to be executed by askhive-client.
///
/// These are instructions, not side effects. The client interprets these and
/// performs the actual I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Tear down any existing transport, then open a new one.
    OpenTransport,
    /// Detach the frame reader and close the transport.
    CloseTransport,
    /// Start the periodic heartbeat.
    StartHeartbeat,
    /// Stop the periodic heartbeat.
    StopHeartbeat,
    /// Send a ping frame.
    SendPing,
    /// Start the one-shot reconnect timer.
    ScheduleReconnect {
        /// Delay before the attempt.
        delay: Duration,
        /// 1-based attempt number.
        attempt: u32,
    },
    /// Cancel any pending reconnect timer.
    CancelReconnect,
    /// Report a lifecycle change to the owner.
    Emit(ConnectionEvent),
}

/// Lifecycle changes reported to the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt started.
    Connecting {
        /// Reconnect attempts so far.
        attempt: u32,
    },
    /// The transport opened.
    Connected,
    /// The transport closed.
    Disconnected {
        /// Why it closed.
        reason: String,
    },
    /// Reconnect attempts are exhausted.
    PersistentFailure {
        /// How many attempts were made.
        attempts: u32,
    },
    /// Teardown finished.
    TornDown,
}
