//! # askhive-core
//!
//! Pure logic for askhive (no I/O, instant tests).
//!
//! This crate implements the state machines and merge rules for the live
//! question feed without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (sockets, timers, HTTP) is performed by `askhive-client`,
//! which interprets the actions produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod observers;
pub mod reconciler;
pub mod state;
pub mod status;
pub mod suggestions;

pub use backoff::ReconnectPolicy;
pub use observers::{Observers, SubscriptionId};
pub use reconciler::{ApplyOutcome, ReconcileError, Reconciler, Snapshot};
pub use state::{Action, Connection, ConnectionEvent, ConnectionStatus, Event, Phase};
pub use status::{priority_rank, TransitionError};
pub use suggestions::{SuggestionBook, SuggestionOutcome, SuggestionTicket};
