//! Inbound frame dispatch.
//!
//! Every text frame from the server passes through [`Dispatcher::dispatch`]:
//! parse, route by `type`, apply to the store. Nothing here can fail the
//! connection; a frame that cannot be handled is logged and dropped.

use askhive_core::ApplyOutcome;
use askhive_types::ServerEvent;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::store::QuestionStore;

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The frame reached the store.
    Applied(ApplyOutcome),
    /// Heartbeat reply.
    Pong,
    /// Unknown `type` without a list payload.
    Ignored {
        /// The unrecognized tag.
        kind: String,
    },
    /// Unparseable or unusable frame; logged and discarded.
    Dropped,
}

/// Routes parsed server events into a [`QuestionStore`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: QuestionStore,
}

impl Dispatcher {
    /// Dispatch into `store`.
    pub fn new(store: QuestionStore) -> Self {
        Self { store }
    }

    /// The store frames are applied to.
    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    /// Handle one raw frame.
    pub fn dispatch(&self, raw: &str) -> DispatchOutcome {
        let event = match ServerEvent::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "dropping unparseable frame");
                return DispatchOutcome::Dropped;
            }
        };

        match event {
            ServerEvent::Pong => {
                trace!("pong");
                DispatchOutcome::Pong
            }
            ServerEvent::Unknown { kind, data } if !matches!(data, Some(Value::Array(_))) => {
                debug!(%kind, "ignoring unknown message type");
                DispatchOutcome::Ignored { kind }
            }
            event => {
                let kind = event.kind().to_string();
                match self.store.apply(event) {
                    Ok(outcome) => {
                        debug!(%kind, ?outcome, "applied server event");
                        DispatchOutcome::Applied(outcome)
                    }
                    Err(e) => {
                        warn!(%kind, error = %e, "dropping server event");
                        DispatchOutcome::Dropped
                    }
                }
            }
        }
    }
}
