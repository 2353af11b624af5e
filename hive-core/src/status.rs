//! Question status rules.
//!
//! ```text
//! Pending ──► Escalated ──► Answered
//!    └──────────────────────►┘
//! ```
//!
//! Server-reported statuses are accepted verbatim by the reconciler; these
//! rules apply only to transitions the client originates itself.

use askhive_types::QuestionStatus;
use thiserror::Error;

/// A status change the rules forbid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// `to` is not reachable from `from`.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: QuestionStatus,
        /// Requested status.
        to: QuestionStatus,
    },
}

/// Whether `from → to` is an allowed forward step.
pub fn can_transition(from: QuestionStatus, to: QuestionStatus) -> bool {
    use QuestionStatus::*;
    matches!(
        (from, to),
        (Pending, Escalated) | (Pending, Answered) | (Escalated, Answered)
    )
}

/// Validate a transition, returning the new status.
pub fn transition(
    from: QuestionStatus,
    to: QuestionStatus,
) -> Result<QuestionStatus, TransitionError> {
    if can_transition(from, to) {
        Ok(to)
    } else {
        Err(TransitionError::InvalidTransition { from, to })
    }
}

/// Whether no transition leaves this status.
pub fn is_terminal(status: QuestionStatus) -> bool {
    status == QuestionStatus::Answered
}

/// Display priority: higher sorts first.
pub fn priority_rank(status: QuestionStatus) -> u8 {
    match status {
        QuestionStatus::Escalated => 3,
        QuestionStatus::Pending => 2,
        QuestionStatus::Answered => 1,
    }
}
