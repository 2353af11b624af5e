//! Question store reconciliation.
//!
//! The [`Reconciler`] is the only writer of the question set. It folds typed
//! [`ServerEvent`]s into the store with one merge rule per event type:
//!
//! | event | effect |
//! |---|---|
//! | `initial_data`, `questions_list`, `refresh_data` | replace everything |
//! | `new_question` | insert at the front unless the id exists |
//! | `answer_added`, `question_status_changed` | replace the record with the same id |
//! | `pong` | nothing |
//! | unknown tag with a list payload | replace everything |
//!
//! Readers get a [`Snapshot`], an immutable handle that later writes never
//! touch. Writes go through `Arc::make_mut`, so a snapshot still held by a
//! reader forces a copy instead of being mutated.

use std::collections::HashSet;
use std::sync::Arc;

use askhive_types::{Question, QuestionId, QuestionStatus, ServerEvent};
use serde_json::Value;
use thiserror::Error;

use crate::status::{self, TransitionError};

/// Errors from reconciliation and local transitions.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A local status change the rules forbid. The store is unchanged.
    #[error("question {id}: {source}")]
    InvalidTransition {
        /// The question.
        id: QuestionId,
        /// The rejected step.
        #[source]
        source: TransitionError,
    },

    /// A local change referenced a question not in the store.
    #[error("unknown question {0}")]
    UnknownQuestion(QuestionId),

    /// An unknown-tag list payload could not be read as questions.
    #[error("unreadable {kind} snapshot: {source}")]
    UnreadableSnapshot {
        /// The unrecognised tag.
        kind: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// What applying one event did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The whole set was replaced.
    Replaced {
        /// Questions now in the store.
        count: usize,
    },
    /// A new question was inserted at the front.
    Inserted(QuestionId),
    /// `new_question` for an id already present; nothing changed.
    Duplicate(QuestionId),
    /// An existing record was replaced.
    Updated(QuestionId),
    /// An update for an id not in the store; nothing changed.
    NotFound(QuestionId),
    /// Event with no store effect.
    Unchanged,
}

impl ApplyOutcome {
    /// Whether the store contents changed.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            Self::Replaced { .. } | Self::Inserted(_) | Self::Updated(_)
        )
    }
}

/// Immutable read-only view of the question set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    questions: Arc<Vec<Question>>,
}

impl Snapshot {
    /// Questions in store order (newest inserts first).
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by id.
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Questions in display priority order.
    ///
    /// Escalated before Pending before Answered; within a status, most
    /// recent first. Computed on every call, store order is untouched.
    pub fn prioritized(&self) -> Vec<&Question> {
        let mut ordered: Vec<&Question> = self.questions.iter().collect();
        ordered.sort_by(|a, b| {
            status::priority_rank(b.status)
                .cmp(&status::priority_rank(a.status))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        ordered
    }
}

/// Single writer of the question store.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    questions: Arc<Vec<Question>>,
}

impl Reconciler {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one server event.
    ///
    /// Only an unknown-tag list payload that is not a question list fails;
    /// every other event has a defined effect, possibly none.
    pub fn apply(&mut self, event: ServerEvent) -> Result<ApplyOutcome, ReconcileError> {
        let outcome = match event {
            ServerEvent::InitialData(questions)
            | ServerEvent::QuestionsList(questions)
            | ServerEvent::RefreshData(questions) => self.replace_all(questions),
            ServerEvent::NewQuestion(question) => self.insert(question),
            ServerEvent::AnswerAdded(question) | ServerEvent::QuestionStatusChanged(question) => {
                self.replace_record(question)
            }
            ServerEvent::Pong => ApplyOutcome::Unchanged,
            ServerEvent::Unknown {
                kind,
                data: Some(Value::Array(items)),
            } => {
                let questions: Vec<Question> = serde_json::from_value(Value::Array(items))
                    .map_err(|source| ReconcileError::UnreadableSnapshot { kind, source })?;
                self.replace_all(questions)
            }
            ServerEvent::Unknown { .. } => ApplyOutcome::Unchanged,
        };
        Ok(outcome)
    }

    /// Replace the whole set. Later duplicates of an id are dropped.
    pub fn replace_all(&mut self, questions: Vec<Question>) -> ApplyOutcome {
        let mut seen = HashSet::with_capacity(questions.len());
        let unique: Vec<Question> = questions
            .into_iter()
            .filter(|q| seen.insert(q.id))
            .collect();
        let count = unique.len();
        self.questions = Arc::new(unique);
        ApplyOutcome::Replaced { count }
    }

    /// Insert at the front unless the id is already present.
    pub fn insert(&mut self, question: Question) -> ApplyOutcome {
        let id = question.id;
        if self.contains(id) {
            return ApplyOutcome::Duplicate(id);
        }
        Arc::make_mut(&mut self.questions).insert(0, question);
        ApplyOutcome::Inserted(id)
    }

    /// Replace the record with the same id; no-op if absent.
    pub fn replace_record(&mut self, question: Question) -> ApplyOutcome {
        let id = question.id;
        let Some(index) = self.position(id) else {
            return ApplyOutcome::NotFound(id);
        };
        Arc::make_mut(&mut self.questions)[index] = question;
        ApplyOutcome::Updated(id)
    }

    /// Apply a client-originated status change, enforcing the status rules.
    pub fn transition(
        &mut self,
        id: QuestionId,
        to: QuestionStatus,
    ) -> Result<QuestionStatus, ReconcileError> {
        let index = self
            .position(id)
            .ok_or(ReconcileError::UnknownQuestion(id))?;
        let from = self.questions[index].status;
        let next = status::transition(from, to)
            .map_err(|source| ReconcileError::InvalidTransition { id, source })?;
        Arc::make_mut(&mut self.questions)[index].status = next;
        Ok(next)
    }

    /// Whether a question with this id is present.
    pub fn contains(&self, id: QuestionId) -> bool {
        self.position(id).is_some()
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Immutable view of the current contents.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            questions: Arc::clone(&self.questions),
        }
    }

    fn position(&self, id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }
}
