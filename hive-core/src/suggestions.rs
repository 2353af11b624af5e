//! AI suggestion bookkeeping.
//!
//! At most one request per question is outstanding. Starting a new request
//! for a question supersedes the pending one: when the older request
//! finishes its result is handed back to its caller but not stored.
//! A failed request leaves any previously stored suggestion in place.
//! Suggestions never touch the question records themselves.

use std::collections::HashMap;

use askhive_types::QuestionId;

/// Handle for one in-flight suggestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket {
    question: QuestionId,
    generation: u64,
}

impl SuggestionTicket {
    /// The question this request is for.
    pub fn question(&self) -> QuestionId {
        self.question
    }
}

/// Result of completing a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome<E> {
    /// The suggestion was stored.
    Stored(String),
    /// The request failed; the stored suggestion is untouched.
    Failed(E),
    /// A newer request for the same question was started; nothing stored.
    Superseded(Result<String, E>),
}

/// Latest suggestion per question plus the currently pending request.
#[derive(Debug, Default)]
pub struct SuggestionBook {
    next_generation: u64,
    pending: HashMap<QuestionId, u64>,
    stored: HashMap<QuestionId, String>,
}

impl SuggestionBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding any pending one for the same question.
    pub fn begin(&mut self, question: QuestionId) -> SuggestionTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.pending.insert(question, generation);
        SuggestionTicket {
            question,
            generation,
        }
    }

    /// Record the result of a request.
    pub fn complete<E>(
        &mut self,
        ticket: SuggestionTicket,
        result: Result<String, E>,
    ) -> SuggestionOutcome<E> {
        if self.pending.get(&ticket.question) != Some(&ticket.generation) {
            return SuggestionOutcome::Superseded(result);
        }
        self.pending.remove(&ticket.question);
        match result {
            Ok(text) => {
                self.stored.insert(ticket.question, text.clone());
                SuggestionOutcome::Stored(text)
            }
            Err(err) => SuggestionOutcome::Failed(err),
        }
    }

    /// Latest stored suggestion for a question.
    pub fn get(&self, question: QuestionId) -> Option<&str> {
        self.stored.get(&question).map(String::as_str)
    }

    /// Whether a request for this question is outstanding.
    pub fn is_pending(&self, question: QuestionId) -> bool {
        self.pending.contains_key(&question)
    }
}
