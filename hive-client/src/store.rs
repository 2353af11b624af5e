//! Shared question store.
//!
//! Wraps the [`Reconciler`] behind a lock and tells observers about every
//! change. Observers receive the new [`Snapshot`] after the write lock is
//! released; a callback must not subscribe or unsubscribe on the same store.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use askhive_core::{
    ApplyOutcome, Observers, ReconcileError, Reconciler, Snapshot, SubscriptionId,
};
use askhive_types::{Question, QuestionId, QuestionStatus, ServerEvent};

/// Cloneable handle to one question set.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    reconciler: RwLock<Reconciler>,
    observers: Mutex<Observers<Snapshot>>,
}

impl QuestionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn snapshot(&self) -> Snapshot {
        self.inner
            .reconciler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Be told about every change.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.observers().subscribe(callback)
    }

    /// Stop being told. Returns false for an unknown handle.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers().unsubscribe(id)
    }

    pub(crate) fn apply(&self, event: ServerEvent) -> Result<ApplyOutcome, ReconcileError> {
        self.mutate(
            |reconciler| reconciler.apply(event),
            |result| matches!(result, Ok(outcome) if outcome.changed()),
        )
    }

    pub(crate) fn replace_all(&self, questions: Vec<Question>) -> ApplyOutcome {
        self.mutate(|r| r.replace_all(questions), ApplyOutcome::changed)
    }

    pub(crate) fn insert(&self, question: Question) -> ApplyOutcome {
        self.mutate(|r| r.insert(question), ApplyOutcome::changed)
    }

    pub(crate) fn replace_record(&self, question: Question) -> ApplyOutcome {
        self.mutate(|r| r.replace_record(question), ApplyOutcome::changed)
    }

    pub(crate) fn transition(
        &self,
        id: QuestionId,
        to: QuestionStatus,
    ) -> Result<QuestionStatus, ReconcileError> {
        self.mutate(|r| r.transition(id, to), Result::is_ok)
    }

    fn mutate<T>(
        &self,
        write: impl FnOnce(&mut Reconciler) -> T,
        changed: impl FnOnce(&T) -> bool,
    ) -> T {
        let mut reconciler = self
            .inner
            .reconciler
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let result = write(&mut reconciler);
        if !changed(&result) {
            return result;
        }
        let snapshot = reconciler.snapshot();
        drop(reconciler);
        self.observers().notify(&snapshot);
        result
    }

    fn observers(&self) -> std::sync::MutexGuard<'_, Observers<Snapshot>> {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
