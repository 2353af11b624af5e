//! Explicit observer registry.
//!
//! Callbacks are keyed by the handle returned from [`Observers::subscribe`]
//! and notified in subscription order. Removing a handle removes exactly that
//! callback.

use std::collections::BTreeMap;
use std::fmt;

/// Handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Registry of callbacks interested in values of type `T`.
pub struct Observers<T> {
    next_id: u64,
    callbacks: BTreeMap<SubscriptionId, Callback<T>>,
}

impl<T> Observers<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            callbacks: BTreeMap::new(),
        }
    }

    /// Register a callback.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.callbacks.insert(id, Box::new(callback));
        id
    }

    /// Remove a callback. Returns false if the handle was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.callbacks.remove(&id).is_some()
    }

    /// Call every registered callback with `value`.
    pub fn notify(&self, value: &T) {
        for callback in self.callbacks.values() {
            callback(value);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscriptions", &self.callbacks.len())
            .finish()
    }
}
