//! Event feeds: anything that keeps a [`QuestionStore`] current.
//!
//! [`ConnectionManager`] receives pushes over a persistent connection.
//! [`PollingFeed`] simulates pushes for servers (or networks) without one by
//! fetching the question list on an interval and applying it as a
//! `questions_list` snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use askhive_types::{Question, ServerEvent};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::manager::ConnectionManager;
use crate::store::QuestionStore;
use crate::transport::Transport;

/// A source of store updates with an explicit lifecycle.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Begin delivering updates.
    async fn start(&self);

    /// Stop for good. Once this returns the feed never writes the store again.
    async fn stop(&self);

    /// Whether updates are currently arriving.
    fn is_live(&self) -> bool;

    /// The store this feed writes.
    fn store(&self) -> &QuestionStore;
}

#[async_trait]
impl<T: Transport> EventFeed for ConnectionManager<T> {
    async fn start(&self) {
        self.connect().await;
    }

    async fn stop(&self) {
        self.disconnect().await;
    }

    fn is_live(&self) -> bool {
        self.is_connected()
    }

    fn store(&self) -> &QuestionStore {
        ConnectionManager::store(self)
    }
}

/// Where a [`PollingFeed`] gets the question list.
#[async_trait]
pub trait QuestionSource: Send + Sync + 'static {
    /// Fetch every question.
    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError>;
}

#[async_trait]
impl QuestionSource for ApiClient {
    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError> {
        self.list_questions().await
    }
}

#[async_trait]
impl<S: QuestionSource + ?Sized> QuestionSource for Arc<S> {
    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError> {
        (**self).fetch_questions().await
    }
}

/// Feed that polls a [`QuestionSource`].
pub struct PollingFeed<S: QuestionSource> {
    inner: Arc<PollInner<S>>,
}

struct PollInner<S> {
    source: S,
    store: QuestionStore,
    interval: Duration,
    live: AtomicBool,
    stopped: AtomicBool,
    /// Held while a result is applied, and by `stop`.
    apply: Mutex<()>,
    /// Never held across an await, so `Drop` can always take it.
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<S: QuestionSource> PollingFeed<S> {
    /// Poll `source` every `interval`, writing into `store`.
    pub fn new(source: S, store: QuestionStore, interval: Duration) -> Self {
        Self {
            inner: Arc::new(PollInner {
                source,
                store,
                interval,
                live: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                apply: Mutex::new(()),
                task: std::sync::Mutex::new(None),
            }),
        }
    }

    /// Fetch once now, outside the schedule.
    pub async fn poll_now(&self) {
        self.inner.poll_once().await;
    }
}

impl<S> PollInner<S> {
    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn halt(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self.task().take() {
            task.abort();
        }
        self.live.store(false, Ordering::SeqCst);
    }
}

impl<S: QuestionSource> PollInner<S> {
    async fn poll_once(&self) {
        let fetched = self.source.fetch_questions().await;

        // Checked under the lock so a stop() racing the fetch wins.
        let _apply = self.apply.lock().await;
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        match fetched {
            Ok(questions) => {
                self.live.store(true, Ordering::SeqCst);
                match self.store.apply(ServerEvent::QuestionsList(questions)) {
                    Ok(outcome) => debug!(?outcome, "poll applied"),
                    Err(e) => warn!(error = %e, "poll result rejected"),
                }
            }
            Err(e) => {
                self.live.store(false, Ordering::SeqCst);
                warn!(error = %e, "poll failed");
            }
        }
    }
}

#[async_trait]
impl<S: QuestionSource> EventFeed for PollingFeed<S> {
    async fn start(&self) {
        let mut task = self.inner.task();
        if self.inner.stopped.load(Ordering::SeqCst) || task.is_some() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.poll_once().await;
            }
        }));
    }

    async fn stop(&self) {
        let _apply = self.inner.apply.lock().await;
        self.inner.halt();
    }

    fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    fn store(&self) -> &QuestionStore {
        &self.inner.store
    }
}

impl<S: QuestionSource> Drop for PollingFeed<S> {
    fn drop(&mut self) {
        // A poll mid-apply finishes that apply; nothing runs after it.
        self.inner.halt();
    }
}

impl<S: QuestionSource> std::fmt::Debug for PollingFeed<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingFeed")
            .field("interval", &self.inner.interval)
            .field("live", &self.is_live())
            .finish()
    }
}
