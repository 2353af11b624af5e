//! Service handle tying the pieces together.
//!
//! A [`ForumService`] is built once by its owner and passed around by
//! reference. It owns the question store, the REST client, the token store
//! and at most one live feed.
//!
//! Mutations go to the server over HTTP. Status changes are checked against
//! the local copy first, so a change the rules forbid is rejected without a
//! request and without touching the store. Records the server returns are
//! merged by id; a push event carrying the same record is applied again,
//! which is harmless.

use std::sync::{Arc, Mutex, PoisonError};

use askhive_core::{
    status, ConnectionStatus, ReconcileError, Snapshot, SubscriptionId, SuggestionBook,
    SuggestionOutcome,
};
use askhive_types::{
    Answer, AuthResponse, OutboundMessage, Question, QuestionId, QuestionStatus, User,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::credentials::TokenStore;
use crate::error::ClientError;
use crate::feed::{EventFeed, PollingFeed};
use crate::manager::ConnectionManager;
use crate::store::QuestionStore;
use crate::transport::{Transport, WsTransport};

enum LiveFeed<T: Transport> {
    Push(ConnectionManager<T>),
    Poll(PollingFeed<Arc<ApiClient>>),
}

impl<T: Transport> LiveFeed<T> {
    fn as_feed(&self) -> &dyn EventFeed {
        match self {
            Self::Push(manager) => manager,
            Self::Poll(feed) => feed,
        }
    }
}

/// Client-side handle to one forum.
pub struct ForumService<T: Transport = WsTransport> {
    config: ClientConfig,
    api: Arc<ApiClient>,
    tokens: Arc<dyn TokenStore>,
    store: QuestionStore,
    user: Mutex<Option<User>>,
    suggestions: Mutex<SuggestionBook>,
    live: tokio::sync::Mutex<Option<LiveFeed<T>>>,
}

impl<T: Transport> ForumService<T> {
    /// Create a service. No I/O happens until a method is called.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        let api = ApiClient::new(config.api_url())?;
        Ok(Self {
            config,
            api: Arc::new(api),
            tokens,
            store: QuestionStore::new(),
            user: Mutex::new(None),
            suggestions: Mutex::new(SuggestionBook::new()),
            live: tokio::sync::Mutex::new(None),
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The REST client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Pick up a stored token and check it with the server.
    ///
    /// A token the server rejects is forgotten and `None` returned.
    pub async fn restore_session(&self) -> Result<Option<User>, ClientError> {
        let Some(token) = self.tokens.load().await? else {
            return Ok(None);
        };
        self.api.set_token(Some(token));

        match self.api.me().await {
            Ok(user) => {
                debug!(user = %user.username, "session restored");
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(e) => {
                let err = ClientError::from(e);
                if !err.is_unauthorized() {
                    return Err(err);
                }
                info!("stored token rejected, signing out");
                self.forget_session().await?;
                Ok(None)
            }
        }
    }

    /// Sign in and remember the token.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let auth = self.api.login(username, password).await?;
        self.adopt(auth).await
    }

    /// Create an account and sign in as it.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let auth = self.api.register(username, email, password).await?;
        self.adopt(auth).await
    }

    /// Stop any live feed and forget the token.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.shutdown().await;
        self.forget_session().await
    }

    /// The signed-in user, if known.
    pub fn current_user(&self) -> Option<User> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn adopt(&self, auth: AuthResponse) -> Result<User, ClientError> {
        self.tokens.save(&auth.access_token).await?;
        self.api.set_token(Some(auth.access_token));
        info!(user = %auth.user.username, "signed in");
        self.set_user(Some(auth.user.clone()));
        Ok(auth.user)
    }

    async fn forget_session(&self) -> Result<(), ClientError> {
        self.api.set_token(None);
        self.set_user(None);
        self.tokens.clear().await?;
        Ok(())
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = user;
    }

    // =========================================================================
    // Live feed
    // =========================================================================

    /// Open the persistent connection over `transport`.
    ///
    /// The endpoint carries the current token, if any. Returns a receiver
    /// for connection status changes.
    pub async fn start_live(
        &self,
        transport: T,
    ) -> Result<watch::Receiver<ConnectionStatus>, ClientError> {
        let mut live = self.live.lock().await;
        if live.is_some() {
            return Err(ClientError::AlreadyLive);
        }

        let endpoint = self.config.ws_endpoint(self.api.token().as_deref())?;
        let manager = ConnectionManager::new(
            transport,
            endpoint,
            self.store.clone(),
            self.config.heartbeat_interval(),
            self.config.reconnect_policy(),
        );
        let status = manager.watch_status();
        manager.start().await;
        *live = Some(LiveFeed::Push(manager));
        Ok(status)
    }

    /// Keep the store current by polling instead of holding a connection.
    pub async fn start_polling(&self) -> Result<(), ClientError> {
        let mut live = self.live.lock().await;
        if live.is_some() {
            return Err(ClientError::AlreadyLive);
        }

        let feed = PollingFeed::new(
            Arc::clone(&self.api),
            self.store.clone(),
            self.config.poll_interval(),
        );
        feed.start().await;
        *live = Some(LiveFeed::Poll(feed));
        Ok(())
    }

    /// Stop the live feed, if any. The store keeps its contents and is not
    /// written by the feed again.
    pub async fn shutdown(&self) {
        let feed = self.live.lock().await.take();
        if let Some(feed) = feed {
            feed.as_feed().stop().await;
        }
    }

    /// Whether a live feed is delivering updates.
    pub async fn is_live(&self) -> bool {
        self.live
            .lock()
            .await
            .as_ref()
            .is_some_and(|feed| feed.as_feed().is_live())
    }

    /// Ask for a fresh snapshot.
    ///
    /// Over the persistent connection this sends `refresh` and the reply
    /// arrives as a push; otherwise the list is fetched and applied here.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let live = self.live.lock().await;
        if let Some(feed) = live.as_ref() {
            match feed {
                LiveFeed::Push(manager) => manager.send(OutboundMessage::Refresh).await?,
                LiveFeed::Poll(feed) => feed.poll_now().await,
            }
            return Ok(());
        }
        drop(live);

        let questions = self.api.list_questions().await?;
        self.store.replace_all(questions);
        Ok(())
    }

    // =========================================================================
    // Store access
    // =========================================================================

    /// Current questions.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Be told about every store change.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    /// Stop being told.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Post a new question.
    pub async fn submit_question(&self, message: &str) -> Result<Question, ClientError> {
        let question = self.api.create_question(message).await?;
        self.store.insert(question.clone());
        Ok(question)
    }

    /// Post an answer. The updated question arrives through the feed.
    pub async fn answer(&self, id: QuestionId, message: &str) -> Result<Answer, ClientError> {
        Ok(self.api.add_answer(id, message).await?)
    }

    /// Mark a question answered.
    pub async fn mark_answered(&self, id: QuestionId) -> Result<Question, ClientError> {
        self.change_status(id, QuestionStatus::Answered).await
    }

    /// Escalate a question.
    pub async fn escalate(&self, id: QuestionId) -> Result<Question, ClientError> {
        self.change_status(id, QuestionStatus::Escalated).await
    }

    async fn change_status(
        &self,
        id: QuestionId,
        to: QuestionStatus,
    ) -> Result<Question, ClientError> {
        // Unknown locally: let the server decide.
        if let Some(current) = self.store.snapshot().get(id) {
            status::transition(current.status, to)
                .map_err(|source| ReconcileError::InvalidTransition { id, source })?;
        }

        let question = match to {
            QuestionStatus::Answered => self.api.mark_answered(id).await?,
            _ => self.api.escalate(id).await?,
        };
        self.store.replace_record(question.clone());
        Ok(question)
    }

    // =========================================================================
    // Suggestions
    // =========================================================================

    /// Ask the server for an AI-drafted answer.
    ///
    /// A later request for the same question supersedes this one: its
    /// result is still returned here but not kept.
    pub async fn request_suggestion(&self, id: QuestionId) -> Result<String, ClientError> {
        let ticket = self.book().begin(id);
        let result = self.api.ai_suggest(id).await;
        let outcome = self.book().complete(ticket, result);
        match outcome {
            SuggestionOutcome::Stored(text) => Ok(text),
            SuggestionOutcome::Failed(e) => {
                warn!(question = %id, error = %e, "suggestion failed");
                Err(e.into())
            }
            SuggestionOutcome::Superseded(result) => {
                debug!(question = %id, "suggestion superseded");
                result.map_err(Into::into)
            }
        }
    }

    /// Latest kept suggestion for a question.
    pub fn suggestion(&self, id: QuestionId) -> Option<String> {
        self.book().get(id).map(str::to_owned)
    }

    fn book(&self) -> std::sync::MutexGuard<'_, SuggestionBook> {
        self.suggestions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> std::fmt::Debug for ForumService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForumService")
            .field("api_url", &self.config.api_url())
            .field("questions", &self.store.len())
            .field("signed_in", &self.current_user().is_some())
            .finish()
    }
}
