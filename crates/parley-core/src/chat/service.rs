//! Chat service: the single entry point CLI and HTTP layers talk to.
//!
//! ChatService owns the capability objects (durable log, cache store,
//! generator) and wires them into a `TurnOrchestrator` and a
//! `SessionLifecycle` that share one set of per-session locks.

use std::sync::Arc;

use parley_types::chat::{ChatMessage, ChatSession, MessageRole};
use parley_types::config::ChatConfig;
use parley_types::error::ChatError;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use super::cache::{CacheStore, ConversationCache};
use super::lifecycle::SessionLifecycle;
use super::locks::SessionLocks;
use super::orchestrator::{TurnOrchestrator, TurnPolicy};
use super::repository::ChatRepository;
use crate::generator::ResponseGenerator;

/// Where a [`HistoryView`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    Cache,
    Log,
}

/// The most recent messages of a session.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub source: HistorySource,
    pub messages: Vec<ChatMessage>,
}

/// Facade over session lifecycle, turns and history reads.
///
/// Generic over the three ports so parley-core never depends on
/// parley-infra.
pub struct ChatService<R, S, G>
where
    R: ChatRepository,
    S: CacheStore,
    G: ResponseGenerator,
{
    repo: Arc<R>,
    cache: Arc<ConversationCache<S>>,
    orchestrator: TurnOrchestrator<R, S, G>,
    lifecycle: SessionLifecycle<R, S>,
}

impl<R, S, G> ChatService<R, S, G>
where
    R: ChatRepository,
    S: CacheStore,
    G: ResponseGenerator,
{
    pub fn new(repo: R, store: S, generator: G, config: &ChatConfig) -> Self {
        let repo = Arc::new(repo);
        let cache = Arc::new(ConversationCache::from_config(store, config));
        let locks = SessionLocks::new();

        let orchestrator = TurnOrchestrator::new(
            Arc::clone(&repo),
            Arc::clone(&cache),
            Arc::new(generator),
            locks.clone(),
            TurnPolicy::from_config(config),
        );
        let lifecycle = SessionLifecycle::new(Arc::clone(&repo), Arc::clone(&cache), locks);

        Self {
            repo,
            cache,
            orchestrator,
            lifecycle,
        }
    }

    /// Access the chat repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn cache(&self) -> &ConversationCache<S> {
        &self.cache
    }

    pub fn generator_name(&self) -> &str {
        self.orchestrator.generator_name()
    }

    // --- Sessions ---

    pub async fn create_session(&self, owner_id: Uuid, title: &str) -> Result<ChatSession, ChatError> {
        self.lifecycle.create_session(owner_id, title).await
    }

    /// Active sessions, most recently updated first.
    pub async fn list_sessions(&self, owner_id: &Uuid) -> Result<Vec<ChatSession>, ChatError> {
        self.lifecycle.list_sessions(owner_id).await
    }

    /// An active session owned by `owner_id`, or `NotFoundOrForbidden`.
    pub async fn get_session(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<ChatSession, ChatError> {
        self.lifecycle.get_session(session_id, owner_id).await
    }

    pub async fn rename_session(
        &self,
        session_id: &Uuid,
        owner_id: &Uuid,
        title: &str,
    ) -> Result<ChatSession, ChatError> {
        self.lifecycle.rename_session(session_id, owner_id, title).await
    }

    pub async fn deactivate_session(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<(), ChatError> {
        self.lifecycle.deactivate_session(session_id, owner_id).await
    }

    // --- Messages ---

    /// Every message of a session in log order.
    pub async fn list_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.repo.get_messages(session_id).await?)
    }

    /// Run one turn. See [`TurnOrchestrator`] for the failure modes.
    pub async fn send_message(&self, session_id: Uuid, text: &str) -> Result<ChatMessage, ChatError> {
        self.orchestrator.send_message(session_id, text).await
    }

    pub async fn send_message_with_cancel(
        &self,
        session_id: Uuid,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ChatMessage, ChatError> {
        self.orchestrator
            .send_message_with_cancel(session_id, text, cancel)
            .await
    }

    pub async fn append_system_message(&self, session_id: Uuid, content: &str) -> Result<ChatMessage, ChatError> {
        self.orchestrator.append_system_message(session_id, content).await
    }

    /// Recent history, served from the cache when it has an entry.
    ///
    /// A miss or a cache error falls back to the tail of the durable log
    /// (same window size, or the whole log when the window is 0); the
    /// fallback does not repopulate the cache.
    pub async fn cached_history(&self, session_id: &Uuid) -> Result<HistoryView, ChatError> {
        match self.cache.get(session_id).await {
            Ok(Some(messages)) => {
                return Ok(HistoryView {
                    source: HistorySource::Cache,
                    messages,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Cache read failed, using durable log");
            }
        }

        let mut messages = self.repo.get_messages(session_id).await?;
        // A zero window disables the cache; the view is then the whole log.
        if self.cache.window() > 0 {
            messages = self.cache.window_of(&messages).to_vec();
        }
        Ok(HistoryView {
            source: HistorySource::Log,
            messages,
        })
    }

    /// The trailing user message when the last turn never got a reply.
    pub async fn pending_turn(&self, session_id: &Uuid) -> Result<Option<ChatMessage>, ChatError> {
        let last = self.repo.last_message(session_id).await?;
        Ok(last.filter(|m| m.role == MessageRole::User))
    }
}
