//! Turn orchestrator: one `send_message` call advances a session by one
//! user/assistant exchange.
//!
//! Stages run strictly in order and none is retried:
//!
//! 1. AppendUser: write the user message to the durable log
//! 2. History: read the full ordered log back
//! 3. Generate: ask the response generator for a reply (timeout + cancellation)
//! 4. Persist: write the assistant reply to the durable log
//! 5. RefreshCache: best effort, failures are logged and swallowed
//!
//! There is no cross-step transaction. A user message without a reply is a
//! valid intermediate state; the failure carries its id so callers can show
//! the turn as pending.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parley_types::chat::{ChatMessage, MessageRole};
use parley_types::config::ChatConfig;
use parley_types::error::{ChatError, TurnCause, TurnStage};
use parley_types::llm::{GeneratedReply, GenerationError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cache::{CacheStore, ConversationCache};
use super::locks::{SessionGuard, SessionLocks};
use super::repository::ChatRepository;
use crate::generator::ResponseGenerator;

/// Knobs applied to every turn.
#[derive(Debug, Clone)]
pub struct TurnPolicy {
    /// Upper bound on a single Generate call.
    pub generate_timeout: Duration,
    /// Cap on the history handed to the generator. `None` sends everything.
    ///
    /// Independent of the cache window.
    pub max_context_messages: Option<usize>,
    /// Run turns on the same session one at a time.
    pub serialize_turns: bool,
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}

impl TurnPolicy {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            generate_timeout: config.generate_timeout(),
            max_context_messages: config.max_context_messages,
            serialize_turns: config.serialize_turns,
        }
    }
}

/// Sequences the durable log, generator and cache into one turn.
pub struct TurnOrchestrator<R, S, G>
where
    R: ChatRepository,
    S: CacheStore,
    G: ResponseGenerator,
{
    repo: Arc<R>,
    cache: Arc<ConversationCache<S>>,
    generator: Arc<G>,
    locks: SessionLocks,
    policy: TurnPolicy,
}

impl<R, S, G> TurnOrchestrator<R, S, G>
where
    R: ChatRepository,
    S: CacheStore,
    G: ResponseGenerator,
{
    pub fn new(
        repo: Arc<R>,
        cache: Arc<ConversationCache<S>>,
        generator: Arc<G>,
        locks: SessionLocks,
        policy: TurnPolicy,
    ) -> Self {
        Self {
            repo,
            cache,
            generator,
            locks,
            policy,
        }
    }

    pub fn policy(&self) -> &TurnPolicy {
        &self.policy
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Run one turn and return the persisted assistant message.
    pub async fn send_message(&self, session_id: Uuid, text: &str) -> Result<ChatMessage, ChatError> {
        self.send_message_with_cancel(session_id, text, &CancellationToken::new())
            .await
    }

    /// Like [`send_message`](Self::send_message), aborting the Generate
    /// stage when `cancel` fires.
    ///
    /// Cancellation surfaces as `TurnFailed { stage: Generate }` with the
    /// committed user message as `pending_message_id`.
    pub async fn send_message_with_cancel(
        &self,
        session_id: Uuid,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation("message content must not be empty".into()));
        }

        let _guard = self.lock(session_id).await;
        self.ensure_active(&session_id).await.map_err(|e| match e {
            // A store failure here means AppendUser never ran.
            ChatError::Persistence(e) => turn_failed(session_id, TurnStage::AppendUser, None, e),
            other => other,
        })?;

        // 1. AppendUser
        let user_message = self
            .repo
            .append_message(&ChatMessage::new(session_id, MessageRole::User, text))
            .await
            .map_err(|e| turn_failed(session_id, TurnStage::AppendUser, None, e))?;
        let pending = Some(user_message.id);

        // 2. History
        let mut history = self
            .repo
            .get_messages(&session_id)
            .await
            .map_err(|e| turn_failed(session_id, TurnStage::History, pending, e))?;

        // 3. Generate
        let started = Instant::now();
        let reply = self
            .generate(self.context_window(&history), cancel)
            .await
            .map_err(|e| turn_failed(session_id, TurnStage::Generate, pending, e))?;
        let response_ms = started.elapsed().as_millis() as u64;

        // 4. Persist
        let assistant = ChatMessage::new(session_id, MessageRole::Assistant, reply.content.clone())
            .with_metadata(self.reply_metadata(&reply, response_ms));
        let assistant = self
            .repo
            .append_message(&assistant)
            .await
            .map_err(|e| turn_failed(session_id, TurnStage::Persist, pending, e))?;

        // 5. RefreshCache
        if self.policy.serialize_turns {
            // Nothing else can have appended while we hold the session lock.
            history.push(assistant.clone());
            self.refresh_cache(&session_id, &history).await;
        } else {
            self.refresh_cache_from_log(&session_id).await;
        }

        info!(
            session_id = %session_id,
            message_id = %assistant.id,
            generator = self.generator.name(),
            response_ms,
            "Turn completed"
        );
        Ok(assistant)
    }

    /// Append a `system` message outside of a turn.
    ///
    /// The session's cache entry is dropped rather than refreshed, so the
    /// next read goes to the log.
    pub async fn append_system_message(
        &self,
        session_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation("message content must not be empty".into()));
        }

        let _guard = self.lock(session_id).await;
        self.ensure_active(&session_id).await?;

        let message = self
            .repo
            .append_message(&ChatMessage::new(session_id, MessageRole::System, content))
            .await?;

        if let Err(e) = self.cache.invalidate(&session_id).await {
            warn!(session_id = %session_id, error = %e, "Failed to invalidate conversation cache");
        }
        Ok(message)
    }

    async fn lock(&self, session_id: Uuid) -> Option<SessionGuard> {
        if self.policy.serialize_turns {
            Some(self.locks.acquire(session_id).await)
        } else {
            None
        }
    }

    async fn ensure_active(&self, session_id: &Uuid) -> Result<(), ChatError> {
        match self.repo.get_session(session_id).await? {
            Some(session) if session.is_active => Ok(()),
            _ => Err(ChatError::NotFoundOrForbidden),
        }
    }

    /// History handed to the generator: the whole log unless a context cap
    /// is configured.
    fn context_window<'a>(&self, history: &'a [ChatMessage]) -> &'a [ChatMessage] {
        match self.policy.max_context_messages {
            Some(max) if max > 0 && history.len() > max => &history[history.len() - max..],
            _ => history,
        }
    }

    async fn generate(
        &self,
        history: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<GeneratedReply, GenerationError> {
        let timeout = self.policy.generate_timeout;
        debug!(messages = history.len(), generator = self.generator.name(), "Generating reply");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            result = tokio::time::timeout(timeout, self.generator.generate(history)) => match result {
                Ok(reply) => reply,
                Err(_) => Err(GenerationError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }),
            },
        }
    }

    fn reply_metadata(&self, reply: &GeneratedReply, response_ms: u64) -> serde_json::Value {
        let mut metadata = serde_json::json!({
            "generator": self.generator.name(),
            "response_ms": response_ms,
        });
        if let Some(model) = &reply.model {
            metadata["model"] = serde_json::Value::String(model.clone());
        }
        if let Some(details) = &reply.metadata {
            metadata["details"] = details.clone();
        }
        metadata
    }

    /// RefreshCache for an unserialized turn.
    ///
    /// Runs under the session lock so it cannot interleave with a
    /// deactivation: either the entry is written first and then invalidated,
    /// or the session is already closed and nothing is written.
    async fn refresh_cache_from_log(&self, session_id: &Uuid) {
        let _guard = self.locks.acquire(*session_id).await;

        match self.repo.get_session(session_id).await {
            Ok(Some(session)) if session.is_active => {}
            Ok(_) => {
                debug!(session_id = %session_id, "Skipping cache refresh: session closed mid-turn");
                return;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Skipping cache refresh: session lookup failed");
                return;
            }
        }

        match self.repo.get_messages(session_id).await {
            Ok(latest) => self.refresh_cache(session_id, &latest).await,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Skipping cache refresh: history re-read failed");
            }
        }
    }

    async fn refresh_cache(&self, session_id: &Uuid, history: &[ChatMessage]) {
        if let Err(e) = self.cache.refresh(session_id, history).await {
            warn!(session_id = %session_id, error = %e, "Conversation cache refresh failed");
        }
    }
}

fn turn_failed(
    session_id: Uuid,
    stage: TurnStage,
    pending_message_id: Option<Uuid>,
    cause: impl Into<TurnCause>,
) -> ChatError {
    let cause = cause.into();
    warn!(session_id = %session_id, stage = %stage, error = %cause, "Turn failed");
    ChatError::TurnFailed {
        stage,
        pending_message_id,
        cause,
    }
}
