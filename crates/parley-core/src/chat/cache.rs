//! Conversation cache: a TTL-bounded mirror of a session's latest messages.
//!
//! [`CacheStore`] is the raw byte-oriented key-value port (Valkey/Redis or
//! in-process). [`ConversationCache`] layers the conversation semantics on
//! top: one JSON entry per session holding at most `window` messages.
//!
//! The cache is advisory. A miss, an expired entry or an undecodable entry
//! all mean "consult the durable log", never "no messages".

use std::time::Duration;

use parley_types::chat::ChatMessage;
use parley_types::config::ChatConfig;
use parley_types::error::CacheError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Byte-oriented key-value store with per-key expiry.
///
/// Implementations live in parley-infra (`MemoryCacheStore`,
/// `ValkeyCacheStore`).
pub trait CacheStore: Send + Sync {
    /// Get the payload for `key`. Expired keys read as `None`.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>, CacheError>> + Send;

    /// Store `value` under `key`, replacing any previous value, expiring after `ttl`.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;

    /// Remove `key`. No-op if absent.
    fn delete(&self, key: &str) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;
}

/// Cache key for a session's conversation window.
pub fn session_cache_key(session_id: &Uuid) -> String {
    format!("chat:session:{session_id}")
}

/// Typed view over a [`CacheStore`] holding per-session message windows.
pub struct ConversationCache<S: CacheStore> {
    store: S,
    window: usize,
    ttl: Duration,
}

impl<S: CacheStore> ConversationCache<S> {
    pub fn new(store: S, window: usize, ttl: Duration) -> Self {
        Self { store, window, ttl }
    }

    /// Build a cache using the window and TTL from chat configuration.
    pub fn from_config(store: S, config: &ChatConfig) -> Self {
        Self::new(store, config.cache_window, config.cache_ttl())
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The trailing `min(window, len)` messages of an ordered history.
    pub fn window_of<'a>(&self, messages: &'a [ChatMessage]) -> &'a [ChatMessage] {
        let start = messages.len().saturating_sub(self.window);
        &messages[start..]
    }

    /// Replace the session's entry with the tail of `messages` and a fresh TTL.
    ///
    /// `messages` must already be in durable-log order.
    pub async fn refresh(&self, session_id: &Uuid, messages: &[ChatMessage]) -> Result<(), CacheError> {
        if self.window == 0 {
            return Ok(());
        }

        let tail = self.window_of(messages);
        let payload =
            serde_json::to_vec(tail).map_err(|e| CacheError::Codec(e.to_string()))?;

        self.store
            .set(&session_cache_key(session_id), payload, self.ttl)
            .await?;

        debug!(session_id = %session_id, cached = tail.len(), "Conversation cache refreshed");
        Ok(())
    }

    /// The cached window for a session, or `None` on a miss.
    pub async fn get(&self, session_id: &Uuid) -> Result<Option<Vec<ChatMessage>>, CacheError> {
        let key = session_cache_key(session_id);
        let Some(payload) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<Vec<ChatMessage>>(&payload) {
            Ok(messages) => Ok(Some(messages)),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Discarding undecodable cache entry");
                if let Err(e) = self.store.delete(&key).await {
                    warn!(session_id = %session_id, error = %e, "Failed to delete undecodable cache entry");
                }
                Ok(None)
            }
        }
    }

    /// Drop the session's entry.
    pub async fn invalidate(&self, session_id: &Uuid) -> Result<(), CacheError> {
        self.store.delete(&session_cache_key(session_id)).await
    }
}
