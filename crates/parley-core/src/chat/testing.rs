//! In-memory fakes for the chat ports, used by this crate's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use parley_types::chat::{ChatMessage, ChatSession, MessageRole};
use parley_types::error::{CacheError, RepositoryError};
use parley_types::llm::{GeneratedReply, GenerationError};
use tokio::time::Instant;
use uuid::Uuid;

use super::cache::CacheStore;
use super::repository::ChatRepository;
use crate::generator::ResponseGenerator;

/// Alternating user/assistant history of `len` messages.
pub fn make_history(session_id: Uuid, len: usize) -> Vec<ChatMessage> {
    (0..len)
        .map(|i| {
            let role = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            };
            ChatMessage::new(session_id, role, format!("message {i}"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Vec-backed repository with failure injection.
#[derive(Default)]
pub struct FakeChatRepository {
    sessions: Mutex<HashMap<Uuid, ChatSession>>,
    messages: Mutex<Vec<ChatMessage>>,
    appends: AtomicUsize,
    /// Fail the n-th (0-based) `append_message` call.
    fail_append_at: Mutex<Option<usize>>,
    fail_reads: AtomicBool,
    fail_history_reads: AtomicBool,
}

impl FakeChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_append_at(&self, call: usize) {
        *self.fail_append_at.lock().unwrap() = Some(call);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail only `get_messages`, leaving session lookups working.
    pub fn fail_history_reads(&self, fail: bool) {
        self.fail_history_reads.store(fail, Ordering::SeqCst);
    }

    pub fn all_messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    fn check_reads(&self) -> Result<(), RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(RepositoryError::Connection)
        } else {
            Ok(())
        }
    }
}

impl ChatRepository for FakeChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        self.check_reads()?;
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn list_active_sessions(&self, owner_id: &Uuid) -> Result<Vec<ChatSession>, RepositoryError> {
        self.check_reads()?;
        let mut sessions: Vec<ChatSession> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.owner_id == *owner_id && s.is_active)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn rename_session(
        &self,
        session_id: &Uuid,
        owner_id: &Uuid,
        title: &str,
    ) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(session_id) {
            Some(s) if s.owner_id == *owner_id && s.is_active => {
                s.title = title.to_string();
                s.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn deactivate_session(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(session_id) {
            Some(s) if s.owner_id == *owner_id => {
                s.is_active = false;
                s.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<ChatMessage, RepositoryError> {
        let call = self.appends.fetch_add(1, Ordering::SeqCst);
        if *self.fail_append_at.lock().unwrap() == Some(call) {
            return Err(RepositoryError::Query("injected append failure".to_string()));
        }

        let mut messages = self.messages.lock().unwrap();
        let mut stored = message.clone();
        if let Some(last) = messages.iter().rev().find(|m| m.session_id == message.session_id) {
            if stored.created_at < last.created_at {
                stored.created_at = last.created_at;
            }
        }
        messages.push(stored.clone());

        if let Some(s) = self.sessions.lock().unwrap().get_mut(&message.session_id) {
            s.message_count += 1;
            s.updated_at = Utc::now();
        }
        Ok(stored)
    }

    async fn get_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.check_reads()?;
        if self.fail_history_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("injected history failure".to_string()));
        }
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.session_id == *session_id)
            .cloned()
            .collect())
    }

    async fn last_message(&self, session_id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        self.check_reads()?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.session_id == *session_id)
            .cloned())
    }

    async fn get_message_count(&self, session_id: &Uuid) -> Result<u32, RepositoryError> {
        self.check_reads()?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.session_id == *session_id)
            .count() as u32)
    }
}

// ---------------------------------------------------------------------------
// Cache store
// ---------------------------------------------------------------------------

/// HashMap-backed cache store on tokio's clock, so paused-time tests can
/// drive expiry.
#[derive(Default)]
pub struct FakeCacheStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FakeCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

impl CacheStore for FakeCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected write failure".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected delete failure".to_string()));
        }
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub enum StubMode {
    /// Reply with `echo: <last message>`.
    Echo,
    /// Fail with a provider error.
    Fail,
    /// Never resolve.
    Hang,
}

/// Generator stub that records every history it was given.
pub struct StubGenerator {
    mode: Mutex<StubMode>,
    delay: Option<Duration>,
    seen: Mutex<Vec<Vec<(MessageRole, String)>>>,
}

impl StubGenerator {
    pub fn new(mode: StubMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::new(StubMode::Echo)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_mode(&self, mode: StubMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn seen(&self) -> Vec<Vec<(MessageRole, String)>> {
        self.seen.lock().unwrap().clone()
    }
}

impl ResponseGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, history: &[ChatMessage]) -> Result<GeneratedReply, GenerationError> {
        self.seen
            .lock()
            .unwrap()
            .push(history.iter().map(|m| (m.role, m.content.clone())).collect());

        let mode = *self.mode.lock().unwrap();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match mode {
            StubMode::Echo => {
                let last = history.last().ok_or(GenerationError::EmptyHistory)?;
                Ok(GeneratedReply {
                    content: format!("echo: {}", last.content),
                    model: Some("stub-model".to_string()),
                    metadata: None,
                })
            }
            StubMode::Fail => Err(GenerationError::Provider {
                message: "stub failure".to_string(),
            }),
            StubMode::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
