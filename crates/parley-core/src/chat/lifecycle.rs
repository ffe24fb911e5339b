//! Session lifecycle: create, list, rename and soft-delete.
//!
//! Deactivation takes the same per-session lock as a turn (or, when turns
//! are not serialized, as a turn's cache refresh) and drops the session's
//! cache entry once the flag is flipped.

use std::sync::Arc;

use parley_types::chat::{ChatSession, DEFAULT_SESSION_TITLE};
use parley_types::error::ChatError;
use tracing::{info, warn};
use uuid::Uuid;

use super::cache::{CacheStore, ConversationCache};
use super::locks::SessionLocks;
use super::repository::ChatRepository;

pub struct SessionLifecycle<R: ChatRepository, S: CacheStore> {
    repo: Arc<R>,
    cache: Arc<ConversationCache<S>>,
    locks: SessionLocks,
}

impl<R: ChatRepository, S: CacheStore> SessionLifecycle<R, S> {
    pub fn new(repo: Arc<R>, cache: Arc<ConversationCache<S>>, locks: SessionLocks) -> Self {
        Self { repo, cache, locks }
    }

    /// Create an active session for `owner_id`. Blank titles become
    /// [`DEFAULT_SESSION_TITLE`].
    pub async fn create_session(&self, owner_id: Uuid, title: &str) -> Result<ChatSession, ChatError> {
        let session = self
            .repo
            .create_session(&ChatSession::new(owner_id, title))
            .await?;
        info!(session_id = %session.id, owner_id = %owner_id, "Session created");
        Ok(session)
    }

    /// Active sessions of `owner_id`, most recently updated first.
    pub async fn list_sessions(&self, owner_id: &Uuid) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.repo.list_active_sessions(owner_id).await?)
    }

    /// An active session owned by `owner_id`.
    ///
    /// Missing, inactive and foreign sessions are indistinguishable to the
    /// caller.
    pub async fn get_session(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<ChatSession, ChatError> {
        match self.repo.get_session(session_id).await? {
            Some(session) if session.is_active && session.is_owned_by(owner_id) => Ok(session),
            _ => Err(ChatError::NotFoundOrForbidden),
        }
    }

    pub async fn rename_session(
        &self,
        session_id: &Uuid,
        owner_id: &Uuid,
        title: &str,
    ) -> Result<ChatSession, ChatError> {
        let title = match title.trim() {
            "" => DEFAULT_SESSION_TITLE,
            trimmed => trimmed,
        };

        if !self.repo.rename_session(session_id, owner_id, title).await? {
            return Err(ChatError::NotFoundOrForbidden);
        }
        self.get_session(session_id, owner_id).await
    }

    /// Soft-delete a session and drop its cache entry.
    ///
    /// Fails with `NotFoundOrForbidden` when no row matches both the id and
    /// the owner. Deactivating an already inactive session succeeds.
    pub async fn deactivate_session(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<(), ChatError> {
        let _guard = self.locks.acquire(*session_id).await;

        if !self.repo.deactivate_session(session_id, owner_id).await? {
            return Err(ChatError::NotFoundOrForbidden);
        }

        if let Err(e) = self.cache.invalidate(session_id).await {
            // The orchestrator refuses inactive sessions, so a leftover entry
            // can only age out.
            warn!(session_id = %session_id, error = %e, "Failed to invalidate cache for deactivated session");
        }

        info!(session_id = %session_id, "Session deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::chat::testing::{FakeCacheStore, FakeChatRepository, make_history};

    fn lifecycle() -> (
        Arc<FakeChatRepository>,
        Arc<ConversationCache<FakeCacheStore>>,
        SessionLifecycle<FakeChatRepository, FakeCacheStore>,
    ) {
        let repo = Arc::new(FakeChatRepository::new());
        let cache = Arc::new(ConversationCache::new(
            FakeCacheStore::new(),
            20,
            Duration::from_secs(3600),
        ));
        let lifecycle = SessionLifecycle::new(Arc::clone(&repo), Arc::clone(&cache), SessionLocks::new());
        (repo, cache, lifecycle)
    }

    #[tokio::test]
    async fn test_create_defaults_blank_title() {
        let (_, _, lifecycle) = lifecycle();
        let session = lifecycle.create_session(Uuid::now_v7(), "").await.unwrap();
        assert_eq!(session.title, DEFAULT_SESSION_TITLE);
        assert!(session.is_active);
    }

    #[tokio::test]
    async fn test_list_is_active_only_and_scoped_to_owner() {
        let (_, _, lifecycle) = lifecycle();
        let owner = Uuid::now_v7();
        let keep = lifecycle.create_session(owner, "keep").await.unwrap();
        let gone = lifecycle.create_session(owner, "gone").await.unwrap();
        lifecycle.create_session(Uuid::now_v7(), "other").await.unwrap();

        lifecycle.deactivate_session(&gone.id, &owner).await.unwrap();

        let sessions = lifecycle.list_sessions(&owner).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_deactivate_foreign_session_is_rejected_and_unchanged() {
        let (repo, cache, lifecycle) = lifecycle();
        let owner = Uuid::now_v7();
        let session = lifecycle.create_session(owner, "mine").await.unwrap();
        let history = make_history(session.id, 2);
        for message in &history {
            repo.append_message(message).await.unwrap();
        }
        cache.refresh(&session.id, &history).await.unwrap();

        let err = lifecycle
            .deactivate_session(&session.id, &Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFoundOrForbidden));

        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert!(stored.is_active);
        assert_eq!(repo.get_messages(&session.id).await.unwrap().len(), 2);
        assert!(cache.get(&session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deactivate_clears_cache_and_keeps_messages() {
        let (repo, cache, lifecycle) = lifecycle();
        let owner = Uuid::now_v7();
        let session = lifecycle.create_session(owner, "closing").await.unwrap();
        let history = make_history(session.id, 4);
        for message in &history {
            repo.append_message(message).await.unwrap();
        }
        cache.refresh(&session.id, &history).await.unwrap();

        lifecycle.deactivate_session(&session.id, &owner).await.unwrap();

        assert!(cache.get(&session.id).await.unwrap().is_none());
        assert!(!repo.get_session(&session.id).await.unwrap().unwrap().is_active);
        assert_eq!(repo.get_messages(&session.id).await.unwrap().len(), 4);
        assert!(lifecycle.list_sessions(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_unknown_session() {
        let (_, _, lifecycle) = lifecycle();
        let err = lifecycle
            .deactivate_session(&Uuid::now_v7(), &Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFoundOrForbidden));
    }

    #[tokio::test]
    async fn test_deactivate_survives_cache_failure() {
        let (_, cache, lifecycle) = lifecycle();
        let owner = Uuid::now_v7();
        let session = lifecycle.create_session(owner, "x").await.unwrap();
        cache.store().fail_deletes(true);

        lifecycle.deactivate_session(&session.id, &owner).await.unwrap();
        assert!(lifecycle.list_sessions(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_session_hides_foreign_and_inactive() {
        let (_, _, lifecycle) = lifecycle();
        let owner = Uuid::now_v7();
        let session = lifecycle.create_session(owner, "x").await.unwrap();

        assert!(lifecycle.get_session(&session.id, &owner).await.is_ok());
        assert!(matches!(
            lifecycle.get_session(&session.id, &Uuid::now_v7()).await,
            Err(ChatError::NotFoundOrForbidden)
        ));

        lifecycle.deactivate_session(&session.id, &owner).await.unwrap();
        assert!(matches!(
            lifecycle.get_session(&session.id, &owner).await,
            Err(ChatError::NotFoundOrForbidden)
        ));
    }

    #[tokio::test]
    async fn test_rename_by_owner_only() {
        let (_, _, lifecycle) = lifecycle();
        let owner = Uuid::now_v7();
        let session = lifecycle.create_session(owner, "old").await.unwrap();

        let renamed = lifecycle
            .rename_session(&session.id, &owner, "  new title ")
            .await
            .unwrap();
        assert_eq!(renamed.title, "new title");

        let err = lifecycle
            .rename_session(&session.id, &Uuid::now_v7(), "hijack")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFoundOrForbidden));
    }
}
