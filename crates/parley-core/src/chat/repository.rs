//! ChatRepository trait definition.
//!
//! The durable half of a conversation: the session directory (owner,
//! title, active flag) and the append-only, per-session ordered message log.
//! Follows the RPITIT pattern used by every port in this crate.

use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Ordering contract: `append_message` commits before it returns, and a
/// subsequent `get_messages` from the same caller observes it. Messages are
/// returned in the order they were appended and are never reordered,
/// updated or deleted.
pub trait ChatRepository: Send + Sync {
    /// Create a new chat session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by its unique ID, active or not.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List an owner's active sessions, most recently updated first.
    fn list_active_sessions(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Change an active session's title.
    ///
    /// Returns `false` when no active session with that id is owned by
    /// `owner_id`.
    fn rename_session(
        &self,
        session_id: &Uuid,
        owner_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Clear the active flag on a session.
    ///
    /// Returns `false` when no session with that id is owned by `owner_id`.
    /// Messages are left untouched.
    fn deactivate_session(
        &self,
        session_id: &Uuid,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Append a message to its session's log and return the stored copy.
    ///
    /// The stored `created_at` may be moved forward so that timestamps never
    /// decrease within a session.
    fn append_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// All messages of a session in append order (empty if none).
    fn get_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// The most recently appended message of a session.
    fn last_message(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatMessage>, RepositoryError>> + Send;

    /// Get the total number of messages in a session.
    fn get_message_count(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}
