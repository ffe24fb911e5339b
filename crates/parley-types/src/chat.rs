//! Chat session and message types for Parley.
//!
//! These types model conversations between a user and the AI responder:
//! owner-scoped sessions with a soft-delete flag, and the append-only
//! message log that belongs to each session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Title given to sessions created without one.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// A chat session owned by a single user.
///
/// `is_active` is the only soft-delete marker: deactivating a session hides
/// it from listings but never removes its messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub is_active: bool,
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Build a fresh, active session for `owner_id`.
    ///
    /// Blank titles fall back to [`DEFAULT_SESSION_TITLE`].
    pub fn new(owner_id: Uuid, title: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_SESSION_TITLE.to_string()
        } else {
            title.trim().to_string()
        };
        let now = Utc::now();

        Self {
            id: Uuid::now_v7(),
            owner_id,
            title,
            is_active: true,
            message_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `owner_id` owns this session.
    pub fn is_owned_by(&self, owner_id: &Uuid) -> bool {
        self.owner_id == *owner_id
    }
}

/// A single message within a chat session.
///
/// Messages are totally ordered within a session by the durable log and are
/// never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Free-form structured metadata (e.g. generator name, latency).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a new, not yet persisted message.
    pub fn new(session_id: Uuid, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            role,
            content: content.into(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Attach structured metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_active() {
        let owner = Uuid::now_v7();
        let session = ChatSession::new(owner, "Rust questions");
        assert!(session.is_active);
        assert_eq!(session.title, "Rust questions");
        assert_eq!(session.message_count, 0);
        assert!(session.is_owned_by(&owner));
        assert!(!session.is_owned_by(&Uuid::now_v7()));
    }

    #[test]
    fn test_blank_title_defaults() {
        let session = ChatSession::new(Uuid::now_v7(), "   ");
        assert_eq!(session.title, DEFAULT_SESSION_TITLE);
    }

    #[test]
    fn test_message_role_reexport() {
        let role = MessageRole::User;
        assert_eq!(role.to_string(), "user");
    }

    #[test]
    fn test_message_metadata_skipped_when_absent() {
        let msg = ChatMessage::new(Uuid::now_v7(), MessageRole::User, "hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("metadata"));
        assert!(json.contains("\"role\":\"user\""));

        let with_meta = msg.with_metadata(serde_json::json!({"generator": "local"}));
        let json = serde_json::to_string(&with_meta).unwrap();
        assert!(json.contains("\"generator\":\"local\""));
    }

    #[test]
    fn test_message_deserialize_without_metadata() {
        let json = format!(
            r#"{{"id":"{}","session_id":"{}","role":"assistant","content":"hi","created_at":"2025-01-01T00:00:00Z"}}"#,
            Uuid::now_v7(),
            Uuid::now_v7()
        );
        let msg: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(msg.metadata.is_none());
    }
}
