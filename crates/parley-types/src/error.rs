use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::llm::GenerationError;

/// Errors from repository operations (used by trait definitions in parley-core).
///
/// This is the persistence error kind: the store was unavailable or the
/// read/write was rejected.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the ephemeral cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache command failed: {0}")]
    Command(String),

    #[error("cache payload error: {0}")]
    Codec(String),
}

/// The step of a chat turn that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    /// Appending the user message to the durable log.
    AppendUser,
    /// Reading the ordered history back from the durable log.
    History,
    /// Calling the response generator.
    Generate,
    /// Appending the assistant reply to the durable log.
    Persist,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnStage::AppendUser => write!(f, "append_user"),
            TurnStage::History => write!(f, "history"),
            TurnStage::Generate => write!(f, "generate"),
            TurnStage::Persist => write!(f, "persist"),
        }
    }
}

/// Underlying cause of a failed turn.
#[derive(Debug, Error)]
pub enum TurnCause {
    #[error(transparent)]
    Persistence(#[from] RepositoryError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Errors surfaced by the chat service to CLI and API callers.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The session does not exist, is inactive, or belongs to someone else.
    #[error("session not found or access denied")]
    NotFoundOrForbidden,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    /// A `send_message` turn stopped at `stage`.
    ///
    /// `pending_message_id` is the user message that was committed to the
    /// log but has no assistant reply yet (`None` when the user message
    /// itself was not written).
    #[error("turn failed at {stage} stage: {cause}")]
    TurnFailed {
        stage: TurnStage,
        pending_message_id: Option<Uuid>,
        #[source]
        cause: TurnCause,
    },
}

impl ChatError {
    /// The failed stage, if this is a turn failure.
    pub fn stage(&self) -> Option<TurnStage> {
        match self {
            ChatError::TurnFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether a user message was left in the log without a reply.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ChatError::TurnFailed {
                pending_message_id: Some(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_turn_failed_display_names_stage() {
        let err = ChatError::TurnFailed {
            stage: TurnStage::Generate,
            pending_message_id: Some(Uuid::now_v7()),
            cause: TurnCause::Generation(GenerationError::Cancelled),
        };
        assert_eq!(err.to_string(), "turn failed at generate stage: generation cancelled");
        assert_eq!(err.stage(), Some(TurnStage::Generate));
        assert!(err.is_pending());
    }

    #[test]
    fn test_append_user_failure_is_not_pending() {
        let err = ChatError::TurnFailed {
            stage: TurnStage::AppendUser,
            pending_message_id: None,
            cause: TurnCause::Persistence(RepositoryError::Connection),
        };
        assert!(!err.is_pending());
        assert_eq!(ChatError::NotFoundOrForbidden.stage(), None);
    }
}
