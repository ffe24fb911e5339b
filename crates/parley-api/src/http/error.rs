//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::{ChatError, RepositoryError, TurnCause, TurnStage};
use parley_types::llm::GenerationError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat service errors.
    Chat(ChatError),
    /// Missing or malformed caller identity.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    /// Status, machine-readable code, message and optional details.
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Chat(ChatError::NotFoundOrForbidden) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Session not found".to_string(),
                None,
            ),
            AppError::Chat(ChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Chat(ChatError::Persistence(RepositoryError::Conflict(msg))) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None)
            }
            AppError::Chat(e @ ChatError::Persistence(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_ERROR",
                e.to_string(),
                None,
            ),
            AppError::Chat(
                e @ ChatError::TurnFailed {
                    stage,
                    pending_message_id,
                    cause,
                },
            ) => {
                let (status, code) = match (stage, cause) {
                    (
                        TurnStage::Generate,
                        TurnCause::Generation(GenerationError::Timeout { .. }),
                    ) => (StatusCode::GATEWAY_TIMEOUT, "GENERATION_TIMEOUT"),
                    (TurnStage::Generate, _) => (StatusCode::BAD_GATEWAY, "GENERATION_FAILED"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "TURN_FAILED"),
                };
                let details = json!({
                    "stage": stage.to_string(),
                    "pending_message_id": pending_message_id,
                });
                (status, code, e.to_string(), Some(details))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, %message, "Request failed");
        }

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [error]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_not_found_or_forbidden_is_404() {
        let (status, code, _, _) = AppError::from(ChatError::NotFoundOrForbidden).parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "SESSION_NOT_FOUND");
    }

    #[test]
    fn test_generation_timeout_is_504_with_pending_id() {
        let pending = Uuid::now_v7();
        let err = ChatError::TurnFailed {
            stage: TurnStage::Generate,
            pending_message_id: Some(pending),
            cause: TurnCause::Generation(GenerationError::Timeout { timeout_ms: 30_000 }),
        };
        let (status, code, _, details) = AppError::from(err).parts();
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(code, "GENERATION_TIMEOUT");
        let details = details.unwrap();
        assert_eq!(details["stage"], "generate");
        assert_eq!(details["pending_message_id"], pending.to_string());
    }

    #[test]
    fn test_provider_failure_is_502() {
        let err = ChatError::TurnFailed {
            stage: TurnStage::Generate,
            pending_message_id: Some(Uuid::now_v7()),
            cause: TurnCause::Generation(GenerationError::RateLimited),
        };
        assert_eq!(AppError::from(err).parts().0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_persist_failure_is_500() {
        let err = ChatError::TurnFailed {
            stage: TurnStage::Persist,
            pending_message_id: Some(Uuid::now_v7()),
            cause: TurnCause::Persistence(RepositoryError::Connection),
        };
        let (status, code, _, _) = AppError::from(err).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "TURN_FAILED");
    }
}
