//! Message and turn HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/v1/sessions/{id}/messages - Full message log
//! - POST /api/v1/sessions/{id}/messages - Run one turn, returns the reply
//! - GET  /api/v1/sessions/{id}/history  - Recent window (cache first)
//! - GET  /api/v1/sessions/{id}/pending  - Trailing unanswered user message

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_core::chat::service::HistoryView;
use parley_types::chat::ChatMessage;

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::owner::Owner;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Response body for the pending-turn probe.
#[derive(Debug, Serialize)]
pub struct PendingTurn {
    pub pending: bool,
    pub message: Option<ChatMessage>,
}

/// Resolve the path id and confirm the caller owns an active session.
async fn owned_session(state: &AppState, owner: &Uuid, session_id: &str) -> Result<Uuid, AppError> {
    let sid = parse_uuid(session_id)?;
    state.chat_service.get_session(&sid, owner).await?;
    Ok(sid)
}

/// GET /api/v1/sessions/{id}/messages - All messages in log order.
pub async fn list_messages(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    let start = Instant::now();
    let sid = owned_session(&state, &owner, &session_id).await?;

    let messages = state.chat_service.list_messages(&sid).await?;

    Ok(ApiResponse::success(messages, start)
        .with_link("self", &format!("/api/v1/sessions/{sid}/messages"))
        .with_link("session", &format!("/api/v1/sessions/{sid}")))
}

/// POST /api/v1/sessions/{id}/messages - Send a user message, get the reply.
///
/// If the client disconnects mid-turn the turn is dropped; the user message
/// stays in the log as a pending turn.
pub async fn send_message(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(session_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<ApiResponse<ChatMessage>, AppError> {
    let start = Instant::now();
    let sid = owned_session(&state, &owner, &session_id).await?;

    let reply = state.chat_service.send_message(sid, &body.content).await?;

    Ok(ApiResponse::created(reply, start)
        .with_link("messages", &format!("/api/v1/sessions/{sid}/messages")))
}

/// GET /api/v1/sessions/{id}/history - The cached window, or the log tail on a miss.
pub async fn get_history(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<HistoryView>, AppError> {
    let start = Instant::now();
    let sid = owned_session(&state, &owner, &session_id).await?;

    let view = state.chat_service.cached_history(&sid).await?;

    Ok(ApiResponse::success(view, start))
}

/// GET /api/v1/sessions/{id}/pending - Whether the last turn never got a reply.
pub async fn get_pending(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<PendingTurn>, AppError> {
    let start = Instant::now();
    let sid = owned_session(&state, &owner, &session_id).await?;

    let message = state.chat_service.pending_turn(&sid).await?;

    Ok(ApiResponse::success(
        PendingTurn {
            pending: message.is_some(),
            message,
        },
        start,
    ))
}
