//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/sessions       - Create a session
//! - GET    /api/v1/sessions       - List the caller's active sessions
//! - GET    /api/v1/sessions/{id}  - Get a single session
//! - PATCH  /api/v1/sessions/{id}  - Rename a session
//! - DELETE /api/v1/sessions/{id}  - Deactivate a session

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use parley_types::chat::ChatSession;

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::owner::Owner;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for creating a session.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Request body for renaming a session.
#[derive(Debug, Deserialize)]
pub struct RenameSessionRequest {
    pub title: String,
}

fn session_links(resp: ApiResponse<ChatSession>) -> ApiResponse<ChatSession> {
    let id = resp.data.id;
    resp.with_link("self", &format!("/api/v1/sessions/{id}"))
        .with_link("messages", &format!("/api/v1/sessions/{id}/messages"))
}

/// POST /api/v1/sessions - Create a session.
pub async fn create_session(
    State(state): State<AppState>,
    Owner(owner): Owner,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let start = Instant::now();
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let session = state
        .chat_service
        .create_session(owner, body.title.as_deref().unwrap_or_default())
        .await?;

    Ok(session_links(ApiResponse::created(session, start)))
}

/// GET /api/v1/sessions - List active sessions, most recently updated first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<ApiResponse<Vec<ChatSession>>, AppError> {
    let start = Instant::now();

    let sessions = state.chat_service.list_sessions(&owner).await?;

    Ok(ApiResponse::success(sessions, start).with_link("self", "/api/v1/sessions"))
}

/// GET /api/v1/sessions/{id} - Get a session by ID.
pub async fn get_session(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let start = Instant::now();
    let sid = parse_uuid(&session_id)?;

    let session = state.chat_service.get_session(&sid, &owner).await?;

    Ok(session_links(ApiResponse::success(session, start)))
}

/// PATCH /api/v1/sessions/{id} - Rename a session.
pub async fn rename_session(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(session_id): Path<String>,
    Json(body): Json<RenameSessionRequest>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let start = Instant::now();
    let sid = parse_uuid(&session_id)?;

    let session = state
        .chat_service
        .rename_session(&sid, &owner, &body.title)
        .await?;

    Ok(session_links(ApiResponse::success(session, start)))
}

/// DELETE /api/v1/sessions/{id} - Deactivate a session. Idempotent.
pub async fn delete_session(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let sid = parse_uuid(&session_id)?;

    state.chat_service.deactivate_session(&sid, &owner).await?;

    Ok(ApiResponse::success(
        serde_json::json!({"deleted": true, "session_id": sid}),
        start,
    ))
}
