//! Caller identity extractor.
//!
//! The owner is whatever the caller puts in `X-Owner-Id`. It scopes session
//! reads and writes; it is not proof of identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::http::error::AppError;

pub const OWNER_HEADER: &str = "x-owner-id";

/// The session owner named by the request.
#[derive(Debug, Clone, Copy)]
pub struct Owner(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(OWNER_HEADER).ok_or_else(|| {
            AppError::Unauthorized("Missing owner. Provide it via the 'X-Owner-Id' header.".to_string())
        })?;

        let value = value
            .to_str()
            .map_err(|_| AppError::Validation("Invalid X-Owner-Id header encoding".to_string()))?;

        value
            .trim()
            .parse()
            .map(Owner)
            .map_err(|_| AppError::Validation(format!("X-Owner-Id is not a UUID: {value}")))
    }
}
