//! Caller identity. Authentication happens upstream; the authenticated user
//! id arrives in the `x-user-id` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Owner id when the caller is signed in, `None` for guests. A malformed id
/// is treated as a guest rather than rejected.
#[derive(Debug, Clone, Copy)]
pub struct OptionalUser(pub Option<Uuid>);

/// Rejects guests with 401.
#[derive(Debug, Clone, Copy)]
pub struct RequiredUser(pub Uuid);

fn user_id_from(parts: &Parts) -> Option<Uuid> {
    let raw = parts.headers.get(USER_ID_HEADER)?.to_str().ok()?;
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::debug!("Ignoring malformed {USER_ID_HEADER} header: {e}");
            None
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(user_id_from(parts)))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequiredUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id_from(parts)
            .map(RequiredUser)
            .ok_or(AppError::Unauthorized)
    }
}
