//! Axum route handlers for the AI chat API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::OptionalUser;
use crate::chat::session::{get_session, list_history, send_message, ChatDeps, ChatReply};
use crate::errors::AppError;
use crate::models::chat::{ChatSession, ChatSessionSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
    /// Kept as text: an unparseable id behaves like an unknown session.
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<ChatSessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: ChatSession,
}

/// POST /ai-chat/message
pub async fn handle_send_message(
    State(state): State<AppState>,
    OptionalUser(user_id): OptionalUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let deps = ChatDeps {
        sessions: state.sessions.as_ref(),
        profiles: state.profiles.as_ref(),
        analyses: state.analyses.as_ref(),
        gateway: state.gateway.as_ref(),
    };
    let session_id = request
        .session_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok());
    let reply = send_message(&deps, user_id, session_id, &request.message).await?;
    Ok(Json(reply))
}

/// GET /ai-chat/history
pub async fn handle_chat_history(
    State(state): State<AppState>,
    OptionalUser(user_id): OptionalUser,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = list_history(state.sessions.as_ref(), user_id).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// GET /ai-chat/session/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    OptionalUser(user_id): OptionalUser,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session_id = Uuid::parse_str(&session_id)
        .map_err(|_| AppError::NotFound("Session not found".to_string()))?;
    let session = get_session(state.sessions.as_ref(), user_id, session_id).await?;
    Ok(Json(SessionResponse { session }))
}
