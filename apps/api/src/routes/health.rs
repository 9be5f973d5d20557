use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and the configured AI provider. Does not touch the
/// provider, so it stays green when the credential is missing.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "career-api",
        "aiModel": state.config.ai_provider.model(),
        "aiCredentialConfigured": state.config.ai_api_key.is_some(),
    }))
}
