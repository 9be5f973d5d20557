use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::AiGateway;
use crate::store::{AnalysisStore, ChatStore, ProfileStore};

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every collaborator is a trait object so deployments (and tests) can swap
/// backends without touching handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn AiGateway>,
    pub analyses: Arc<dyn AnalysisStore>,
    pub sessions: Arc<dyn ChatStore>,
    /// User Profile Store + Application Store (read-only).
    pub profiles: Arc<dyn ProfileStore>,
}
