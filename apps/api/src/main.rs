mod auth;
mod chat;
mod config;
mod db;
mod document;
mod errors;
mod llm_client;
mod models;
mod routes;
mod skill_gap;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmGateway;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values; AI keys are checked lazily)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career API v{}", env!("CARGO_PKG_VERSION"));

    // The outbound client is built on first AI call, not here
    let gateway = Arc::new(LlmGateway::new(
        config.ai_provider,
        config.ai_api_key.clone(),
        config.ai_request_timeout,
    ));
    if config.ai_api_key.is_none() {
        warn!(
            "{} is not set; AI routes will fail until it is configured",
            config.ai_provider.credential_var()
        );
    }

    let state = match &config.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::new(create_pool(url).await?));
            AppState {
                config: config.clone(),
                gateway,
                analyses: store.clone(),
                sessions: store.clone(),
                profiles: store,
            }
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            let store = Arc::new(MemoryStore::new());
            AppState {
                config: config.clone(),
                gateway,
                analyses: store.clone(),
                sessions: store.clone(),
                profiles: store,
            }
        }
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the job-board frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
