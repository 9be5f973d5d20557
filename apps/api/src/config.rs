use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::llm_client::Provider;

/// Application configuration loaded from environment variables.
///
/// Provider credentials are NOT validated here: a missing key only fails the
/// AI routes, on first use.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub ai_provider: Provider,
    pub ai_api_key: Option<String>,
    /// Deadline applied to every provider call; no deadline when unset.
    pub ai_request_timeout: Option<Duration>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let ai_provider = optional_env("AI_PROVIDER")
            .unwrap_or_else(|| "groq".to_string())
            .parse::<Provider>()
            .map_err(|e: String| anyhow!(e))
            .context("AI_PROVIDER must be 'groq' or 'anthropic'")?;

        let ai_request_timeout = optional_env("AI_REQUEST_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .context("AI_REQUEST_TIMEOUT_SECS must be a whole number of seconds")
            })
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            ai_api_key: optional_env(ai_provider.credential_var()),
            ai_provider,
            ai_request_timeout,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
