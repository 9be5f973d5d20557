//! AI Provider Gateway: the single point of entry for all text-generation
//! calls in the service.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! All generation MUST go through an [`AiGateway`].
//!
//! Calls are single-attempt: a failed request surfaces immediately and is
//! never retried here.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::models::chat::{ChatMessage, MessageRole};

pub mod anthropic;
pub mod groq;
pub mod prompts;

use anthropic::AnthropicClient;
use groq::GroqClient;
use prompts::{career_assistant_system, skill_gap_prompt, EMPTY_REPLY_FALLBACK, JSON_ONLY_SYSTEM};

/// Low randomness: the structured output is parsed, not read.
const STRUCTURED_TEMPERATURE: f32 = 0.1;
const CONVERSATIONAL_TEMPERATURE: f32 = 0.5;
const CONVERSATIONAL_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} is missing from environment variables")]
    MissingCredential(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider call exceeded the {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl LlmError {
    /// True when the provider answered but the output was unusable, as
    /// opposed to the call itself failing.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, LlmError::Parse(_) | LlmError::EmptyContent)
    }
}

/// Supported generation backends. Only one is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    Anthropic,
}

impl Provider {
    pub fn credential_var(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn model(&self) -> &'static str {
        match self {
            Provider::Groq => groq::GROQ_MODEL,
            Provider::Anthropic => anthropic::ANTHROPIC_MODEL,
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(format!("Provider {other} is not supported")),
        }
    }
}

/// One message as both providers expect it on the wire.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WireMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Provider-neutral description of a single blocking completion call.
pub struct Completion<'a> {
    pub system: &'a str,
    pub messages: &'a [WireMessage<'a>],
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub json_output: bool,
}

/// The two generation capabilities the core depends on.
///
/// Carried in `AppState` as `Arc<dyn AiGateway>` so tests can substitute a
/// scripted implementation.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Returns the provider's JSON object for a skill-gap analysis. The shape
    /// is NOT guaranteed; callers must validate it.
    async fn generate_structured(
        &self,
        resume_text: &str,
        target_role: &str,
    ) -> Result<serde_json::Value, LlmError>;

    /// Returns the complete assistant reply for the given history.
    /// `messages` must not contain system messages; the instruction is
    /// synthesized here from `briefing`.
    async fn generate_conversational(
        &self,
        messages: &[ChatMessage],
        briefing: &str,
    ) -> Result<String, LlmError>;
}

enum ProviderClient {
    Groq(GroqClient),
    Anthropic(AnthropicClient),
    /// Answers with `reply` after `delay`; stands in for a slow provider.
    #[cfg(test)]
    Canned {
        delay: Duration,
        reply: String,
    },
}

impl ProviderClient {
    fn connect(provider: Provider, api_key: Option<&str>) -> Result<Self, LlmError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingCredential(provider.credential_var()))?
            .to_string();
        let http = Client::builder().build()?;

        info!("LLM client initialized (model: {})", provider.model());
        Ok(match provider {
            Provider::Groq => ProviderClient::Groq(GroqClient::new(http, api_key)),
            Provider::Anthropic => ProviderClient::Anthropic(AnthropicClient::new(http, api_key)),
        })
    }

    async fn complete(&self, completion: &Completion<'_>) -> Result<String, LlmError> {
        match self {
            ProviderClient::Groq(client) => client.complete(completion).await,
            ProviderClient::Anthropic(client) => client.complete(completion).await,
            #[cfg(test)]
            ProviderClient::Canned { delay, reply } => {
                tokio::time::sleep(*delay).await;
                Ok(reply.clone())
            }
        }
    }
}

/// Production gateway. The outbound client is built on first use so a missing
/// credential only breaks AI routes, never startup.
pub struct LlmGateway {
    provider: Provider,
    api_key: Option<String>,
    deadline: Option<Duration>,
    client: OnceCell<ProviderClient>,
}

impl LlmGateway {
    pub fn new(provider: Provider, api_key: Option<String>, deadline: Option<Duration>) -> Self {
        Self {
            provider,
            api_key,
            deadline,
            client: OnceCell::new(),
        }
    }

    #[cfg(test)]
    fn with_client(provider: Provider, client: ProviderClient, deadline: Option<Duration>) -> Self {
        Self {
            provider,
            api_key: None,
            deadline,
            client: OnceCell::from(client),
        }
    }

    async fn client(&self) -> Result<&ProviderClient, LlmError> {
        self.client
            .get_or_try_init(|| async {
                ProviderClient::connect(self.provider, self.api_key.as_deref())
            })
            .await
    }

    async fn complete(&self, completion: &Completion<'_>) -> Result<String, LlmError> {
        let client = self.client().await?;
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, client.complete(completion))
                .await
                .map_err(|_| LlmError::DeadlineExceeded(deadline))?,
            None => client.complete(completion).await,
        }
    }
}

#[async_trait]
impl AiGateway for LlmGateway {
    async fn generate_structured(
        &self,
        resume_text: &str,
        target_role: &str,
    ) -> Result<serde_json::Value, LlmError> {
        let prompt = skill_gap_prompt(resume_text, target_role);
        let turns = [WireMessage {
            role: MessageRole::User.as_str(),
            content: &prompt,
        }];

        let text = self
            .complete(&Completion {
                system: JSON_ONLY_SYSTEM,
                messages: &turns,
                temperature: STRUCTURED_TEMPERATURE,
                max_tokens: None,
                json_output: true,
            })
            .await?;

        parse_json_object(&text)
    }

    async fn generate_conversational(
        &self,
        messages: &[ChatMessage],
        briefing: &str,
    ) -> Result<String, LlmError> {
        let system = career_assistant_system(briefing);
        let turns: Vec<WireMessage<'_>> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();
        debug!("Forwarding {} chat messages to provider", turns.len());

        let reply = self
            .complete(&Completion {
                system: &system,
                messages: &turns,
                temperature: CONVERSATIONAL_TEMPERATURE,
                max_tokens: Some(CONVERSATIONAL_MAX_TOKENS),
                json_output: false,
            })
            .await?;

        let reply = reply.trim();
        Ok(if reply.is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            reply.to_string()
        })
    }
}

/// Parses provider output as a JSON value. Empty output is a schema failure.
fn parse_json_object(text: &str) -> Result<serde_json::Value, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
