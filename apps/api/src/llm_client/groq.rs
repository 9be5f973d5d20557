//! Groq backend (OpenAI-compatible chat completions).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Completion, LlmError, WireMessage};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<Choice>,
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    error: GroqErrorBody,
}

#[derive(Debug, Deserialize)]
struct GroqErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GroqClient {
    http: Client,
    api_key: String,
}

impl GroqClient {
    pub fn new(http: Client, api_key: String) -> Self {
        Self { http, api_key }
    }

    /// Single attempt; returns an empty string when the model produced no text.
    pub async fn complete(&self, completion: &Completion<'_>) -> Result<String, LlmError> {
        let request = build_request(completion);

        let response = self
            .http
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GroqError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GroqResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                "Groq call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(first_choice_text(parsed))
    }
}

fn build_request<'a>(completion: &'a Completion<'a>) -> GroqRequest<'a> {
    let mut messages = Vec::with_capacity(completion.messages.len() + 1);
    if !completion.system.is_empty() {
        messages.push(WireMessage {
            role: "system",
            content: completion.system,
        });
    }
    messages.extend(completion.messages.iter().copied());

    GroqRequest {
        model: GROQ_MODEL,
        messages,
        temperature: completion.temperature,
        max_tokens: completion.max_tokens,
        response_format: completion
            .json_output
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

fn first_choice_text(response: GroqResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_is_prepended() {
        let turns = [WireMessage {
            role: "user",
            content: "How do I prepare for an interview?",
        }];
        let completion = Completion {
            system: "be brief",
            messages: &turns,
            temperature: 0.5,
            max_tokens: Some(1024),
            json_output: false,
        };
        let json = serde_json::to_value(build_request(&completion)).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 1024);
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let turns = [WireMessage {
            role: "user",
            content: "analyze",
        }];
        let completion = Completion {
            system: "",
            messages: &turns,
            temperature: 0.1,
            max_tokens: None,
            json_output: true,
        };
        let json = serde_json::to_value(build_request(&completion)).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_missing_content_yields_empty_text() {
        let response: GroqResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(first_choice_text(response), "");
    }
}
