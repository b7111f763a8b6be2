//! Chat completions client.
//!
//! Sync HTTP client for OpenAI-compatible chat completions endpoints
//! (Groq's API by default). One completion per call; no streaming.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ureq::Agent;

use crate::error::LlmError;
use crate::prompts;
use crate::DiagramAssistant;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Settings for constructing a [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Base URL of the chat completions API (e.g. `https://api.groq.com/openai/v1`).
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Chat completions API client.
pub struct ChatClient {
    agent: Agent,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

/// Request body for POST /chat/completions.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

/// A single chat message.
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body for POST /chat/completions (fields we use).
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatClient {
    /// Create a client from config values.
    #[must_use]
    pub fn new(config: ChatClientConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key,
            model: config.model,
            temperature: config.temperature,
        }
    }

    /// Model name this client completes with.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request a single completion for a system + user message pair.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::HttpResponse`] for provider error statuses
    /// (auth, quota, bad request), [`LlmError::HttpRequest`] for transport
    /// failures and [`LlmError::EmptyCompletion`] when the reply carries
    /// no text.
    pub fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        let payload_bytes = serde_json::to_vec(&payload)?;

        debug!(model = %self.model, "Requesting chat completion");

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(LlmError::HttpResponse {
                status,
                body: error_body,
            });
        }

        let text = body.read_to_string()?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }

        Ok(content)
    }
}

impl DiagramAssistant for ChatClient {
    fn draft(&self, idea: &str) -> Result<String, LlmError> {
        self.complete(prompts::GENERATION_SYSTEM, &prompts::generation_user(idea))
    }

    fn repair(&self, source: &str, error: &str) -> Result<String, LlmError> {
        self.complete(&prompts::repair_system(error), &prompts::repair_user(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_serialization() {
        let payload = ChatRequest {
            model: "deepseek-r1-distill-llama-70b",
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "be brief",
                },
                ChatMessage {
                    role: "user",
                    content: "Idea: photo sharing app",
                },
            ],
        };

        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["model"], "deepseek-r1-distill-llama-70b");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Idea: photo sharing app");
    }

    #[test]
    fn test_response_deserialization() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "@startuml\n@enduml"}}
            ],
            "usage": {"total_tokens": 10}
        }"#;

        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("@startuml\n@enduml")
        );
    }

    #[test]
    fn test_response_without_choices() {
        let parsed: ChatResponse = serde_json::from_str("{}").unwrap();

        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ChatClient::new(ChatClientConfig {
            base_url: "https://api.groq.com/openai/v1/".to_owned(),
            api_key: "k".to_owned(),
            model: "m".to_owned(),
            temperature: 0.0,
        });

        assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
    }
}
