//! Client for an OpenAI-compatible chat-completion API, primed as the ISA sales assistant.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::LlmConfig;

pub const ISA_SYSTEM_PROMPT: &str = include_str!("../prompts/isa_system.txt");

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug)]
pub enum LlmError {
    MissingApiKey,
    Status(u16),
    Transport(String),
    Decode(String),
    EmptyResponse,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::MissingApiKey => write!(f, "GROQ_API_KEY is not configured"),
            LlmError::Status(code) => write!(f, "Groq API error: {code}"),
            LlmError::Transport(msg) => write!(f, "Groq request failed: {msg}"),
            LlmError::Decode(msg) => write!(f, "Invalid Groq response: {msg}"),
            LlmError::EmptyResponse => write!(f, "Groq returned no choices"),
        }
    }
}

impl std::error::Error for LlmError {}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(ChatMessage {
            role: ChatRole::System,
            content: ISA_SYSTEM_PROMPT.trim_end().to_string(),
        });
        all.extend_from_slice(messages);

        json!({
            "model": self.model,
            "messages": all,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }

    /// Send the conversation and return the assistant's reply.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        tracing::debug!(count = messages.len(), "Sending chat completion request");

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&self.request_body(messages))
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "Chat completion failed");
            return Err(LlmError::Status(status.as_u16()));
        }

        let parsed: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ChatClient {
        ChatClient::new(&LlmConfig {
            api_key: None,
            base_url: "http://localhost:9/v1/".to_string(),
            model: "llama-3.1-70b-versatile".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn body_prepends_system_prompt() {
        let body = client().request_body(&[ChatMessage {
            role: ChatRole::User,
            content: "Quanto custa?".to_string(),
        }]);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[0]["content"]
            .as_str()
            .unwrap()
            .starts_with("Você é a ISA"));
        assert_eq!(messages[1]["content"], "Quanto custa?");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["model"], "llama-3.1-70b-versatile");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(client().base_url, "http://localhost:9/v1");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let err = client().complete(&[]).await.unwrap_err();
        assert_eq!(err.to_string(), "GROQ_API_KEY is not configured");
    }

    #[test]
    fn status_error_message() {
        assert_eq!(LlmError::Status(401).to_string(), "Groq API error: 401");
    }
}
