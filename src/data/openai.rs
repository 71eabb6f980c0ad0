//! OpenAI-compatible chat-completions client (the text-generation collaborator).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::AnalysisError;

pub const BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Body of one `/chat/completions` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Anything that can turn a chat request into reply text.
pub trait CompletionClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, AnalysisError>;
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::text_generation(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, AnalysisError> {
        info!(model = %request.model, messages = request.messages.len(), "requesting analysis");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|e| AnalysisError::text_generation(e.to_string()))?;

        let status = resp.status();
        let data: Value = resp
            .json()
            .map_err(|e| AnalysisError::text_generation(format!("failed to parse response ({status}): {e}")))?;

        if !status.is_success() {
            warn!(%status, "text generation rejected");
        }
        reply_content(&data).map_err(|message| {
            if status.is_success() {
                AnalysisError::text_generation(message)
            } else {
                AnalysisError::text_generation(format!("HTTP {status}: {message}"))
            }
        })
    }
}

/// Pull the reply text out of a chat-completions response.
pub fn reply_content(data: &Value) -> Result<String, String> {
    if let Some(error) = data.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(message.to_string());
    }

    data["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "no content in reply".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_as_chat_completions_body() {
        let request = ChatRequest {
            model: "gpt-4".to_string(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            temperature: 0.3,
            max_tokens: 1000,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "sys"}));
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn reply_content_reads_first_choice() {
        let data = json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"a\": 1}"}}],
            "usage": {"prompt_tokens": 10}
        });
        assert_eq!(reply_content(&data).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn reply_content_surfaces_api_error_and_missing_content() {
        let data = json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}});
        assert_eq!(reply_content(&data).unwrap_err(), "Incorrect API key provided");

        let data = json!({"choices": []});
        assert_eq!(reply_content(&data).unwrap_err(), "no content in reply");
    }
}
