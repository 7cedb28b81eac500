//! Chat-completion client for grammar correction, translation, and
//! explanation of selected text
//!
//! A thin async client for an OpenAI-compatible `/chat/completions`
//! endpoint. The surrounding application decides what to do with the
//! returned text (review, replace, copy); this module only performs the
//! request.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the chat-completion endpoint
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Full URL of the chat-completions route
    pub endpoint: String,
    /// Bearer token; sent only when non-empty
    pub api_key: String,
    /// Model identifier passed through to the endpoint
    pub model: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_ms: 30000,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Async client for the configured chat-completion endpoint
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Chat(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    async fn complete(&self, instruction: &str, text: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: instruction,
                },
                Message {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.2,
        };

        let mut builder = self.http.post(&self.config.endpoint).json(&request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Chat(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("Endpoint returned {}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Chat(format!("Malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Chat("Response contained no choices".to_string()))?;

        Ok(content.trim().to_string())
    }

    /// Correct grammar and spelling, returning the corrected text.
    pub async fn correct_grammar(&self, text: &str) -> Result<String> {
        self.complete(
            "Correct the grammar and spelling of the user's text. Reply with the corrected text only.",
            text,
        )
        .await
    }

    /// Translate into the target language, returning the translation.
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let instruction = format!(
            "Translate the user's text into {}. Reply with the translation only.",
            target_language
        );
        self.complete(&instruction, text).await
    }

    /// Explain the text in plain language.
    pub async fn explain(&self, text: &str) -> Result<String> {
        self.complete("Explain the user's text in plain language.", text)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_in_wire_shape() {
        let request = ChatRequest {
            model: "test-model",
            messages: vec![
                Message {
                    role: "system",
                    content: "instruction",
                },
                Message {
                    role: "user",
                    content: "text",
                },
            ],
            temperature: 0.2,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "text");
    }

    #[test]
    fn response_content_deserializes() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Fixed text."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Fixed text.");
    }
}
