//! OpenAI-compatible HTTP chat client

use crate::chat::{ChatClient, ChatError};
use crate::types::ChatMessage;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Connection settings for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    /// e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Hard bound on each call; expiry is treated like any transport failure
    pub timeout: Duration,
}

impl ChatConfig {
    /// Load settings from the environment. `OPENAI_API_KEY`, `OPENAI_BASE_URL`
    /// and `OPENAI_MODEL` are mandatory.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = require_env("OPENAI_API_KEY")?;
        let base_url = require_env("OPENAI_BASE_URL")?;
        let model = require_env("OPENAI_MODEL")?;

        let temperature = env_parse("TEMPERATURE", 0.1)?;
        let max_tokens = env_parse("MAX_TOKENS", 4000)?;
        let timeout_s: u64 = env_parse("CHAT_TIMEOUT_S", 600)?;

        Ok(Self {
            api_key,
            base_url,
            model,
            temperature,
            max_tokens,
            timeout: Duration::from_secs(timeout_s),
        })
    }
}

fn require_env(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name).unwrap_or_default();
    let value = value.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("missing {} in environment", name);
    }
    Ok(value)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

/// Response body of an OpenAI-compatible completion
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Chat client backed by an OpenAI-compatible HTTP endpoint
pub struct HttpChatClient {
    cfg: ChatConfig,
    client: reqwest::Client,
}

impl HttpChatClient {
    pub fn new(cfg: ChatConfig) -> Self {
        Self {
            cfg,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let url = format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        );

        let payload = json!({
            "model": self.cfg.model,
            "temperature": self.cfg.temperature,
            "max_tokens": self.cfg.max_tokens,
            "messages": messages,
        });

        debug!("Sending chat completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.cfg.api_key)
            .timeout(self.cfg.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else {
                    ChatError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Timeout
            } else {
                ChatError::MalformedResponse(e.to_string())
            }
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ChatError::MalformedResponse("completion contained no choices".to_string())
            })?;

        debug!("Received completion ({} chars)", content.len());

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a running OpenAI-compatible endpoint
    async fn test_http_chat_integration() {
        let cfg = ChatConfig {
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:8087/v1".to_string(),
            model: "test-model".to_string(),
            temperature: 0.1,
            max_tokens: 512,
            timeout: Duration::from_secs(30),
        };
        let client = HttpChatClient::new(cfg);
        let reply = client
            .complete(&[ChatMessage::user("ping")])
            .await;
        assert!(reply.is_ok());
    }
}
