//! Anthropic - Claude Messages API adapter

use crate::error::{Error, Result};
use crate::generator::ResponseGenerator;
use crate::prompt::{build_system_prompt, build_turns};
use async_trait::async_trait;
use haven_store::ContextSnapshot;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Anthropic API version header value
const API_VERSION: &str = "2023-06-01";

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

/// Show only the tail of a key in Debug output
fn mask_api_key(key: &str) -> String {
    if key.len() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", &key[key.len() - 4..])
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Anthropic adapter configuration
#[derive(Clone)]
pub struct AnthropicConfig {
    /// API key
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Model id
    pub model: String,
    /// Max tokens per reply (SMS-sized)
    pub max_tokens: u32,
    /// Request timeout
    pub timeout: Duration,
}

// Custom Debug so the API key never lands in logs
impl fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AnthropicConfig {
    /// Create a configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 300,
            timeout: Duration::from_secs(30),
        }
    }

    /// Create from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if `ANTHROPIC_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| Error::NotConfigured("ANTHROPIC_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Override the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Claude-backed response generator
pub struct AnthropicGenerator {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicGenerator {
    /// Create a generator from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::NotConfigured(format!("http client: {}", e)))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ResponseGenerator for AnthropicGenerator {
    fn name(&self) -> &str {
        "anthropic"
    }

    #[instrument(skip(self, message, context), fields(model = %self.config.model))]
    async fn generate(&self, message: &str, context: &ContextSnapshot) -> Result<String> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system: build_system_prompt(context),
            messages: build_turns(message, context)
                .into_iter()
                .map(|turn| AnthropicMessage {
                    role: turn.role.as_str().to_string(),
                    content: turn.content,
                })
                .collect(),
            temperature: 0.7,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimit);
        }
        if !status.is_success() {
            let detail = response
                .json::<AnthropicErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("http status {}", status));
            warn!(status = %status, "generation request rejected");
            return Err(Error::Api(detail));
        }

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let text = body
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(Error::InvalidResponse("empty completion".to_string()));
        }

        debug!(chars = text.len(), "generation completed");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_masks_api_key() {
        let config = AnthropicConfig::new("sk-ant-supersecret1234");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("****1234"));
    }

    #[test]
    fn test_mask_short_key() {
        assert_eq!(mask_api_key("abc"), "****");
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = AnthropicRequest {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 300,
            system: "be kind".to_string(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_deserialization_ignores_unknown_blocks() {
        let json = r#"{"content":[{"type":"text","text":"hello"},{"type":"thinking"}]}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        let text: String = response
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.clone()),
                ContentBlock::Other => None,
            })
            .collect();
        assert_eq!(text, "hello");
    }
}
