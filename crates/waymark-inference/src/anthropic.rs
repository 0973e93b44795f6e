//! Anthropic streaming chat backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use waymark_core::{ChatTurn, Error, Result};

use crate::streaming::{parse_sse_stream, StreamingChat, TokenStream};

/// Default Anthropic API endpoint.
pub const DEFAULT_ANTHROPIC_URL: &str = waymark_core::defaults::ANTHROPIC_BASE_URL;

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = waymark_core::defaults::CHAT_MODEL;

/// Default maximum tokens per streamed response.
pub const DEFAULT_MAX_TOKENS: u32 = waymark_core::defaults::CHAT_MAX_TOKENS;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = waymark_core::defaults::CHAT_TIMEOUT_SECS;

/// Configuration for the Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key sent in the `x-api-key` header (optional for proxies).
    pub api_key: Option<String>,
    /// Model to use for chat generation.
    pub model: String,
    /// Maximum tokens per response.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ANTHROPIC_URL.to_string(),
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Request body for the messages endpoint.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ApiMessage>,
    pub stream: bool,
}

/// A single conversation turn on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

/// Error response from the Anthropic API.
#[derive(Debug, Deserialize)]
pub struct AnthropicErrorResponse {
    pub error: AnthropicError,
}

/// Detailed error information.
#[derive(Debug, Deserialize)]
pub struct AnthropicError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

// =============================================================================
// BACKEND
// =============================================================================

/// Streaming chat backend for the Anthropic messages API.
pub struct AnthropicBackend {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing Anthropic backend: url={}, model={}",
            config.base_url, config.model
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(AnthropicConfig::default())
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = AnthropicConfig {
            base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_URL.to_string()),
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            max_tokens: std::env::var("ANTHROPIC_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_seconds: std::env::var("ANTHROPIC_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Self::new(config)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    /// Build a request with authentication and version headers.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        req.header("anthropic-version", waymark_core::defaults::ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
    }
}

#[async_trait]
impl StreamingChat for AnthropicBackend {
    async fn stream_chat(&self, messages: &[ChatTurn]) -> Result<TokenStream> {
        debug!(
            "Streaming chat with model {}, transcript turns: {}",
            self.config.model,
            messages.len()
        );

        let request = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: messages
                .iter()
                .map(|turn| ApiMessage {
                    role: turn.role.to_string(),
                    content: turn.content.clone(),
                })
                .collect(),
            stream: true,
        };

        let response = self
            .build_request("/v1/messages")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: AnthropicErrorResponse =
                response.json().await.unwrap_or(AnthropicErrorResponse {
                    error: AnthropicError {
                        error_type: "unknown".to_string(),
                        message: "Unknown error".to_string(),
                    },
                });
            return Err(Error::Inference(format!(
                "Anthropic returned {}: {}",
                status, body.error.message
            )));
        }

        Ok(parse_sse_stream(response.bytes_stream()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
