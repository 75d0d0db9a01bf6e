//! Model client for the Anthropic Messages API with the computer-use beta.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::service::{ModelError, ModelRequest, ModelResponse, ModelService};
use crate::conversation::ContentItem;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default model name.
pub const DEFAULT_MODEL_NAME: &str = "claude-3-5-sonnet-20241022";

/// Default output token cap per response.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BETAS: [&str; 2] = ["computer-use-2024-10-22", "prompt-caching-2024-07-31"];

/// Configuration for the model client.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    pub anthropic_version: String,
    pub betas: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            anthropic_version: ANTHROPIC_VERSION.to_string(),
            betas: DEFAULT_BETAS.iter().map(|b| b.to_string()).collect(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ModelConfig {
    /// Create a new ModelConfig with custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a new ModelConfig with custom API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Create a new ModelConfig with custom model name.
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

/// Messages API response structures.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Map<String, Value>,
    },
    #[serde(other)]
    Unsupported,
}

/// Client for the Anthropic Messages API.
pub struct ModelClient {
    config: ModelConfig,
    client: Client,
}

impl ModelClient {
    /// Create a new ModelClient with the given configuration.
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { config, client })
    }

    /// Build the JSON request body.
    ///
    /// The system prompt is sent as one cacheable text block.
    fn build_body(&self, request: &ModelRequest<'_>) -> Result<Value, ModelError> {
        let messages = serde_json::to_value(request.messages)
            .map_err(|e| ModelError::ParseError(format!("cannot encode messages: {}", e)))?;
        let tools = serde_json::to_value(request.tools)
            .map_err(|e| ModelError::ParseError(format!("cannot encode tools: {}", e)))?;

        Ok(json!({
            "model": self.config.model_name,
            "max_tokens": request.max_tokens,
            "system": [{
                "type": "text",
                "text": request.system_prompt,
                "cache_control": {"type": "ephemeral"}
            }],
            "tools": tools,
            "messages": messages,
        }))
    }

    /// Parse a response body into content items.
    fn parse_response(raw: &str) -> Result<ModelResponse, ModelError> {
        let parsed: MessagesResponse =
            serde_json::from_str(raw).map_err(|e| ModelError::ParseError(e.to_string()))?;

        let mut content = Vec::with_capacity(parsed.content.len());
        for block in parsed.content {
            match block {
                ResponseBlock::Text { text } => content.push(ContentItem::Text { text }),
                ResponseBlock::ToolUse { id, name, input } => {
                    content.push(ContentItem::ActionRequest {
                        id,
                        name,
                        parameters: input,
                    })
                }
                ResponseBlock::Unsupported => {
                    tracing::debug!("Skipping unsupported response block");
                }
            }
        }

        Ok(ModelResponse {
            content,
            stop_reason: parsed.stop_reason,
        })
    }

    /// Send a single request to the API.
    async fn send_request(&self, body: &Value) -> Result<ModelResponse, ModelError> {
        let response = self
            .client
            .post(self.config.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .header("anthropic-beta", self.config.betas.join(","))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ModelError::ApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        Self::parse_response(&text)
    }
}

#[async_trait]
impl ModelService for ModelClient {
    async fn respond(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ModelError::MissingApiKey);
        }

        let body = self.build_body(request)?;
        tracing::info!(
            "Requesting {} with {} messages",
            self.config.model_name,
            request.messages.len()
        );

        let response = self.send_request(&body).await?;
        tracing::info!(
            "Model returned {} blocks (stop reason: {})",
            response.content.len(),
            response.stop_reason.as_deref().unwrap_or("none")
        );
        Ok(response)
    }
}
