//! Model service boundary used by the agent loop.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::conversation::{ContentItem, Turn};

/// Name of the single tool the agent declares.
pub const COMPUTER_TOOL_NAME: &str = "computer";

/// Tool type of the computer-use beta.
pub const COMPUTER_TOOL_TYPE: &str = "computer_20241022";

/// Model service errors.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("No API key configured; set ANTHROPIC_API_KEY or api_key in the settings file")]
    MissingApiKey,
}

/// A declared tool, serialized as the API expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub name: String,
    pub display_width_px: u32,
    pub display_height_px: u32,
    pub display_number: Option<u32>,
}

impl ToolDeclaration {
    /// The `computer` tool for a display of the given size.
    pub fn computer(width: u32, height: u32) -> Self {
        Self {
            tool_type: COMPUTER_TOOL_TYPE.to_string(),
            name: COMPUTER_TOOL_NAME.to_string(),
            display_width_px: width,
            display_height_px: height,
            display_number: None,
        }
    }
}

/// One request to the model.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system_prompt: &'a str,
    pub messages: &'a [Turn],
    pub tools: &'a [ToolDeclaration],
    pub max_tokens: u32,
}

/// Response content from the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    /// Text and action request items, in the order the model produced them.
    pub content: Vec<ContentItem>,
    pub stop_reason: Option<String>,
}

impl ModelResponse {
    pub fn new(content: Vec<ContentItem>) -> Self {
        Self {
            content,
            stop_reason: None,
        }
    }

    /// All text blocks in order.
    pub fn texts(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All action requests in order.
    pub fn action_requests(&self) -> Vec<&ContentItem> {
        self.content
            .iter()
            .filter(|item| matches!(item, ContentItem::ActionRequest { .. }))
            .collect()
    }
}

/// A remote model that turns a conversation into its next content items.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn respond(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, ModelError>;
}
