//! Conversation data model shared by the store, trimmer and model client.
//!
//! The serde representation matches the Messages API wire format, so turns
//! can be sent as-is without an intermediate JSON building step.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Media type attached to every compressed screenshot.
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// The local side: task instructions, operator replies and action results.
    #[serde(rename = "user")]
    Operator,
    /// The remote model.
    #[serde(rename = "assistant")]
    Model,
}

/// Encoded image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    Base64 { media_type: String, data: String },
}

impl ImageSource {
    /// Wrap base64 JPEG data.
    pub fn jpeg(data: impl Into<String>) -> Self {
        Self::Base64 {
            media_type: JPEG_MEDIA_TYPE.to_string(),
            data: data.into(),
        }
    }

    /// Media type of the payload (e.g. `image/jpeg`).
    pub fn format(&self) -> &str {
        match self {
            Self::Base64 { media_type, .. } => media_type,
        }
    }
}

/// Entry inside an action result body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultContent {
    Text { text: String },
    Image { source: ImageSource },
}

impl ResultContent {
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// One atomic piece of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    /// Emitted by the model only.
    #[serde(rename = "tool_use")]
    ActionRequest {
        id: String,
        name: String,
        #[serde(rename = "input", default)]
        parameters: Map<String, Value>,
    },
    /// Emitted by the operator only, correlated to an `ActionRequest` of the
    /// preceding model turn.
    #[serde(rename = "tool_result")]
    ActionResult {
        #[serde(rename = "tool_use_id")]
        request_id: String,
        #[serde(rename = "content", default)]
        body: Vec<ResultContent>,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentItem {
    /// Create a text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// True if this item is an image or an action result holding one.
    pub fn carries_image(&self) -> bool {
        match self {
            Self::Image { .. } => true,
            Self::ActionResult { body, .. } => body.iter().any(ResultContent::is_image),
            Self::Text { .. } | Self::ActionRequest { .. } => false,
        }
    }
}

/// One message-equivalent unit of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentItem>,
}

impl Turn {
    /// Operator turn holding a single text item.
    pub fn operator_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Operator,
            content: vec![ContentItem::text(text)],
        }
    }

    /// Operator turn carrying action results.
    pub fn operator(content: Vec<ContentItem>) -> Self {
        Self {
            role: Role::Operator,
            content,
        }
    }

    /// Model turn, stored verbatim.
    pub fn model(content: Vec<ContentItem>) -> Self {
        Self {
            role: Role::Model,
            content,
        }
    }
}
