//! Model client module for AI inference.

mod client;
mod service;

pub use client::{
    ModelClient, ModelConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_NAME,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use service::{
    ModelError, ModelRequest, ModelResponse, ModelService, ToolDeclaration, COMPUTER_TOOL_NAME,
    COMPUTER_TOOL_TYPE,
};
