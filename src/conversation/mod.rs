//! Conversation history: data model, store and image trimming.

mod store;
mod trim;
mod types;

pub use store::{ConversationStore, DEFAULT_SEED_MESSAGE};
pub use trim::{image_positions, trim_conversation, DEFAULT_KEEP_IMAGES};
pub use types::{ContentItem, ImageSource, ResultContent, Role, Turn, JPEG_MEDIA_TYPE};
