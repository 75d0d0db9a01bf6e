//! Append-only conversation history for a single session.

use super::trim::{image_positions, trim_conversation};
use super::types::{ContentItem, ResultContent, Turn};

/// Default text of the seeded operator turn.
pub const DEFAULT_SEED_MESSAGE: &str = "Follow the given instructions.";

/// Ordered turns of one session.
///
/// Turns are only ever appended; the trimmer builds a replacement store
/// instead of editing in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    /// Start a conversation with a single operator text turn.
    pub fn seeded(text: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::operator_text(text)],
        }
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of image-bearing items currently held.
    pub fn image_count(&self) -> usize {
        image_positions(&self.turns).len()
    }

    /// New store keeping only the last `keep_images` image-bearing items.
    pub fn trimmed(&self, keep_images: usize) -> Self {
        Self {
            turns: trim_conversation(&self.turns, keep_images),
        }
    }

    /// One line per content item, images elided.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for turn in &self.turns {
            for item in &turn.content {
                let line = match item {
                    ContentItem::Text { text } => format!("{:?}: {}", turn.role, text),
                    ContentItem::Image { .. } => format!("{:?}: image", turn.role),
                    ContentItem::ActionRequest {
                        id,
                        name,
                        parameters,
                    } => format!(
                        "{:?}: {} [{}] {}",
                        turn.role,
                        name,
                        id,
                        serde_json::Value::Object(parameters.clone())
                    ),
                    ContentItem::ActionResult {
                        request_id,
                        body,
                        is_error,
                    } => {
                        let images = body.iter().filter(|c| c.is_image()).count();
                        let text: Vec<&str> = body
                            .iter()
                            .filter_map(|c| match c {
                                ResultContent::Text { text } => Some(text.as_str()),
                                ResultContent::Image { .. } => None,
                            })
                            .collect();
                        format!(
                            "{:?}: result [{}]{} {} (+{} image)",
                            turn.role,
                            request_id,
                            if *is_error { " error" } else { "" },
                            text.join(" "),
                            images
                        )
                    }
                };
                lines.push(line);
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::types::{ImageSource, Role};

    #[test]
    fn test_seeded_store() {
        let store = ConversationStore::seeded(DEFAULT_SEED_MESSAGE);
        assert_eq!(store.turns().len(), 1);
        assert_eq!(store.turns()[0].role, Role::Operator);
        assert_eq!(
            store.turns()[0].content,
            vec![ContentItem::text("Follow the given instructions.")]
        );
    }

    #[test]
    fn test_trimmed_leaves_original_untouched() {
        let mut store = ConversationStore::seeded("go");
        for i in 0..4 {
            store.push(Turn::operator(vec![ContentItem::Image {
                source: ImageSource::jpeg(format!("img{}", i)),
            }]));
        }
        assert_eq!(store.image_count(), 4);

        let trimmed = store.trimmed(2);
        assert_eq!(trimmed.image_count(), 2);
        assert_eq!(trimmed.turns().len(), 3);
        assert_eq!(store.image_count(), 4);
    }

    #[test]
    fn test_summary_elides_images() {
        let mut store = ConversationStore::seeded("hello");
        store.push(Turn::operator(vec![ContentItem::Image {
            source: ImageSource::jpeg("AAAA"),
        }]));

        let summary = store.summary();
        assert!(summary.contains("Operator: hello"));
        assert!(summary.contains("Operator: image"));
        assert!(!summary.contains("AAAA"));
    }
}
