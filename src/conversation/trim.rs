//! History trimming.
//!
//! Screenshots dominate request size, so only the most recent image-bearing
//! items are replayed to the model. Text and action requests are never
//! dropped.

use std::collections::HashSet;

use super::types::{ContentItem, ResultContent, Turn};

/// Default number of image-bearing items kept in history.
pub const DEFAULT_KEEP_IMAGES: usize = 5;

/// (turn index, item index) of an image-bearing item.
type Position = (usize, usize);

/// Positions of every image-bearing item, in scan order.
///
/// An action result counts once no matter how many images its body holds.
pub fn image_positions(turns: &[Turn]) -> Vec<Position> {
    turns
        .iter()
        .enumerate()
        .flat_map(|(turn_idx, turn)| {
            turn.content
                .iter()
                .enumerate()
                .filter(|(_, item)| item.carries_image())
                .map(move |(item_idx, _)| (turn_idx, item_idx))
        })
        .collect()
}

/// Return a copy of `turns` keeping only the last `keep_images` image-bearing
/// items.
///
/// Older action results lose their images and are dropped entirely if
/// nothing else remains in their body. Turns left without content are
/// omitted. The input is not modified.
pub fn trim_conversation(turns: &[Turn], keep_images: usize) -> Vec<Turn> {
    let positions = image_positions(turns);
    let keep: HashSet<Position> = positions
        .iter()
        .skip(positions.len().saturating_sub(keep_images))
        .copied()
        .collect();

    let mut trimmed = Vec::with_capacity(turns.len());

    for (turn_idx, turn) in turns.iter().enumerate() {
        let mut content = Vec::with_capacity(turn.content.len());

        for (item_idx, item) in turn.content.iter().enumerate() {
            let kept = keep.contains(&(turn_idx, item_idx));
            match item {
                ContentItem::Text { .. } | ContentItem::ActionRequest { .. } => {
                    content.push(item.clone());
                }
                ContentItem::Image { .. } => {
                    if kept {
                        content.push(item.clone());
                    }
                }
                ContentItem::ActionResult {
                    request_id,
                    body,
                    is_error,
                } => {
                    if kept {
                        content.push(item.clone());
                        continue;
                    }
                    let filtered: Vec<ResultContent> =
                        body.iter().filter(|c| !c.is_image()).cloned().collect();
                    if !filtered.is_empty() {
                        content.push(ContentItem::ActionResult {
                            request_id: request_id.clone(),
                            body: filtered,
                            is_error: *is_error,
                        });
                    }
                }
            }
        }

        if !content.is_empty() {
            trimmed.push(Turn {
                role: turn.role,
                content,
            });
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::types::{ImageSource, Role};
    use serde_json::Map;

    fn image(tag: &str) -> ContentItem {
        ContentItem::Image {
            source: ImageSource::jpeg(tag),
        }
    }

    fn request(id: &str) -> ContentItem {
        ContentItem::ActionRequest {
            id: id.to_string(),
            name: "computer".to_string(),
            parameters: Map::new(),
        }
    }

    fn shot_result(id: &str, tag: &str) -> ContentItem {
        ContentItem::ActionResult {
            request_id: id.to_string(),
            body: vec![
                ResultContent::Text {
                    text: format!("RESULT: {}", id),
                },
                ResultContent::Image {
                    source: ImageSource::jpeg(tag),
                },
            ],
            is_error: false,
        }
    }

    fn image_only_result(id: &str, tag: &str) -> ContentItem {
        ContentItem::ActionResult {
            request_id: id.to_string(),
            body: vec![ResultContent::Image {
                source: ImageSource::jpeg(tag),
            }],
            is_error: false,
        }
    }

    /// Every image payload tag still present, in order.
    fn image_tags(turns: &[Turn]) -> Vec<String> {
        let mut tags = Vec::new();
        for turn in turns {
            for item in &turn.content {
                match item {
                    ContentItem::Image {
                        source: ImageSource::Base64 { data, .. },
                    } => tags.push(data.clone()),
                    ContentItem::ActionResult { body, .. } => {
                        for entry in body {
                            if let ResultContent::Image {
                                source: ImageSource::Base64 { data, .. },
                            } = entry
                            {
                                tags.push(data.clone());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        tags
    }

    fn non_image_items(turns: &[Turn]) -> Vec<ContentItem> {
        turns
            .iter()
            .flat_map(|t| t.content.iter())
            .filter(|i| matches!(i, ContentItem::Text { .. } | ContentItem::ActionRequest { .. }))
            .cloned()
            .collect()
    }

    /// Seed + 3 request/result rounds + a top-level image turn + more rounds.
    fn sample_conversation() -> Vec<Turn> {
        vec![
            Turn::operator_text("Follow the given instructions."),
            Turn::model(vec![ContentItem::text("Looking"), request("a")]),
            Turn::operator(vec![shot_result("a", "img1")]),
            Turn::model(vec![request("b")]),
            Turn::operator(vec![image_only_result("b", "img2")]),
            Turn::model(vec![request("c"), request("d")]),
            Turn::operator(vec![shot_result("c", "img3"), shot_result("d", "img4")]),
            Turn::operator(vec![ContentItem::text("see this"), image("img5"), image("img6")]),
            Turn::model(vec![request("e")]),
            Turn::operator(vec![shot_result("e", "img7"), image("img8")]),
        ]
    }

    #[test]
    fn test_keeps_last_five_of_eight() {
        let turns = sample_conversation();
        assert_eq!(turns.len(), 10);
        assert_eq!(image_positions(&turns).len(), 8);

        let trimmed = trim_conversation(&turns, 5);
        assert_eq!(
            image_tags(&trimmed),
            vec!["img4", "img5", "img6", "img7", "img8"]
        );

        // The image-only result for "b" became empty and its turn vanished.
        assert_eq!(trimmed.len(), 9);
        assert!(trimmed.iter().all(|t| !t.content.is_empty()));
        let has_b_result = trimmed.iter().flat_map(|t| t.content.iter()).any(|i| {
            matches!(i, ContentItem::ActionResult { request_id, .. } if request_id == "b")
        });
        assert!(!has_b_result);

        // Result "a" kept its text but lost its image.
        match &trimmed[2].content[0] {
            ContentItem::ActionResult { request_id, body, .. } => {
                assert_eq!(request_id, "a");
                assert_eq!(body.len(), 1);
                assert!(!body[0].is_image());
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_retained_count_is_min_of_k_and_total() {
        let turns = sample_conversation();
        for k in 0..12 {
            let trimmed = trim_conversation(&turns, k);
            assert_eq!(image_positions(&trimmed).len(), k.min(8), "k = {}", k);
        }
    }

    #[test]
    fn test_zero_keeps_no_images() {
        let trimmed = trim_conversation(&sample_conversation(), 0);
        assert!(image_tags(&trimmed).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let turns = sample_conversation();
        for k in [0, 1, 3, 5, 8, 20] {
            let once = trim_conversation(&turns, k);
            let twice = trim_conversation(&once, k);
            assert_eq!(once, twice, "k = {}", k);
        }
    }

    #[test]
    fn test_preserves_text_and_requests_in_order() {
        let turns = sample_conversation();
        let before = non_image_items(&turns);
        for k in [0, 2, 5] {
            let after = non_image_items(&trim_conversation(&turns, k));
            assert_eq!(before, after, "k = {}", k);
        }
    }

    #[test]
    fn test_does_not_mutate_input() {
        let turns = sample_conversation();
        let copy = turns.clone();
        let _ = trim_conversation(&turns, 1);
        assert_eq!(turns, copy);
    }

    #[test]
    fn test_roles_survive() {
        let trimmed = trim_conversation(&sample_conversation(), 5);
        assert_eq!(trimmed[0].role, Role::Operator);
        assert_eq!(trimmed[1].role, Role::Model);
    }

    #[test]
    fn test_error_flag_kept_when_images_stripped() {
        let turns = vec![
            Turn::operator(vec![ContentItem::ActionResult {
                request_id: "x".to_string(),
                body: vec![
                    ResultContent::Text {
                        text: "RESULT: \n[error] boom".to_string(),
                    },
                    ResultContent::Image {
                        source: ImageSource::jpeg("old"),
                    },
                ],
                is_error: true,
            }]),
            Turn::operator(vec![image("new")]),
        ];

        let trimmed = trim_conversation(&turns, 1);
        match &trimmed[0].content[0] {
            ContentItem::ActionResult { is_error, body, .. } => {
                assert!(*is_error);
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }
}
