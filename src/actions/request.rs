//! Parsing and validation of `computer` tool parameters.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced before any side effect is attempted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("[error] unrecognized action: {0}")]
    UnknownAction(String),
    #[error("[error] {0}")]
    Validation(String),
}

/// A validated desktop action.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputerAction {
    MouseMove { x: f64, y: f64 },
    LeftClickDrag { x: f64, y: f64 },
    LeftClick,
    RightClick,
    MiddleClick,
    DoubleClick,
    /// Lowercased key names; more than one means a chord.
    Key { keys: Vec<String> },
    Type { text: String },
    /// Pixel delta, positive scrolls down.
    Scroll { pixels: i64 },
    CursorPosition,
    Screenshot,
}

impl ComputerAction {
    /// Validate raw tool parameters.
    ///
    /// The action name comes from the `action` field; `coordinate` and `text`
    /// are checked only for the actions that need them.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ActionError> {
        let action = match params.get("action") {
            Some(Value::String(name)) => name.as_str(),
            Some(other) => {
                return Err(ActionError::Validation(format!(
                    "'action' must be a string, got {}",
                    other
                )))
            }
            None => return Err(ActionError::Validation("missing 'action' field".to_string())),
        };

        match action {
            "mouse_move" => {
                let (x, y) = coordinate(params, action)?;
                Ok(Self::MouseMove { x, y })
            }
            "left_click_drag" => {
                let (x, y) = coordinate(params, action)?;
                Ok(Self::LeftClickDrag { x, y })
            }
            "left_click" => Ok(Self::LeftClick),
            "right_click" => Ok(Self::RightClick),
            "middle_click" => Ok(Self::MiddleClick),
            "double_click" => Ok(Self::DoubleClick),
            "key" => {
                let text = text_param(params, action)?;
                Ok(Self::Key {
                    keys: parse_chord(text)?,
                })
            }
            "type" => Ok(Self::Type {
                text: text_param(params, action)?.to_string(),
            }),
            "scroll" => match params.get("text").and_then(Value::as_i64) {
                Some(pixels) => Ok(Self::Scroll { pixels }),
                None => Err(ActionError::Validation(
                    "'scroll' requires an integer pixel amount in 'text'".to_string(),
                )),
            },
            "cursor_position" => Ok(Self::CursorPosition),
            "screenshot" => Ok(Self::Screenshot),
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }

    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MouseMove { .. } => "mouse_move",
            Self::LeftClickDrag { .. } => "left_click_drag",
            Self::LeftClick => "left_click",
            Self::RightClick => "right_click",
            Self::MiddleClick => "middle_click",
            Self::DoubleClick => "double_click",
            Self::Key { .. } => "key",
            Self::Type { .. } => "type",
            Self::Scroll { .. } => "scroll",
            Self::CursorPosition => "cursor_position",
            Self::Screenshot => "screenshot",
        }
    }

    /// Whether a screenshot is attached after the action runs.
    pub fn captures_screenshot(&self) -> bool {
        !matches!(self, Self::Scroll { .. })
    }
}

fn coordinate(params: &Map<String, Value>, action: &str) -> Result<(f64, f64), ActionError> {
    let invalid = || {
        ActionError::Validation(format!(
            "'{}' requires a 2-element numeric 'coordinate' list",
            action
        ))
    };

    let values = params
        .get("coordinate")
        .and_then(Value::as_array)
        .ok_or_else(invalid)?;
    if values.len() != 2 {
        return Err(invalid());
    }

    let x = values[0].as_f64().filter(|v| v.is_finite()).ok_or_else(invalid)?;
    let y = values[1].as_f64().filter(|v| v.is_finite()).ok_or_else(invalid)?;
    Ok((x, y))
}

fn text_param<'a>(params: &'a Map<String, Value>, action: &str) -> Result<&'a str, ActionError> {
    params
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| ActionError::Validation(format!("'{}' must have 'text'", action)))
}

/// Split a `+`-joined key string into lowercased key names.
///
/// A lone `+` is the plus key itself.
pub fn parse_chord(text: &str) -> Result<Vec<String>, ActionError> {
    let trimmed = text.trim();
    if trimmed == "+" {
        return Ok(vec!["+".to_string()]);
    }

    let keys: Vec<String> = trimmed
        .split('+')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    if keys.is_empty() {
        return Err(ActionError::Validation(
            "'key' requires a non-empty key name".to_string(),
        ));
    }
    Ok(keys)
}
