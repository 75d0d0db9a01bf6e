//! Action executor: turns `computer` tool requests into device operations.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::sleep;

use super::request::{ActionError, ComputerAction};
use crate::conversation::{ContentItem, ImageSource, ResultContent};
use crate::desktop::{
    compress_screenshot, CommandOutput, DeviceError, InputDevice, MouseButton, Screenshot,
    ScrollDirection, DEFAULT_JPEG_QUALITY,
};

/// Default scale factor applied to model coordinates before they reach the device.
pub const DEFAULT_COORDINATE_SCALE: f64 = 1.25;

/// Default pause after a left click so the UI can settle before capture.
pub const DEFAULT_CLICK_SETTLE_MS: u64 = 2000;

/// Characters sent per `type` command.
pub const TYPE_CHUNK_CHARS: usize = 50;

/// Pixels of scroll approximated by one arrow-key press.
pub const SCROLL_STEP_PX: u64 = 25;

/// Upper bound on arrow-key presses for one scroll.
pub const MAX_SCROLL_PRESSES: u32 = 200;

/// Configuration for the [`ActionHandler`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Model coordinate * scale = device coordinate.
    pub coordinate_scale: f64,
    /// JPEG quality for attached screenshots.
    pub jpeg_quality: u8,
    /// Wait after a left click before the screenshot.
    pub click_settle: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            coordinate_scale: DEFAULT_COORDINATE_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            click_settle: Duration::from_millis(DEFAULT_CLICK_SETTLE_MS),
        }
    }
}

impl ExecutorConfig {
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.coordinate_scale = scale;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_click_settle(mut self, settle: Duration) -> Self {
        self.click_settle = settle;
        self
    }
}

/// Output and errors accumulated while running one action.
#[derive(Debug, Default)]
struct Outcome {
    output: String,
    errors: String,
    screenshot: Option<Screenshot>,
}

impl Outcome {
    fn error(&mut self, message: impl AsRef<str>) {
        self.errors.push_str(message.as_ref());
        self.errors.push('\n');
    }

    fn note(&mut self, message: impl AsRef<str>) {
        self.output.push_str(message.as_ref());
        self.output.push('\n');
    }

    /// Fold a command result into the outcome, one line per command stream.
    fn record(&mut self, result: Result<CommandOutput, DeviceError>) {
        match result {
            Ok(out) => {
                let stdout = out.stdout.trim_end();
                if !stdout.is_empty() {
                    self.note(stdout);
                }
                let stderr = out.stderr.trim_end();
                if !stderr.is_empty() {
                    self.error(stderr);
                }
                if !out.success() && out.stderr.trim().is_empty() {
                    self.error(format!("[error] command exited with status {}", out.status));
                }
            }
            Err(e) => self.error(format!("[error] {}", e)),
        }
    }

    fn into_result(self, request_id: &str) -> ContentItem {
        let text = format!("RESULT: {}\n{}\n", self.output, self.errors)
            .trim()
            .to_string();
        let mut body = vec![ResultContent::Text { text }];
        if let Some(shot) = self.screenshot {
            body.push(ResultContent::Image {
                source: ImageSource::jpeg(shot.base64_data),
            });
        }
        ContentItem::ActionResult {
            request_id: request_id.to_string(),
            body,
            is_error: !self.errors.trim().is_empty(),
        }
    }
}

/// Executes desktop actions against an [`InputDevice`].
///
/// Never fails: every problem is reported inside the returned result with
/// `is_error` set.
pub struct ActionHandler {
    device: Box<dyn InputDevice>,
    config: ExecutorConfig,
}

impl ActionHandler {
    pub fn new(device: Box<dyn InputDevice>, config: ExecutorConfig) -> Self {
        Self { device, config }
    }

    /// Execute one `computer` tool request and build its result item.
    pub async fn execute(&self, parameters: &Map<String, Value>, request_id: &str) -> ContentItem {
        let action = match ComputerAction::from_params(parameters) {
            Ok(action) => action,
            Err(ActionError::UnknownAction(name)) => {
                tracing::warn!("Unrecognized action requested: {}", name);
                return ContentItem::ActionResult {
                    request_id: request_id.to_string(),
                    body: vec![ResultContent::Text {
                        text: ActionError::UnknownAction(name).to_string(),
                    }],
                    is_error: true,
                };
            }
            Err(e) => {
                tracing::warn!("Rejected action parameters: {}", e);
                let mut outcome = Outcome::default();
                outcome.error(e.to_string());
                return outcome.into_result(request_id);
            }
        };

        tracing::info!("Executing {} via {}", action.name(), self.device.name());

        let mut outcome = Outcome::default();
        self.perform(&action, &mut outcome).await;
        if action.captures_screenshot() {
            self.capture(&mut outcome).await;
        }
        outcome.into_result(request_id)
    }

    async fn perform(&self, action: &ComputerAction, outcome: &mut Outcome) {
        match action {
            ComputerAction::MouseMove { x, y } => {
                let (x, y) = self.to_device(*x, *y);
                outcome.record(self.device.move_pointer(x, y).await);
            }
            ComputerAction::LeftClickDrag { x, y } => {
                let (x, y) = self.to_device(*x, *y);
                outcome.record(self.device.drag_to(x, y).await);
            }
            ComputerAction::LeftClick => {
                outcome.record(self.device.click(MouseButton::Left).await);
                sleep(self.config.click_settle).await;
            }
            ComputerAction::RightClick => {
                outcome.record(self.device.click(MouseButton::Right).await);
            }
            ComputerAction::MiddleClick => {
                outcome.record(self.device.click(MouseButton::Middle).await);
            }
            ComputerAction::DoubleClick => {
                outcome.record(self.device.double_click().await);
            }
            ComputerAction::Key { keys } => self.press_keys(keys, outcome).await,
            ComputerAction::Type { text } => {
                let chars: Vec<char> = text.chars().collect();
                for chunk in chars.chunks(TYPE_CHUNK_CHARS) {
                    let chunk: String = chunk.iter().collect();
                    outcome.record(self.device.type_text(&chunk).await);
                }
            }
            ComputerAction::Scroll { pixels } => {
                let steps = pixels.unsigned_abs() / SCROLL_STEP_PX;
                if steps == 0 {
                    outcome.note("scroll amount is below one step, nothing scrolled");
                    return;
                }
                let presses = if steps > u64::from(MAX_SCROLL_PRESSES) {
                    tracing::warn!("Scroll of {} px capped at {} presses", pixels, MAX_SCROLL_PRESSES);
                    outcome.note(format!(
                        "scroll capped at {} presses ({} px)",
                        MAX_SCROLL_PRESSES,
                        u64::from(MAX_SCROLL_PRESSES) * SCROLL_STEP_PX
                    ));
                    MAX_SCROLL_PRESSES
                } else {
                    steps as u32
                };
                let direction = if *pixels > 0 {
                    ScrollDirection::Down
                } else {
                    ScrollDirection::Up
                };
                outcome.record(self.device.scroll(direction, presses).await);
            }
            ComputerAction::CursorPosition => match self.device.cursor_position().await {
                Ok((x, y)) => {
                    let (x, y) = self.to_model(x, y);
                    outcome.note(format!("{},{}", x, y));
                }
                Err(e) => outcome.error(format!("[error] {}", e)),
            },
            ComputerAction::Screenshot => {}
        }
    }

    /// Single keys are pressed; chords hold every key but the last, press
    /// the last, then release in reverse order.
    async fn press_keys(&self, keys: &[String], outcome: &mut Outcome) {
        let Some((last, held)) = keys.split_last() else {
            return;
        };

        for key in held {
            outcome.record(self.device.key_down(key).await);
        }
        outcome.record(self.device.key_press(last).await);
        for key in held.iter().rev() {
            outcome.record(self.device.key_up(key).await);
        }
    }

    async fn capture(&self, outcome: &mut Outcome) {
        let raw = match self.device.capture_screenshot().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Screenshot capture failed: {}", e);
                outcome.error(format!("[error] screenshot failed: {}", e));
                return;
            }
        };

        match compress_screenshot(&raw, self.config.jpeg_quality) {
            Ok(shot) => {
                tracing::debug!(
                    "Captured {}x{} screenshot ({} base64 bytes)",
                    shot.width,
                    shot.height,
                    shot.base64_data.len()
                );
                outcome.screenshot = Some(shot);
            }
            Err(e) => {
                tracing::error!("Screenshot compression failed: {}", e);
                outcome.error(format!("[error] screenshot failed: {}", e));
            }
        }
    }

    fn scale(&self) -> f64 {
        if self.config.coordinate_scale > 0.0 {
            self.config.coordinate_scale
        } else {
            1.0
        }
    }

    fn to_device(&self, x: f64, y: f64) -> (i32, i32) {
        let scale = self.scale();
        ((x * scale).round() as i32, (y * scale).round() as i32)
    }

    fn to_model(&self, x: i32, y: i32) -> (i32, i32) {
        let scale = self.scale();
        (
            (x as f64 / scale).round() as i32,
            (y as f64 / scale).round() as i32,
        )
    }
}
