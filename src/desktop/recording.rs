//! Recording input device used by unit tests.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use super::shell::CommandOutput;
use super::{DeviceError, InputDevice, MouseButton, ScrollDirection};

/// One call observed by [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Move(i32, i32),
    Drag(i32, i32),
    Click(MouseButton),
    DoubleClick,
    KeyDown(String),
    KeyUp(String),
    KeyPress(String),
    Type(String),
    Scroll(ScrollDirection, u32),
    CursorPosition,
    Screenshot,
}

/// Small RGBA PNG, the same shape a real capture would have.
pub fn sample_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(32, 20, |x, y| Rgba([x as u8 * 8, y as u8 * 12, 90, 255]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode sample png");
    buffer.into_inner()
}

/// Records every call instead of touching the desktop.
#[derive(Clone)]
pub struct RecordingDevice {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
    cursor: (i32, i32),
    fail_capture: bool,
    fail_commands: bool,
    stderr: String,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            cursor: (100, 200),
            fail_capture: false,
            fail_commands: false,
            stderr: String::new(),
        }
    }
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(mut self, x: i32, y: i32) -> Self {
        self.cursor = (x, y);
        self
    }

    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    /// Every input command and cursor query times out.
    pub fn failing_commands(mut self) -> Self {
        self.fail_commands = true;
        self
    }

    /// Every input command reports this on stderr.
    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn timeout(&self) -> DeviceError {
        DeviceError::Timeout {
            command: "recorded-command".to_string(),
            secs: 120,
        }
    }

    fn record(&self, call: DeviceCall) -> Result<CommandOutput, DeviceError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_commands {
            return Err(self.timeout());
        }
        Ok(CommandOutput {
            status: if self.stderr.is_empty() { 0 } else { 1 },
            stdout: String::new(),
            stderr: self.stderr.clone(),
        })
    }
}

#[async_trait]
impl InputDevice for RecordingDevice {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn move_pointer(&self, x: i32, y: i32) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::Move(x, y))
    }

    async fn drag_to(&self, x: i32, y: i32) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::Drag(x, y))
    }

    async fn click(&self, button: MouseButton) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::Click(button))
    }

    async fn double_click(&self) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::DoubleClick)
    }

    async fn key_down(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::KeyDown(key.to_string()))
    }

    async fn key_up(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::KeyUp(key.to_string()))
    }

    async fn key_press(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::KeyPress(key.to_string()))
    }

    async fn type_text(&self, text: &str) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::Type(text.to_string()))
    }

    async fn scroll(
        &self,
        direction: ScrollDirection,
        presses: u32,
    ) -> Result<CommandOutput, DeviceError> {
        self.record(DeviceCall::Scroll(direction, presses))
    }

    async fn cursor_position(&self) -> Result<(i32, i32), DeviceError> {
        self.calls.lock().unwrap().push(DeviceCall::CursorPosition);
        if self.fail_commands {
            return Err(self.timeout());
        }
        Ok(self.cursor)
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>, DeviceError> {
        self.calls.lock().unwrap().push(DeviceCall::Screenshot);
        if self.fail_capture {
            return Err(DeviceError::CommandFailed {
                command: "screencapture".to_string(),
                detail: "display asleep".to_string(),
            });
        }
        Ok(sample_png())
    }
}
