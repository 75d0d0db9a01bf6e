//! Desktop input and capture backends.
//!
//! The executor only talks to [`InputDevice`]; concrete backends shell out to
//! platform tools (`cliclick` on macOS, `xdotool` on X11).

mod cliclick;
mod screenshot;
mod shell;
mod xdotool;

#[cfg(test)]
pub(crate) mod recording;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

pub use cliclick::CliclickDevice;
pub use screenshot::{compress_screenshot, Screenshot, ScreenshotError, DEFAULT_JPEG_QUALITY};
pub use shell::{CommandOutput, CommandRunner, DEFAULT_COMMAND_TIMEOUT_SECS};
pub use xdotool::XdotoolDevice;

/// Errors raised while driving an input backend.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command {command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },
    #[error("unexpected output from {program}: {output}")]
    Parse { program: String, output: String },
    #[error("command {command} failed: {detail}")]
    CommandFailed { command: String, detail: String },
    #[error("screenshot file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mouse button for a single click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Direction of a key-press scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Capability interface over the local desktop.
///
/// Every input operation returns the captured output of the underlying
/// command so callers can report it back verbatim.
#[async_trait]
pub trait InputDevice: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Move the pointer to an absolute device position.
    async fn move_pointer(&self, x: i32, y: i32) -> Result<CommandOutput, DeviceError>;

    /// Press the left button at the current position, move to `(x, y)`, release.
    async fn drag_to(&self, x: i32, y: i32) -> Result<CommandOutput, DeviceError>;

    /// Click at the current pointer position.
    async fn click(&self, button: MouseButton) -> Result<CommandOutput, DeviceError>;

    async fn double_click(&self) -> Result<CommandOutput, DeviceError>;

    async fn key_down(&self, key: &str) -> Result<CommandOutput, DeviceError>;

    async fn key_up(&self, key: &str) -> Result<CommandOutput, DeviceError>;

    async fn key_press(&self, key: &str) -> Result<CommandOutput, DeviceError>;

    /// Type literal text. Callers keep each call short.
    async fn type_text(&self, text: &str) -> Result<CommandOutput, DeviceError>;

    /// Emit `presses` directional key presses.
    async fn scroll(
        &self,
        direction: ScrollDirection,
        presses: u32,
    ) -> Result<CommandOutput, DeviceError>;

    /// Current pointer position in device pixels.
    async fn cursor_position(&self) -> Result<(i32, i32), DeviceError>;

    /// Capture the full screen as PNG bytes.
    async fn capture_screenshot(&self) -> Result<Vec<u8>, DeviceError>;
}

/// Available input backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputBackend {
    Cliclick,
    Xdotool,
}

impl InputBackend {
    /// Backend matching the build target.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Cliclick
        } else {
            Self::Xdotool
        }
    }

    /// Create the device for this backend.
    pub fn create(self, runner: CommandRunner) -> Box<dyn InputDevice> {
        match self {
            Self::Cliclick => Box::new(CliclickDevice::new(runner)),
            Self::Xdotool => Box::new(XdotoolDevice::new(runner)),
        }
    }
}

impl FromStr for InputBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cliclick" | "macos" | "mac" => Ok(Self::Cliclick),
            "xdotool" | "x11" | "linux" => Ok(Self::Xdotool),
            other => Err(format!("unknown input backend: {}", other)),
        }
    }
}

impl fmt::Display for InputBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cliclick => write!(f, "cliclick"),
            Self::Xdotool => write!(f, "xdotool"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("cliclick".parse::<InputBackend>(), Ok(InputBackend::Cliclick));
        assert_eq!(" XDOTOOL ".parse::<InputBackend>(), Ok(InputBackend::Xdotool));
        assert!("wayland".parse::<InputBackend>().is_err());
    }

    #[test]
    fn test_backend_display_round_trips() {
        for backend in [InputBackend::Cliclick, InputBackend::Xdotool] {
            assert_eq!(backend.to_string().parse::<InputBackend>(), Ok(backend));
        }
    }
}
