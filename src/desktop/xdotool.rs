//! X11 backend built on `xdotool` and `scrot`.

use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::screenshot::{capture_into, scratch_path};
use super::shell::{CommandOutput, CommandRunner};
use super::{DeviceError, InputDevice, MouseButton, ScrollDirection};

const XDOTOOL: &str = "xdotool";

/// Aliases mapped to X keysym names.
static KEY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("return", "Return");
    m.insert("enter", "Return");
    m.insert("escape", "Escape");
    m.insert("esc", "Escape");
    m.insert("backspace", "BackSpace");
    m.insert("delete", "Delete");
    m.insert("fwd-delete", "Delete");
    m.insert("tab", "Tab");
    m.insert("space", "space");
    m.insert("home", "Home");
    m.insert("end", "End");

    m.insert("up", "Up");
    m.insert("arrow-up", "Up");
    m.insert("down", "Down");
    m.insert("arrow-down", "Down");
    m.insert("left", "Left");
    m.insert("arrow-left", "Left");
    m.insert("right", "Right");
    m.insert("arrow-right", "Right");
    m.insert("page_up", "Page_Up");
    m.insert("pageup", "Page_Up");
    m.insert("page-up", "Page_Up");
    m.insert("page_down", "Page_Down");
    m.insert("pagedown", "Page_Down");
    m.insert("page-down", "Page_Down");

    m.insert("cmd", "super");
    m.insert("command", "super");
    m.insert("super", "super");
    m.insert("meta", "super");
    m.insert("ctrl", "ctrl");
    m.insert("control", "ctrl");
    m.insert("alt", "alt");
    m.insert("option", "alt");
    m.insert("shift", "shift");

    m
});

static POSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"x:(-?\d+)\s+y:(-?\d+)").expect("valid regex"));

fn map_key(key: &str) -> String {
    KEY_ALIASES
        .get(key)
        .map(|k| k.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Parse `xdotool getmouselocation` output such as `x:812 y:440 screen:0 window:1`.
fn parse_position(output: &str) -> Option<(i32, i32)> {
    let caps = POSITION_RE.captures(output)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Drives an X11 desktop through `xdotool`.
pub struct XdotoolDevice {
    runner: CommandRunner,
}

impl XdotoolDevice {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    async fn xdotool<S: AsRef<str>>(&self, args: &[S]) -> Result<CommandOutput, DeviceError> {
        self.runner.run(XDOTOOL, args).await
    }
}

#[async_trait]
impl InputDevice for XdotoolDevice {
    fn name(&self) -> &'static str {
        XDOTOOL
    }

    async fn move_pointer(&self, x: i32, y: i32) -> Result<CommandOutput, DeviceError> {
        self.xdotool(&["mousemove".to_string(), x.to_string(), y.to_string()])
            .await
    }

    async fn drag_to(&self, x: i32, y: i32) -> Result<CommandOutput, DeviceError> {
        self.xdotool(&[
            "mousedown".to_string(),
            "1".to_string(),
            "mousemove".to_string(),
            x.to_string(),
            y.to_string(),
            "mouseup".to_string(),
            "1".to_string(),
        ])
        .await
    }

    async fn click(&self, button: MouseButton) -> Result<CommandOutput, DeviceError> {
        let code = match button {
            MouseButton::Left => "1",
            MouseButton::Middle => "2",
            MouseButton::Right => "3",
        };
        self.xdotool(&["click", code]).await
    }

    async fn double_click(&self) -> Result<CommandOutput, DeviceError> {
        self.xdotool(&["click", "--repeat", "2", "1"]).await
    }

    async fn key_down(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        self.xdotool(&["keydown".to_string(), map_key(key)]).await
    }

    async fn key_up(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        self.xdotool(&["keyup".to_string(), map_key(key)]).await
    }

    async fn key_press(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        self.xdotool(&["key".to_string(), map_key(key)]).await
    }

    async fn type_text(&self, text: &str) -> Result<CommandOutput, DeviceError> {
        self.xdotool(&["type", "--", text]).await
    }

    async fn scroll(
        &self,
        direction: ScrollDirection,
        presses: u32,
    ) -> Result<CommandOutput, DeviceError> {
        let key = match direction {
            ScrollDirection::Down => "Down",
            ScrollDirection::Up => "Up",
        };
        self.xdotool(&[
            "key".to_string(),
            "--repeat".to_string(),
            presses.to_string(),
            "--delay".to_string(),
            "50".to_string(),
            key.to_string(),
        ])
        .await
    }

    async fn cursor_position(&self) -> Result<(i32, i32), DeviceError> {
        let output = self.xdotool(&["getmouselocation"]).await?;
        if !output.success() {
            return Err(DeviceError::CommandFailed {
                command: format!("{} getmouselocation", XDOTOOL),
                detail: format!("{}{}", output.stderr, output.stdout).trim().to_string(),
            });
        }
        parse_position(&output.stdout).ok_or_else(|| DeviceError::Parse {
            program: XDOTOOL.to_string(),
            output: output.stdout.trim().to_string(),
        })
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>, DeviceError> {
        let path = scratch_path()?;
        capture_into(&self.runner, "scrot", &["-o"], &path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key_to_keysyms() {
        assert_eq!(map_key("cmd"), "super");
        assert_eq!(map_key("enter"), "Return");
        assert_eq!(map_key("page-down"), "Page_Down");
        assert_eq!(map_key("a"), "a");
        assert_eq!(map_key("XF86AudioMute"), "XF86AudioMute");
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(
            parse_position("x:812 y:440 screen:0 window:6291466\n"),
            Some((812, 440))
        );
        assert_eq!(parse_position("garbage"), None);
    }
}
