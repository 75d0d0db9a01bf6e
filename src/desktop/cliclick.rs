//! macOS backend built on `cliclick` and `screencapture`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::screenshot::{capture_into, scratch_path};
use super::shell::{CommandOutput, CommandRunner};
use super::{DeviceError, InputDevice, MouseButton, ScrollDirection};

const CLICLICK: &str = "cliclick";

/// Delay between scroll key presses, in milliseconds.
const SCROLL_PRESS_WAIT_MS: u32 = 50;

/// Aliases the model commonly uses, mapped to cliclick key names.
static KEY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("return", "return");
    m.insert("enter", "enter");
    m.insert("escape", "esc");
    m.insert("esc", "esc");
    m.insert("backspace", "delete");
    m.insert("delete", "fwd-delete");
    m.insert("tab", "tab");
    m.insert("space", "space");

    m.insert("up", "arrow-up");
    m.insert("down", "arrow-down");
    m.insert("left", "arrow-left");
    m.insert("right", "arrow-right");
    m.insert("page_up", "page-up");
    m.insert("pageup", "page-up");
    m.insert("page_down", "page-down");
    m.insert("pagedown", "page-down");

    m.insert("cmd", "cmd");
    m.insert("command", "cmd");
    m.insert("super", "cmd");
    m.insert("meta", "cmd");
    m.insert("ctrl", "ctrl");
    m.insert("control", "ctrl");
    m.insert("alt", "alt");
    m.insert("option", "alt");
    m.insert("shift", "shift");

    m
});

/// Keys cliclick accepts for `kp:`.
static PRESSABLE_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut s: HashSet<&'static str> = [
        "arrow-down",
        "arrow-left",
        "arrow-right",
        "arrow-up",
        "brightness-down",
        "brightness-up",
        "delete",
        "end",
        "enter",
        "esc",
        "fwd-delete",
        "home",
        "mute",
        "page-down",
        "page-up",
        "play-next",
        "play-pause",
        "play-previous",
        "return",
        "space",
        "tab",
        "volume-down",
        "volume-up",
    ]
    .into_iter()
    .collect();
    for f in [
        "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12", "f13", "f14",
        "f15", "f16",
    ] {
        s.insert(f);
    }
    s
});

static POSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+)(?:\.\d+)?\s*,\s*(-?\d+)").expect("valid regex"));

/// Map a key name to its cliclick token, passing unknown names through.
fn map_key(key: &str) -> String {
    KEY_ALIASES
        .get(key)
        .map(|k| k.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Parse `cliclick p` output such as `812,440`.
fn parse_position(output: &str) -> Option<(i32, i32)> {
    let caps = POSITION_RE.captures(output)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Drives the desktop through the `cliclick` CLI.
pub struct CliclickDevice {
    runner: CommandRunner,
}

impl CliclickDevice {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    async fn cliclick<S: AsRef<str>>(&self, args: &[S]) -> Result<CommandOutput, DeviceError> {
        self.runner.run(CLICLICK, args).await
    }
}

#[async_trait]
impl InputDevice for CliclickDevice {
    fn name(&self) -> &'static str {
        CLICLICK
    }

    async fn move_pointer(&self, x: i32, y: i32) -> Result<CommandOutput, DeviceError> {
        self.cliclick(&[format!("m:{},{}", x, y)]).await
    }

    async fn drag_to(&self, x: i32, y: i32) -> Result<CommandOutput, DeviceError> {
        self.cliclick(&[
            "dd:.".to_string(),
            format!("m:{},{}", x, y),
            format!("du:{},{}", x, y),
        ])
        .await
    }

    async fn click(&self, button: MouseButton) -> Result<CommandOutput, DeviceError> {
        let command = match button {
            MouseButton::Left => "c:.",
            MouseButton::Right => "rc:.",
            MouseButton::Middle => {
                // cliclick has no middle button command.
                tracing::warn!("cliclick cannot middle-click, sending a left click");
                "c:."
            }
        };
        self.cliclick(&[command]).await
    }

    async fn double_click(&self) -> Result<CommandOutput, DeviceError> {
        self.cliclick(&["dc:."]).await
    }

    async fn key_down(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        self.cliclick(&[format!("kd:{}", map_key(key))]).await
    }

    async fn key_up(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        self.cliclick(&[format!("ku:{}", map_key(key))]).await
    }

    async fn key_press(&self, key: &str) -> Result<CommandOutput, DeviceError> {
        let mapped = map_key(key);
        let command = if PRESSABLE_KEYS.contains(mapped.as_str()) || mapped.chars().count() != 1 {
            format!("kp:{}", mapped)
        } else {
            // Plain characters are typed rather than pressed.
            format!("t:{}", mapped)
        };
        self.cliclick(&[command]).await
    }

    async fn type_text(&self, text: &str) -> Result<CommandOutput, DeviceError> {
        self.cliclick(&[format!("t:{}", text)]).await
    }

    async fn scroll(
        &self,
        direction: ScrollDirection,
        presses: u32,
    ) -> Result<CommandOutput, DeviceError> {
        let key = match direction {
            ScrollDirection::Down => "arrow-down",
            ScrollDirection::Up => "arrow-up",
        };
        let args: Vec<String> = (0..presses)
            .flat_map(|_| [format!("kp:{}", key), format!("w:{}", SCROLL_PRESS_WAIT_MS)])
            .collect();
        self.cliclick(&args).await
    }

    async fn cursor_position(&self) -> Result<(i32, i32), DeviceError> {
        let output = self.cliclick(&["p"]).await?;
        if !output.success() {
            return Err(DeviceError::CommandFailed {
                command: format!("{} p", CLICLICK),
                detail: format!("{}{}", output.stderr, output.stdout).trim().to_string(),
            });
        }
        parse_position(&output.stdout).ok_or_else(|| DeviceError::Parse {
            program: CLICLICK.to_string(),
            output: output.stdout.trim().to_string(),
        })
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>, DeviceError> {
        let path = scratch_path()?;
        capture_into(&self.runner, "screencapture", &["-x"], &path).await
    }
}
