//! Persisted settings for the desktop agent CLI.
//! Stored in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::actions::{DEFAULT_CLICK_SETTLE_MS, DEFAULT_COORDINATE_SCALE};
use crate::conversation::DEFAULT_KEEP_IMAGES;
use crate::desktop::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_JPEG_QUALITY};
use crate::model::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_NAME};

/// Default display width reported to the model.
pub const DEFAULT_DISPLAY_WIDTH: u32 = 3456;

/// Default display height reported to the model.
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 2234;

const SETTINGS_FILE: &str = "settings.json";

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Model API key, used when `ANTHROPIC_API_KEY` is unset
    pub api_key: String,
    /// Model API base URL
    pub base_url: String,
    /// Model name
    pub model_name: String,
    /// Output token cap per model response
    pub max_output_tokens: u32,
    /// Display width in model pixels
    pub display_width: u32,
    /// Display height in model pixels
    pub display_height: u32,
    /// Model-to-device coordinate scale
    pub coordinate_scale: f64,
    /// Number of image-bearing items kept in history
    pub keep_images: usize,
    /// JPEG quality for screenshots (1-100)
    pub jpeg_quality: u8,
    /// Per-command timeout in seconds
    pub action_timeout_secs: u64,
    /// Pause after a left click in milliseconds
    pub click_settle_ms: u64,
    /// Input backend name; empty picks the platform default
    pub input_backend: String,
    /// Maximum model calls per task; 0 means unlimited
    pub max_steps: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            max_output_tokens: DEFAULT_MAX_TOKENS,
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            coordinate_scale: DEFAULT_COORDINATE_SCALE,
            keep_images: DEFAULT_KEEP_IMAGES,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            action_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            click_settle_ms: DEFAULT_CLICK_SETTLE_MS,
            input_backend: String::new(),
            max_steps: 0,
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "desktop-agent", "desktop-agent")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(SETTINGS_FILE))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) if path.is_file() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file {}: {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse settings file {}: {}", path.display(), e))
    }

    /// Save settings to the config file and return its path.
    pub fn save(&self) -> Result<PathBuf, String> {
        let dir = Self::config_dir().ok_or("Cannot determine config directory")?;
        let path = dir.join(SETTINGS_FILE);
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.display_width, 3456);
        assert_eq!(settings.display_height, 2234);
        assert_eq!(settings.coordinate_scale, 1.25);
        assert_eq!(settings.keep_images, 5);
        assert_eq!(settings.jpeg_quality, 50);
        assert_eq!(settings.max_steps, 0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"api_key": "sk-test", "keep_images": 2, "legacy": true}"#)
                .unwrap();
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.keep_images, 2);
        assert_eq!(settings.model_name, DEFAULT_MODEL_NAME);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("desktop-agent-test-{}", uuid::Uuid::new_v4().simple()))
            .join("settings.json");
        let settings = AppSettings {
            model_name: "custom-model".to_string(),
            max_steps: 30,
            ..AppSettings::default()
        };

        settings.save_to(&path).unwrap();
        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_invalid_json() {
        let path = std::env::temp_dir().join(format!(
            "desktop-agent-bad-{}.json",
            uuid::Uuid::new_v4().simple()
        ));
        fs::write(&path, "{not json").unwrap();
        let err = AppSettings::load_from(&path).unwrap_err();
        assert!(err.contains("Failed to parse settings file"));
        let _ = fs::remove_file(&path);
    }
}
