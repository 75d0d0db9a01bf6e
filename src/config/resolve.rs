//! Runtime configuration resolved from environment, settings file and defaults.

use std::time::Duration;

use thiserror::Error;

use crate::actions::ExecutorConfig;
use crate::agent::AgentConfig;
use crate::config::prompts::build_system_prompt;
use crate::desktop::{CommandRunner, InputBackend};
use crate::model::{ModelConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::settings::AppSettings;

/// Invalid configuration values.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Every option the agent needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    pub max_output_tokens: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub coordinate_scale: f64,
    pub keep_images: usize,
    pub jpeg_quality: u8,
    pub action_timeout: Duration,
    pub click_settle: Duration,
    pub input_backend: InputBackend,
    pub max_steps: Option<u32>,
}

impl RuntimeConfig {
    /// Resolve from the process environment.
    pub fn from_env(settings: &AppSettings) -> Result<Self, ConfigError> {
        Self::resolve(settings, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    ///
    /// An environment value wins over the settings file; blank values count
    /// as unset.
    pub fn resolve<F>(settings: &AppSettings, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let coordinate_scale: f64 = parsed(&lookup, "COORDINATE_SCALE", settings.coordinate_scale)?;
        if !coordinate_scale.is_finite() || coordinate_scale <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "COORDINATE_SCALE".to_string(),
                value: coordinate_scale.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }

        let jpeg_quality: u32 =
            parsed(&lookup, "SCREENSHOT_QUALITY", u32::from(settings.jpeg_quality))?;

        let backend_name = lookup("INPUT_BACKEND").unwrap_or_else(|| settings.input_backend.clone());
        let input_backend = if backend_name.trim().is_empty() {
            InputBackend::platform_default()
        } else {
            backend_name
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    key: "INPUT_BACKEND".to_string(),
                    value: backend_name.clone(),
                    reason,
                })?
        };

        let max_steps: u32 = parsed(&lookup, "AGENT_MAX_STEPS", settings.max_steps)?;

        Ok(Self {
            api_key: lookup("ANTHROPIC_API_KEY").unwrap_or_else(|| settings.api_key.clone()),
            base_url: lookup("ANTHROPIC_BASE_URL").unwrap_or_else(|| settings.base_url.clone()),
            model_name: lookup("MODEL_NAME").unwrap_or_else(|| settings.model_name.clone()),
            max_output_tokens: parsed(&lookup, "MAX_OUTPUT_TOKENS", settings.max_output_tokens)?,
            display_width: parsed(&lookup, "DISPLAY_WIDTH", settings.display_width)?,
            display_height: parsed(&lookup, "DISPLAY_HEIGHT", settings.display_height)?,
            coordinate_scale,
            keep_images: parsed(&lookup, "KEEP_IMAGES", settings.keep_images)?,
            jpeg_quality: jpeg_quality.clamp(1, 100) as u8,
            action_timeout: Duration::from_secs(parsed(
                &lookup,
                "ACTION_TIMEOUT_SECS",
                settings.action_timeout_secs,
            )?),
            click_settle: Duration::from_millis(parsed(
                &lookup,
                "CLICK_SETTLE_MS",
                settings.click_settle_ms,
            )?),
            input_backend,
            max_steps: (max_steps > 0).then_some(max_steps),
        })
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig::default()
            .with_base_url(&self.base_url)
            .with_api_key(&self.api_key)
            .with_model_name(&self.model_name)
            .with_request_timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::default()
            .with_scale(self.coordinate_scale)
            .with_jpeg_quality(self.jpeg_quality)
            .with_click_settle(self.click_settle)
    }

    pub fn command_runner(&self) -> CommandRunner {
        CommandRunner::new(self.action_timeout)
    }

    /// Session configuration for one task.
    pub fn agent_config(&self, instructions: &str) -> AgentConfig {
        AgentConfig::default()
            .with_system_prompt(build_system_prompt(
                instructions,
                self.display_width,
                self.display_height,
            ))
            .with_keep_images(self.keep_images)
            .with_max_output_tokens(self.max_output_tokens)
            .with_display(self.display_width, self.display_height)
            .with_max_steps(self.max_steps.unwrap_or(0))
    }
}

fn parsed<T, L>(lookup: &L, key: &str, fallback: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::resolve(&AppSettings::default(), env(&[])).unwrap();
        assert_eq!(config.model_name, "claude-3-5-sonnet-20241022");
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.display_width, 3456);
        assert_eq!(config.display_height, 2234);
        assert_eq!(config.coordinate_scale, 1.25);
        assert_eq!(config.keep_images, 5);
        assert_eq!(config.jpeg_quality, 50);
        assert_eq!(config.action_timeout, Duration::from_secs(120));
        assert_eq!(config.click_settle, Duration::from_millis(2000));
        assert_eq!(config.input_backend, InputBackend::platform_default());
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn test_env_overrides_settings() {
        let settings = AppSettings {
            api_key: "from-file".to_string(),
            keep_images: 3,
            input_backend: "cliclick".to_string(),
            ..AppSettings::default()
        };
        let config = RuntimeConfig::resolve(
            &settings,
            env(&[
                ("ANTHROPIC_API_KEY", "from-env"),
                ("KEEP_IMAGES", "7"),
                ("INPUT_BACKEND", "xdotool"),
                ("AGENT_MAX_STEPS", "40"),
                ("COORDINATE_SCALE", "2.0"),
            ]),
        )
        .unwrap();

        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.keep_images, 7);
        assert_eq!(config.input_backend, InputBackend::Xdotool);
        assert_eq!(config.max_steps, Some(40));
        assert_eq!(config.coordinate_scale, 2.0);
    }

    #[test]
    fn test_settings_used_when_env_blank() {
        let settings = AppSettings {
            api_key: "from-file".to_string(),
            ..AppSettings::default()
        };
        let config =
            RuntimeConfig::resolve(&settings, env(&[("ANTHROPIC_API_KEY", "  ")])).unwrap();
        assert_eq!(config.api_key, "from-file");
    }

    #[test]
    fn test_quality_is_clamped() {
        let high =
            RuntimeConfig::resolve(&AppSettings::default(), env(&[("SCREENSHOT_QUALITY", "400")]))
                .unwrap();
        assert_eq!(high.jpeg_quality, 100);

        let low =
            RuntimeConfig::resolve(&AppSettings::default(), env(&[("SCREENSHOT_QUALITY", "0")]))
                .unwrap();
        assert_eq!(low.jpeg_quality, 1);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("KEEP_IMAGES", "many"),
            ("COORDINATE_SCALE", "-1"),
            ("INPUT_BACKEND", "wayland"),
            ("DISPLAY_WIDTH", "12.5"),
        ] {
            let err = RuntimeConfig::resolve(&AppSettings::default(), env(&[(key, value)]))
                .unwrap_err();
            let ConfigError::InvalidValue { key: got, .. } = err;
            assert_eq!(got, key);
        }
    }

    #[test]
    fn test_derived_configs() {
        let config = RuntimeConfig::resolve(
            &AppSettings::default(),
            env(&[("CLICK_SETTLE_MS", "0"), ("AGENT_MAX_STEPS", "5")]),
        )
        .unwrap();

        let executor = config.executor_config();
        assert_eq!(executor.click_settle, Duration::ZERO);
        assert_eq!(executor.coordinate_scale, 1.25);

        let agent = config.agent_config("open the calculator");
        assert!(agent.system_prompt.ends_with("open the calculator"));
        assert_eq!(agent.max_steps, Some(5));
        assert_eq!(agent.keep_images, 5);

        assert_eq!(agent.max_output_tokens, 1024);
        assert_eq!(config.model_config().model_name, "claude-3-5-sonnet-20241022");
        assert_eq!(config.command_runner().timeout(), Duration::from_secs(120));
    }
}
