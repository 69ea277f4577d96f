//! Layered settings
//!
//! Defaults, then an optional TOML/JSON/YAML file, then environment variables
//! prefixed with `SNOOZE_` (nested keys joined by `__`, for example
//! `SNOOZE_DMS__EAR_THRESHOLD=0.2`).

use std::path::Path;

use alerting::AlertConfig;
use config::{Config, Environment, File, FileFormat};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Async runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Idle check cadence between frames (milliseconds)
    pub idle_poll_interval_ms: u64,
    /// Pending ticks buffered between producers and the session task
    pub channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval_ms: 250,
            channel_capacity: 64,
        }
    }
}

/// All settings for one engine instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dms: DmsConfig,
    pub alerting: AlertConfig,
    pub logging: LoggingConfig,
    pub runtime: RuntimeConfig,
}

impl Settings {
    pub const ENV_PREFIX: &'static str = "SNOOZE";

    /// Load from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, SessionError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let builder = builder.add_source(
            Environment::with_prefix(Self::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text (no environment overrides)
    pub fn from_toml_str(toml: &str) -> Result<Self, SessionError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        self.dms.validate()?;
        if self.runtime.idle_poll_interval_ms == 0 || self.runtime.channel_capacity == 0 {
            return Err(SessionError::Settings(config::ConfigError::Message(
                "runtime.idle_poll_interval_ms and runtime.channel_capacity must be non-zero"
                    .into(),
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.dms.ear_threshold, 0.18);
        assert_eq!(settings.alerting.escalation_event_count, 3);
        assert_eq!(settings.alerting.escalation_cooldown_ms, 30_000);
        assert_eq!(settings.runtime.idle_poll_interval_ms, 250);
    }

    #[test]
    fn test_toml_overrides_individual_fields() {
        let settings = Settings::from_toml_str(
            r#"
            [dms]
            eye_dwell_ms = 800
            head_down_on_deg = 18.0

            [alerting]
            escalation_cooldown_ms = 60000
            voice_prompts = ["motivation"]

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(settings.dms.eye_dwell_ms, 800);
        assert_eq!(settings.dms.head_down_on_deg, 18.0);
        assert_eq!(settings.dms.head_down_off_deg, 12.0);
        assert_eq!(settings.alerting.escalation_cooldown_ms, 60_000);
        assert_eq!(settings.alerting.voice_prompts, vec!["motivation".to_string()]);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_invalid_hysteresis_rejected() {
        let result = Settings::from_toml_str(
            r#"
            [dms]
            head_down_on_deg = 10.0
            head_down_off_deg = 11.0
            "#,
        );
        assert!(matches!(result, Err(SessionError::Dms(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/snooze.toml")));
        assert!(matches!(result, Err(SessionError::Settings(_))));
    }
}
