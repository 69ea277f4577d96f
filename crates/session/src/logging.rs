//! Logging setup

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::{LoggingConfig, SessionError};

/// Install the global tracing subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<(), SessionError> {
    let level = Level::from_str(&config.level)
        .map_err(|e| SessionError::Logging(format!("invalid level '{}': {}", config.level, e)))?;

    let result = if config.json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| SessionError::Logging(e.to_string()))
}
