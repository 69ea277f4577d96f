//! Session error types

use dms::DmsError;
use thiserror::Error;

/// Errors from the session layer
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid monitoring config: {0}")]
    Dms(#[from] DmsError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Session task is no longer running")]
    ChannelClosed,

    #[error("Session task failed: {0}")]
    Task(String),
}
