//! Session Controller
//!
//! Owns the start/stop lifecycle of one monitoring session and wires the
//! video and audio pipelines into a single escalation coordinator.
//! Also provides settings loading and logging setup for hosts embedding
//! the engine.

mod error;
mod logging;
mod provider;
pub mod runtime;
mod session;
mod settings;

pub use error::SessionError;
pub use logging::init_logging;
pub use provider::{AudioClassifier, LandmarkDetector};
pub use runtime::{spawn_session, EngineMessage, SessionHandle};
pub use session::{Session, SessionStats, VideoTick};
pub use settings::{LoggingConfig, RuntimeConfig, Settings};
