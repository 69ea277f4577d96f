//! Alerting System
//!
//! Turns the stream of DMS alert events into tiered responses: every event
//! plays a local alert, and every few events a voice message is requested,
//! rate limited by a cooldown.

mod manager;
mod sink;

pub use manager::{AlertConfig, EscalationCoordinator, EscalationOutcome};
pub use sink::{AlertIntensity, LogSink, OutputSink, RecordingSink, SinkCall, SinkError};
