//! Output sink seam
//!
//! The engine only ever makes two one-way calls: play a short alert, or ask
//! for a voice message. Whatever plays sound or talks to a speech backend
//! lives behind [`OutputSink`].

use dms::AlertKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Output sink errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Output rejected: {0}")]
    Rejected(String),

    #[error("Output device unavailable")]
    Unavailable,
}

/// Low-tier alert intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertIntensity {
    Low,
    Medium,
    High,
}

impl AlertIntensity {
    /// Intensity used for each event kind
    pub fn for_kind(kind: AlertKind) -> Self {
        match kind {
            AlertKind::EyeClosure => AlertIntensity::High,
            AlertKind::HeadDown | AlertKind::DrowsySound => AlertIntensity::Medium,
            AlertKind::Idle => AlertIntensity::Low,
        }
    }
}

/// Destination for alert responses
pub trait OutputSink {
    /// Play a short local alert
    fn fire_alert(&mut self, kind: AlertKind, intensity: AlertIntensity) -> Result<(), SinkError>;

    /// Ask the voice backend to speak a message for `prompt`
    fn request_voice_message(&mut self, prompt: &str) -> Result<(), SinkError>;
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn fire_alert(&mut self, kind: AlertKind, intensity: AlertIntensity) -> Result<(), SinkError> {
        (**self).fire_alert(kind, intensity)
    }

    fn request_voice_message(&mut self, prompt: &str) -> Result<(), SinkError> {
        (**self).request_voice_message(prompt)
    }
}

/// Sink that only logs; used when no audio device is attached
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn fire_alert(&mut self, kind: AlertKind, intensity: AlertIntensity) -> Result<(), SinkError> {
        warn!("ALERT {} ({:?})", kind, intensity);
        Ok(())
    }

    fn request_voice_message(&mut self, prompt: &str) -> Result<(), SinkError> {
        info!("Voice message requested: {}", prompt);
        Ok(())
    }
}

/// A call received by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Alert(AlertKind, AlertIntensity),
    Voice(String),
}

/// Sink that records calls in memory, optionally failing them
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    pub fail_alerts: bool,
    pub fail_voice: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> impl Iterator<Item = &SinkCall> {
        self.calls.iter().filter(|c| matches!(c, SinkCall::Alert(..)))
    }

    pub fn voice_requests(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Voice(p) => Some(p.as_str()),
                SinkCall::Alert(..) => None,
            })
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn fire_alert(&mut self, kind: AlertKind, intensity: AlertIntensity) -> Result<(), SinkError> {
        self.calls.push(SinkCall::Alert(kind, intensity));
        if self.fail_alerts {
            return Err(SinkError::Unavailable);
        }
        Ok(())
    }

    fn request_voice_message(&mut self, prompt: &str) -> Result<(), SinkError> {
        self.calls.push(SinkCall::Voice(prompt.to_string()));
        if self.fail_voice {
            return Err(SinkError::Rejected("voice backend returned an error".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_by_kind() {
        assert_eq!(AlertIntensity::for_kind(AlertKind::EyeClosure), AlertIntensity::High);
        assert_eq!(AlertIntensity::for_kind(AlertKind::HeadDown), AlertIntensity::Medium);
        assert_eq!(AlertIntensity::for_kind(AlertKind::Idle), AlertIntensity::Low);
        assert!(AlertIntensity::High > AlertIntensity::Low);
    }

    #[test]
    fn test_boxed_sink_forwards() {
        let mut sink: Box<dyn OutputSink> = Box::new(LogSink);
        assert!(sink.fire_alert(AlertKind::Idle, AlertIntensity::Low).is_ok());
        assert!(sink.request_voice_message("pep talk").is_ok());
    }
}
