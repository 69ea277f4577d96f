//! DMS analysis results and alert events

use std::fmt;

use face_signals::FaceSignals;
use serde::{Deserialize, Serialize};
use signal_filter::FilteredSignals;

/// Alert kinds raised by the monitors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Eyes closed past the dwell time
    EyeClosure,

    /// Head pitched down from baseline past the dwell time
    HeadDown,

    /// No meaningful movement or blinking for too long
    Idle,

    /// Snoring/yawning picked up by the audio classifier
    DrowsySound,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::EyeClosure => "eye_closure",
            AlertKind::HeadDown => "head_down",
            AlertKind::Idle => "idle",
            AlertKind::DrowsySound => "drowsy_sound",
        }
    }

    /// Ordering used when several alerts land on the same frame
    fn priority(&self) -> u8 {
        match self {
            AlertKind::EyeClosure => 3,
            AlertKind::HeadDown => 2,
            AlertKind::DrowsySound => 1,
            AlertKind::Idle => 0,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete alert occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    /// Tick timestamp that produced the event (milliseconds)
    pub at_ms: u64,
}

impl AlertEvent {
    pub fn new(kind: AlertKind, at_ms: u64) -> Self {
        Self { kind, at_ms }
    }
}

/// Complete per-frame DMS analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Whether a usable face was detected
    pub face_detected: bool,

    /// Raw signals for this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<FaceSignals>,

    /// Smoothed signals for this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered: Option<FilteredSignals>,

    /// Pitch baseline learned
    pub calibrated: bool,

    /// Eye-closure machine active
    pub eyes_closed: bool,

    /// Head-down machine active
    pub head_down: bool,

    /// Idle asserted
    pub idle: bool,

    /// Events emitted this tick, in the order they fired
    pub events: Vec<AlertEvent>,
}

impl DmsAnalysis {
    /// Check if any events fired this tick
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Most urgent event this tick
    pub fn highest_priority_event(&self) -> Option<AlertEvent> {
        self.events
            .iter()
            .copied()
            .max_by_key(|e| e.kind.priority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_priority_event() {
        let analysis = DmsAnalysis {
            events: vec![
                AlertEvent::new(AlertKind::Idle, 10),
                AlertEvent::new(AlertKind::EyeClosure, 10),
                AlertEvent::new(AlertKind::HeadDown, 10),
            ],
            ..Default::default()
        };
        assert_eq!(
            analysis.highest_priority_event().map(|e| e.kind),
            Some(AlertKind::EyeClosure)
        );
        assert!(DmsAnalysis::default().highest_priority_event().is_none());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&AlertEvent::new(AlertKind::HeadDown, 42)).unwrap();
        assert_eq!(json, r#"{"kind":"head_down","at_ms":42}"#);
    }

    #[test]
    fn test_absent_face_analysis_omits_signals() {
        let json = serde_json::to_value(DmsAnalysis::default()).unwrap();
        assert!(json.get("signals").is_none());
        assert_eq!(json["face_detected"], false);
    }
}
