//! Audio cue detection
//!
//! The audio pipeline hands over a ranked label list per classified buffer.
//! A cue (snoring, yawning, heavy breathing) has to persist for a dwell
//! period before it counts, the same way eye closure does.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::{AlertEvent, AlertKind};
use crate::state::DwellState;
use crate::DmsError;

/// One classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioLabel {
    pub label: String,
    /// Classifier confidence (0-1)
    pub score: f32,
}

impl AudioLabel {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Audio cue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioCueConfig {
    /// Labels treated as drowsiness cues (case-insensitive)
    pub cue_labels: Vec<String>,
    /// Minimum classifier score for a cue to count
    pub min_score: f32,
    /// Cue must persist this long (milliseconds)
    pub dwell_ms: u64,
}

impl Default for AudioCueConfig {
    fn default() -> Self {
        Self {
            cue_labels: vec!["Snoring".into(), "Yawn".into(), "Breathing".into()],
            min_score: 0.5,
            dwell_ms: 1500,
        }
    }
}

impl AudioCueConfig {
    pub fn validate(&self) -> Result<(), DmsError> {
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(DmsError::Config(format!(
                "audio.min_score must be in [0, 1], got {}",
                self.min_score
            )));
        }
        if self.dwell_ms == 0 {
            return Err(DmsError::Config("audio.dwell_ms must be non-zero".into()));
        }
        Ok(())
    }
}

/// Dwell machine over audio classifier output
#[derive(Debug, Clone)]
pub struct AudioCueMachine {
    config: AudioCueConfig,
    state: DwellState,
}

impl AudioCueMachine {
    pub fn new(config: AudioCueConfig) -> Self {
        Self {
            config,
            state: DwellState::default(),
        }
    }

    fn matching_cue<'a>(&self, labels: &'a [AudioLabel]) -> Option<&'a AudioLabel> {
        labels.iter().find(|l| {
            l.score >= self.config.min_score
                && self
                    .config
                    .cue_labels
                    .iter()
                    .any(|cue| cue.eq_ignore_ascii_case(&l.label))
        })
    }

    /// Feed one classified buffer; `None` means nothing was classified
    pub fn update(&mut self, labels: Option<&[AudioLabel]>, now_ms: u64) -> Option<AlertEvent> {
        let Some(cue) = labels.and_then(|l| self.matching_cue(l)) else {
            self.state.clear();
            return None;
        };

        if !self.state.hold(now_ms, self.config.dwell_ms)
            || !self.state.can_fire(now_ms, self.config.dwell_ms)
        {
            return None;
        }

        self.state.fire(now_ms);
        info!("Drowsy sound confirmed: {} ({:.2})", cue.label, cue.score);
        Some(AlertEvent::new(AlertKind::DrowsySound, now_ms))
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn reset(&mut self) {
        self.state = DwellState::default();
    }
}
