//! DMS configuration

use face_signals::LandmarkLayout;
use serde::{Deserialize, Serialize};
use signal_filter::FilterConfig;

use crate::audio::AudioCueConfig;
use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eye openness below this counts as closed
    pub ear_threshold: f32,

    /// Eyes closed continuously this long before an alert (milliseconds)
    pub eye_dwell_ms: u64,

    /// Pitch deviation from baseline that starts a head-down episode (degrees)
    pub head_down_on_deg: f32,

    /// Pitch deviation below which an active head-down episode ends (degrees)
    pub head_down_off_deg: f32,

    /// Head held down this long before an alert (milliseconds)
    pub head_dwell_ms: u64,

    /// New-sample weight for head pitch smoothing
    pub pitch_smoothing_weight: f32,

    /// Baseline learning window after session start (milliseconds)
    pub calibration_window_ms: u64,

    /// Samples required before the baseline is fixed
    pub calibration_min_samples: u32,

    /// No meaningful change for this long counts as idle (milliseconds)
    pub idle_ms: u64,

    /// Smallest eye openness change that counts as activity
    pub idle_ear_delta: f32,

    /// Smallest pitch change that counts as activity (degrees)
    pub idle_pitch_delta: f32,

    /// Audio cue detection
    pub audio: AudioCueConfig,

    /// Landmark indices
    pub landmark_layout: LandmarkLayout,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.18,
            eye_dwell_ms: 1500,
            head_down_on_deg: 15.0,
            head_down_off_deg: 12.0,
            head_dwell_ms: 2000,
            pitch_smoothing_weight: 0.15,
            calibration_window_ms: 1000,
            calibration_min_samples: 5,
            idle_ms: 10_000,
            idle_ear_delta: 0.02,
            idle_pitch_delta: 1.5,
            audio: AudioCueConfig::default(),
            landmark_layout: LandmarkLayout::face_mesh(),
        }
    }
}

impl DmsConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            eye_dwell_ms: 1000,
            head_down_on_deg: 12.0,
            head_down_off_deg: 9.0,
            head_dwell_ms: 1500,
            idle_ms: 7000,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            eye_dwell_ms: 2500,
            head_down_on_deg: 20.0,
            head_down_off_deg: 16.0,
            head_dwell_ms: 3000,
            idle_ms: 15_000,
            ..Default::default()
        }
    }

    /// Filter settings derived from this config
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            pitch_smoothing_weight: self.pitch_smoothing_weight,
            calibration_window_ms: self.calibration_window_ms,
            calibration_min_samples: self.calibration_min_samples,
        }
    }

    /// Reject settings the state machines can't run with
    pub fn validate(&self) -> Result<(), DmsError> {
        if !(self.ear_threshold.is_finite() && self.ear_threshold > 0.0) {
            return Err(DmsError::Config(format!(
                "ear_threshold must be positive, got {}",
                self.ear_threshold
            )));
        }
        if !(self.head_down_off_deg >= 0.0 && self.head_down_off_deg < self.head_down_on_deg) {
            return Err(DmsError::Config(format!(
                "head_down_off_deg ({}) must be in [0, head_down_on_deg ({}))",
                self.head_down_off_deg, self.head_down_on_deg
            )));
        }
        if !(self.pitch_smoothing_weight > 0.0 && self.pitch_smoothing_weight <= 1.0) {
            return Err(DmsError::Config(format!(
                "pitch_smoothing_weight must be in (0, 1], got {}",
                self.pitch_smoothing_weight
            )));
        }
        if self.eye_dwell_ms == 0 || self.head_dwell_ms == 0 || self.idle_ms == 0 {
            return Err(DmsError::Config(
                "eye_dwell_ms, head_dwell_ms and idle_ms must be non-zero".into(),
            ));
        }
        if !(self.idle_ear_delta > 0.0 && self.idle_pitch_delta > 0.0) {
            return Err(DmsError::Config("idle deltas must be positive".into()));
        }
        self.audio.validate()
    }
}
