//! Per-frame signal filter

use face_signals::FaceSignals;
use serde::{Deserialize, Serialize};

use crate::{BaselineCalibrator, Ema};

/// Eye openness favors responsiveness: closure must be caught quickly
pub const EYE_SMOOTHING_WEIGHT: f32 = 0.4;

/// Filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// New-sample weight for head pitch (default: 0.15)
    pub pitch_smoothing_weight: f32,
    /// Baseline learning window (ms)
    pub calibration_window_ms: u64,
    /// Samples required before the baseline may be fixed
    pub calibration_min_samples: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            pitch_smoothing_weight: 0.15,
            calibration_window_ms: 1000,
            calibration_min_samples: 5,
        }
    }
}

/// Smoothed signals for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilteredSignals {
    pub eye_openness: f32,
    pub head_pitch_deg: f32,
    /// Smoothed pitch minus baseline; absent until calibrated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_delta: Option<f32>,
}

impl FilteredSignals {
    pub fn is_calibrated(&self) -> bool {
        self.pitch_delta.is_some()
    }
}

/// Smooths eye openness and head pitch, and owns the pitch baseline
#[derive(Debug, Clone)]
pub struct SignalFilter {
    eye: Ema,
    pitch: Ema,
    calibrator: BaselineCalibrator,
    last: Option<FilteredSignals>,
}

impl SignalFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            eye: Ema::new(EYE_SMOOTHING_WEIGHT),
            pitch: Ema::new(config.pitch_smoothing_weight),
            calibrator: BaselineCalibrator::new(
                config.calibration_window_ms,
                config.calibration_min_samples,
            ),
            last: None,
        }
    }

    /// Smooth this frame's signals.
    ///
    /// The pitch delta is taken from the pitch smoothed in this same call.
    pub fn update(&mut self, signals: &FaceSignals, now_ms: u64) -> FilteredSignals {
        let eye_openness = self.eye.update(signals.eye_openness);
        let head_pitch_deg = self.pitch.update(signals.head_pitch_deg);
        let baseline = self.calibrator.observe(head_pitch_deg, now_ms);

        let filtered = FilteredSignals {
            eye_openness,
            head_pitch_deg,
            pitch_delta: baseline.map(|b| head_pitch_deg - b),
        };
        self.last = Some(filtered);
        filtered
    }

    /// Most recent output (unchanged by absent frames)
    pub fn last(&self) -> Option<FilteredSignals> {
        self.last
    }

    pub fn baseline(&self) -> Option<f32> {
        self.calibrator.baseline()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    /// Drop the baseline and learn a new one from upcoming samples
    pub fn recalibrate(&mut self) {
        self.calibrator.reset();
    }

    /// Reset smoothing and calibration (session restart)
    pub fn reset(&mut self) {
        self.eye.reset();
        self.pitch.reset();
        self.calibrator.reset();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_signals::PitchSource;

    fn signals(eye: f32, pitch: f32) -> FaceSignals {
        FaceSignals {
            eye_openness: eye,
            head_pitch_deg: pitch,
            pitch_source: PitchSource::Orientation,
        }
    }

    fn fast_config() -> FilterConfig {
        FilterConfig {
            calibration_window_ms: 200,
            calibration_min_samples: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_delta_before_calibration() {
        let mut filter = SignalFilter::new(&fast_config());
        let out = filter.update(&signals(0.3, 5.0), 0);
        assert!(out.pitch_delta.is_none());
        assert!(!out.is_calibrated());
    }

    #[test]
    fn test_delta_uses_current_frame() {
        let mut filter = SignalFilter::new(&fast_config());
        for t in [0, 100, 200] {
            filter.update(&signals(0.3, 0.0), t);
        }
        assert_eq!(filter.baseline(), Some(0.0));

        let out = filter.update(&signals(0.3, 20.0), 300);
        // 0.15 * 20 on top of a zero baseline, from this frame's smoothing
        assert!((out.pitch_delta.unwrap() - 3.0).abs() < 1e-5);
        assert!((out.head_pitch_deg - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_eye_smoothing_is_faster_than_pitch() {
        let mut filter = SignalFilter::new(&FilterConfig::default());
        filter.update(&signals(0.0, 0.0), 0);
        let out = filter.update(&signals(1.0, 1.0), 33);
        assert!(out.eye_openness > out.head_pitch_deg);
    }

    #[test]
    fn test_recalibrate_keeps_smoothing() {
        let mut filter = SignalFilter::new(&fast_config());
        for t in [0, 100, 200] {
            filter.update(&signals(0.3, 4.0), t);
        }
        assert!(filter.is_calibrated());

        filter.recalibrate();
        assert!(!filter.is_calibrated());
        let last = filter.last().unwrap();
        assert!((last.eye_openness - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut filter = SignalFilter::new(&fast_config());
        filter.update(&signals(0.3, 4.0), 0);
        filter.reset();
        assert!(filter.last().is_none());
        let out = filter.update(&signals(0.1, 9.0), 1000);
        assert_eq!(out.eye_openness, 0.1);
        assert_eq!(out.head_pitch_deg, 9.0);
    }
}
