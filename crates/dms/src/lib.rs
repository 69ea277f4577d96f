//! Driver Monitoring System (DMS)
//!
//! Real-time alertness analysis from facial landmarks:
//! - Eye closure detection (drowsiness)
//! - Head-down detection against a calibrated pitch baseline
//! - Idle detection (no movement or blinking at all)
//! - Audio cue detection (snoring, yawning)
//!
//! Every monitor returns typed [`AlertEvent`]s; escalation happens downstream.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod idle;
pub mod state;

pub use analysis::{AlertEvent, AlertKind, DmsAnalysis};
pub use audio::{AudioCueConfig, AudioCueMachine, AudioLabel};
pub use config::DmsConfig;
pub use idle::IdleMonitor;
pub use state::{DwellState, EyeClosureMachine, HeadDownMachine};

use face_signals::{LandmarkFrame, SignalExtractor};
use signal_filter::SignalFilter;
use thiserror::Error;
use tracing::{debug, info};

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Video-side monitoring pipeline for one session
pub struct DmsModule {
    config: DmsConfig,
    extractor: SignalExtractor,
    filter: SignalFilter,
    eye: EyeClosureMachine,
    head: HeadDownMachine,
    idle: IdleMonitor,
    /// Consecutive ticks without a usable face
    face_absent_frames: u32,
}

impl DmsModule {
    /// Create a new DMS module with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            extractor: SignalExtractor::new(config.landmark_layout),
            filter: SignalFilter::new(&config.filter_config()),
            eye: EyeClosureMachine::new(config.ear_threshold, config.eye_dwell_ms),
            head: HeadDownMachine::new(
                config.head_down_on_deg,
                config.head_down_off_deg,
                config.head_dwell_ms,
            ),
            idle: IdleMonitor::new(config.idle_ms, config.idle_ear_delta, config.idle_pitch_delta),
            face_absent_frames: 0,
            config,
        })
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    /// Analyze one video tick; `frame` is `None` when no face was detected
    pub fn analyze(&mut self, now_ms: u64, frame: Option<&LandmarkFrame>) -> DmsAnalysis {
        let signals = frame.and_then(|f| self.extractor.extract(f));

        let Some(signals) = signals else {
            if self.face_absent_frames == 0 {
                debug!("Face lost at {} ms", now_ms);
            }
            self.face_absent_frames = self.face_absent_frames.saturating_add(1);
            // Absence clears both conditions; smoothed values stay as they were.
            self.eye.clear();
            self.head.clear();

            let events = self.idle.poll(now_ms).into_iter().collect();
            return DmsAnalysis {
                face_detected: false,
                filtered: self.filter.last(),
                calibrated: self.filter.is_calibrated(),
                idle: self.idle.is_idle(),
                events,
                ..Default::default()
            };
        };

        if self.face_absent_frames > 0 {
            debug!(
                "Face reacquired at {} ms after {} frames",
                now_ms, self.face_absent_frames
            );
            self.face_absent_frames = 0;
        }

        let filtered = self.filter.update(&signals, now_ms);

        let mut events = Vec::new();
        events.extend(self.eye.update(filtered.eye_openness, now_ms));
        events.extend(self.head.update(filtered.pitch_delta, now_ms));

        self.idle
            .observe(filtered.eye_openness, filtered.head_pitch_deg, now_ms);
        events.extend(self.idle.poll(now_ms));

        DmsAnalysis {
            face_detected: true,
            signals: Some(signals),
            filtered: Some(filtered),
            calibrated: filtered.is_calibrated(),
            eyes_closed: self.eye.is_active(),
            head_down: self.head.is_active(),
            idle: self.idle.is_idle(),
            events,
        }
    }

    /// Idle check between frames (fixed polling cadence)
    pub fn poll_idle(&mut self, now_ms: u64) -> Option<AlertEvent> {
        self.idle.poll(now_ms)
    }

    pub fn is_calibrated(&self) -> bool {
        self.filter.is_calibrated()
    }

    pub fn baseline(&self) -> Option<f32> {
        self.filter.baseline()
    }

    /// Learn a new pitch baseline; head-down stays inactive until it is ready
    pub fn recalibrate(&mut self) {
        info!("Pitch recalibration requested");
        self.filter.recalibrate();
        self.head.clear();
    }

    /// Reset all timers, smoothing and calibration (session restart)
    pub fn reset_state(&mut self) {
        self.filter.reset();
        self.eye = EyeClosureMachine::new(self.config.ear_threshold, self.config.eye_dwell_ms);
        self.head = HeadDownMachine::new(
            self.config.head_down_on_deg,
            self.config.head_down_off_deg,
            self.config.head_dwell_ms,
        );
        self.idle.reset();
        self.face_absent_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_signals::synthetic_face;

    fn test_config() -> DmsConfig {
        DmsConfig {
            ear_threshold: 0.18,
            eye_dwell_ms: 300,
            head_down_on_deg: 15.0,
            head_down_off_deg: 12.0,
            head_dwell_ms: 500,
            pitch_smoothing_weight: 1.0,
            calibration_window_ms: 300,
            calibration_min_samples: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DmsConfig {
            head_down_off_deg: 20.0,
            ..Default::default()
        };
        assert!(DmsModule::new(config).is_err());
    }

    #[test]
    fn test_eye_closure_through_pipeline() {
        let mut dms = DmsModule::new(test_config()).unwrap();
        let mut events = Vec::new();
        for i in 0..20u64 {
            let openness = if i < 3 { 0.30 } else { 0.02 };
            let analysis = dms.analyze(i * 100, Some(&synthetic_face(openness, 0.0)));
            events.extend(analysis.events);
        }
        let closures: Vec<u64> = events
            .iter()
            .filter(|e| e.kind == AlertKind::EyeClosure)
            .map(|e| e.at_ms)
            .collect();
        // smoothed openness first drops below 0.18 at t=400
        assert_eq!(closures.first(), Some(&700));
    }

    #[test]
    fn test_head_down_after_calibration() {
        let mut dms = DmsModule::new(test_config()).unwrap();
        for i in 0..4u64 {
            let analysis = dms.analyze(i * 100, Some(&synthetic_face(0.3, 2.0)));
            assert!(analysis.events.is_empty());
        }
        assert!(dms.is_calibrated());
        assert!((dms.baseline().unwrap() - 2.0).abs() < 1e-3);

        let mut fired = None;
        for i in 4..12u64 {
            let analysis = dms.analyze(i * 100, Some(&synthetic_face(0.3, 20.0)));
            if let Some(e) = analysis.events.iter().find(|e| e.kind == AlertKind::HeadDown) {
                fired = Some(e.at_ms);
                assert!(analysis.head_down);
            }
        }
        assert_eq!(fired, Some(900));
    }

    #[test]
    fn test_head_down_never_fires_uncalibrated() {
        let config = DmsConfig {
            calibration_window_ms: 60_000,
            ..test_config()
        };
        let mut dms = DmsModule::new(config).unwrap();
        for i in 0..50u64 {
            let analysis = dms.analyze(i * 100, Some(&synthetic_face(0.3, 40.0)));
            assert!(!analysis.head_down);
            assert!(analysis.events.iter().all(|e| e.kind != AlertKind::HeadDown));
        }
    }

    #[test]
    fn test_absent_face_clears_machines_and_keeps_smoothing() {
        let mut dms = DmsModule::new(test_config()).unwrap();
        dms.analyze(0, Some(&synthetic_face(0.02, 0.0)));
        dms.analyze(100, Some(&synthetic_face(0.02, 0.0)));
        let before = dms.analyze(200, Some(&synthetic_face(0.02, 0.0))).filtered;

        let absent = dms.analyze(300, None);
        assert!(!absent.face_detected);
        assert!(!absent.eyes_closed);
        assert_eq!(absent.filtered, before);

        // dwell restarts after the dropout
        let back = dms.analyze(400, Some(&synthetic_face(0.02, 0.0)));
        assert!(back.events.is_empty());
        let later = dms.analyze(700, Some(&synthetic_face(0.02, 0.0)));
        assert_eq!(later.events, vec![AlertEvent::new(AlertKind::EyeClosure, 700)]);
    }

    #[test]
    fn test_idle_fires_while_face_absent() {
        let config = DmsConfig {
            idle_ms: 1000,
            ..test_config()
        };
        let mut dms = DmsModule::new(config).unwrap();
        dms.analyze(0, Some(&synthetic_face(0.3, 0.0)));
        assert!(dms.analyze(500, None).events.is_empty());
        let analysis = dms.analyze(1000, None);
        assert_eq!(analysis.events, vec![AlertEvent::new(AlertKind::Idle, 1000)]);
        assert!(analysis.idle);
    }

    #[test]
    fn test_reset_forgets_baseline() {
        let mut dms = DmsModule::new(test_config()).unwrap();
        for i in 0..5u64 {
            dms.analyze(i * 100, Some(&synthetic_face(0.3, 5.0)));
        }
        assert!(dms.is_calibrated());
        dms.reset_state();
        assert!(!dms.is_calibrated());
        assert!(dms.poll_idle(1_000_000).is_none());
    }

    #[test]
    fn test_recalibrate_relearns_baseline() {
        let mut dms = DmsModule::new(test_config()).unwrap();
        for i in 0..4u64 {
            dms.analyze(i * 100, Some(&synthetic_face(0.3, 0.0)));
        }
        dms.recalibrate();
        assert!(!dms.is_calibrated());
        for i in 4..8u64 {
            dms.analyze(i * 100, Some(&synthetic_face(0.3, 10.0)));
        }
        assert!((dms.baseline().unwrap() - 10.0).abs() < 1e-3);
    }
}
