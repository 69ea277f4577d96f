//! Head-pitch baseline calibration
//!
//! Learns the subject's resting pitch from the first window of smoothed
//! samples. The window is measured in wall-clock milliseconds from the first
//! sample so the result does not depend on the tick rate.

use tracing::{debug, info};

/// Baseline learner for one orientation signal
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    /// Calibration window length (ms)
    window_ms: u64,
    /// Minimum samples before the window may close
    min_samples: u32,
    /// Timestamp of the first sample in the window
    started_at: Option<u64>,
    sum: f64,
    count: u32,
    /// Fixed once calibration completes
    baseline: Option<f32>,
}

impl BaselineCalibrator {
    pub fn new(window_ms: u64, min_samples: u32) -> Self {
        Self {
            window_ms,
            min_samples: min_samples.max(1),
            started_at: None,
            sum: 0.0,
            count: 0,
            baseline: None,
        }
    }

    /// Feed a smoothed sample; returns the baseline once it is fixed.
    ///
    /// The sample that reaches the end of the window is still counted, then
    /// the window closes. Later samples never touch the baseline.
    pub fn observe(&mut self, sample: f32, now_ms: u64) -> Option<f32> {
        if self.baseline.is_some() {
            return self.baseline;
        }

        let started_at = *self.started_at.get_or_insert(now_ms);
        self.sum += sample as f64;
        self.count += 1;

        let elapsed = now_ms.saturating_sub(started_at);
        if elapsed >= self.window_ms && self.count >= self.min_samples {
            let baseline = (self.sum / self.count as f64) as f32;
            info!(
                "Pitch baseline calibrated: {:.2} deg from {} samples over {} ms",
                baseline, self.count, elapsed
            );
            self.baseline = Some(baseline);
        } else if elapsed >= self.window_ms {
            debug!(
                "Calibration window elapsed with {} of {} samples, still collecting",
                self.count, self.min_samples
            );
        }

        self.baseline
    }

    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    /// Samples collected so far in the current window
    pub fn sample_count(&self) -> u32 {
        self.count
    }

    /// Discard the baseline and start a new window
    pub fn reset(&mut self) {
        self.started_at = None;
        self.sum = 0.0;
        self.count = 0;
        self.baseline = None;
    }
}
