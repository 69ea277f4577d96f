//! Activity/idle monitor
//!
//! Watches the smoothed eye-openness and pitch streams together. Any change
//! larger than the per-signal delta against the previous sample counts as
//! activity; a long enough stretch without activity raises an idle alert.

use tracing::info;

use crate::analysis::{AlertEvent, AlertKind};

/// Idle detector over the combined signal stream
#[derive(Debug, Clone)]
pub struct IdleMonitor {
    idle_ms: u64,
    ear_delta: f32,
    pitch_delta: f32,
    /// Previous (eye openness, pitch) sample
    previous: Option<(f32, f32)>,
    last_changed_at: Option<u64>,
    last_fired_at: Option<u64>,
    idle: bool,
}

impl IdleMonitor {
    pub fn new(idle_ms: u64, ear_delta: f32, pitch_delta: f32) -> Self {
        Self {
            idle_ms,
            ear_delta,
            pitch_delta,
            previous: None,
            last_changed_at: None,
            last_fired_at: None,
            idle: false,
        }
    }

    /// Record a smoothed sample
    pub fn observe(&mut self, eye_openness: f32, pitch_deg: f32, now_ms: u64) {
        match self.previous {
            None => self.last_changed_at = Some(now_ms),
            Some((prev_eye, prev_pitch)) => {
                let moved = (eye_openness - prev_eye).abs() > self.ear_delta
                    || (pitch_deg - prev_pitch).abs() > self.pitch_delta;
                if moved {
                    if self.idle {
                        info!("Activity resumed at {} ms", now_ms);
                    }
                    self.last_changed_at = Some(now_ms);
                    self.last_fired_at = None;
                    self.idle = false;
                }
            }
        }
        self.previous = Some((eye_openness, pitch_deg));
    }

    /// Check the idle clock; fires on entry and then at most once per `idle_ms`
    pub fn poll(&mut self, now_ms: u64) -> Option<AlertEvent> {
        let last_changed = self.last_changed_at?;
        let still_for = now_ms.saturating_sub(last_changed);
        if still_for < self.idle_ms {
            return None;
        }

        self.idle = true;
        if let Some(fired) = self.last_fired_at {
            if now_ms.saturating_sub(fired) < self.idle_ms {
                return None;
            }
        }

        self.last_fired_at = Some(now_ms);
        info!("Subject idle for {} ms", still_for);
        Some(AlertEvent::new(AlertKind::Idle, now_ms))
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Time of the last meaningful change
    pub fn last_changed_at(&self) -> Option<u64> {
        self.last_changed_at
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.last_changed_at = None;
        self.last_fired_at = None;
        self.idle = false;
    }
}
