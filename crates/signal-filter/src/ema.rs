//! Exponential Moving Average

/// EMA over a scalar stream
///
/// The first sample seeds the average directly so a fresh filter never drags
/// its output toward zero.
#[derive(Debug, Clone)]
pub struct Ema {
    /// Weight given to the newest sample (0-1, higher = more responsive)
    alpha: f32,
    value: Option<f32>,
}

impl Ema {
    /// Create a new EMA with given new-sample weight
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            value: None,
        }
    }

    /// Feed a sample and get the smoothed output
    pub fn update(&mut self, sample: f32) -> f32 {
        let next = match self.value {
            Some(prev) => self.alpha * sample + (1.0 - self.alpha) * prev,
            None => sample,
        };
        self.value = Some(next);
        next
    }

    /// Current smoothed value, if any sample has been seen
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Reset the filter
    pub fn reset(&mut self) {
        self.value = None;
    }
}
