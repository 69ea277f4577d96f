//! Signal Filtering and Calibration
//!
//! Provides exponential smoothing for per-frame facial signals and learns the
//! resting head-pitch baseline at session start.

mod calibrator;
mod ema;
mod filter;

pub use calibrator::BaselineCalibrator;
pub use ema::Ema;
pub use filter::{FilterConfig, FilteredSignals, SignalFilter, EYE_SMOOTHING_WEIGHT};
