//! Inference provider seams
//!
//! Detection and classification run outside the engine; it only needs their
//! resolved results, in order, for one subject.

use dms::AudioLabel;
use face_signals::LandmarkFrame;

/// Face landmark detector for one video frame
pub trait LandmarkDetector {
    /// Raw input the detector consumes (camera frame, decoded image, ...)
    type Input;

    /// Landmarks for the single subject, or `None` when no face was found
    fn detect(&mut self, input: &Self::Input) -> Option<LandmarkFrame>;
}

/// Audio classifier for one captured buffer
pub trait AudioClassifier {
    /// Ranked labels, or `None` when nothing could be classified
    fn classify(&mut self, buffer: &[f32]) -> Option<Vec<AudioLabel>>;
}
