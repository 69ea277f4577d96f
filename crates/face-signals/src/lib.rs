//! Facial Signal Extraction
//!
//! Turns one set of facial landmarks into the scalar signals the drowsiness
//! engine tracks:
//! - Eye openness ratio (EAR-style, lower = more closed)
//! - Head pitch in degrees (orientation matrix or landmark geometry)

pub mod extractor;
pub mod frame;
pub mod layout;

pub use extractor::{
    eye_openness, head_pitch_deg, synthetic_face, FaceSignals, PitchSource, SignalExtractor, EPSILON,
};
pub use frame::{Landmark, LandmarkFrame, OrientationMatrix};
pub use layout::{EyeIndices, LandmarkLayout};
