//! Eye-openness and head-pitch extraction
//!
//! Both computations are pure. Degenerate geometry is guarded with
//! [`EPSILON`] so the output saturates instead of blowing up; frames that
//! lack the required landmarks (or carry non-finite coordinates) yield
//! `None`, which the engine treats like a missed detection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{Landmark, LandmarkFrame, OrientationMatrix};
use crate::layout::{EyeIndices, LandmarkLayout};

/// Denominator guard for ratio computations
pub const EPSILON: f32 = 1e-6;

/// Where a pitch reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitchSource {
    /// Provider-supplied rotation matrix
    Orientation,
    /// Forehead/chin landmark geometry
    Geometry,
}

/// Scalar signals for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceSignals {
    /// Mean eye openness ratio of both eyes
    pub eye_openness: f32,
    /// Head pitch (degrees)
    pub head_pitch_deg: f32,
    pub pitch_source: PitchSource,
}

fn eye_ratio(frame: &LandmarkFrame, eye: &EyeIndices) -> Option<f32> {
    let p = |i: usize| frame.point(i);

    let vertical_a = p(eye.upper_a)?.distance_2d(p(eye.lower_a)?);
    let vertical_b = p(eye.upper_b)?.distance_2d(p(eye.lower_b)?);
    let horizontal = p(eye.outer)?.distance_2d(p(eye.inner)?);

    Some(((vertical_a + vertical_b) * 0.5) / (horizontal + EPSILON))
}

/// Average openness ratio of both eyes
pub fn eye_openness(frame: &LandmarkFrame, layout: &LandmarkLayout) -> Option<f32> {
    let left = eye_ratio(frame, &layout.left_eye)?;
    let right = eye_ratio(frame, &layout.right_eye)?;
    let ratio = (left + right) * 0.5;
    ratio.is_finite().then_some(ratio)
}

fn pitch_from_matrix(m: &OrientationMatrix) -> f32 {
    m.at(2, 1).atan2(m.at(2, 2)).to_degrees()
}

fn eye_center(frame: &LandmarkFrame, eye: &EyeIndices) -> Option<Landmark> {
    Some(frame.point(eye.outer)?.midpoint(frame.point(eye.inner)?))
}

fn pitch_from_geometry(frame: &LandmarkFrame, layout: &LandmarkLayout) -> Option<f32> {
    let forehead = frame.point(layout.forehead)?;
    let chin = frame.point(layout.chin)?;

    // Scale by interpupillary distance so the angle is independent of how far
    // the subject sits from the camera.
    let ipd = eye_center(frame, &layout.left_eye)?
        .distance_2d(&eye_center(frame, &layout.right_eye)?)
        + EPSILON;

    let vertical = (chin.y - forehead.y) / ipd;
    let depth = (chin.z - forehead.z) / ipd;

    Some(depth.atan2(vertical).to_degrees())
}

/// Head pitch in degrees, preferring the orientation matrix
pub fn head_pitch_deg(frame: &LandmarkFrame, layout: &LandmarkLayout) -> Option<(f32, PitchSource)> {
    if let Some(matrix) = &frame.orientation {
        let pitch = pitch_from_matrix(matrix);
        if pitch.is_finite() {
            return Some((pitch, PitchSource::Orientation));
        }
        debug!("Orientation matrix produced non-finite pitch, using landmark geometry");
    }

    pitch_from_geometry(frame, layout)
        .filter(|p| p.is_finite())
        .map(|p| (p, PitchSource::Geometry))
}

/// Stateless extractor bound to a landmark layout
#[derive(Debug, Clone, Default)]
pub struct SignalExtractor {
    layout: LandmarkLayout,
}

impl SignalExtractor {
    pub fn new(layout: LandmarkLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LandmarkLayout {
        &self.layout
    }

    /// Extract both signals; `None` when the frame can't produce them
    pub fn extract(&self, frame: &LandmarkFrame) -> Option<FaceSignals> {
        if frame.len() < self.layout.required_points() {
            debug!(
                "Frame has {} landmarks, layout needs {}",
                frame.len(),
                self.layout.required_points()
            );
            return None;
        }

        let eye_openness = eye_openness(frame, &self.layout)?;
        let (head_pitch_deg, pitch_source) = head_pitch_deg(frame, &self.layout)?;

        Some(FaceSignals {
            eye_openness,
            head_pitch_deg,
            pitch_source,
        })
    }
}

/// Build a face-mesh frame with the given eye openness and pitch.
///
/// Used by replay tooling and tests in place of a live inference provider.
pub fn synthetic_face(openness: f32, pitch_deg: f32) -> LandmarkFrame {
    let layout = LandmarkLayout::face_mesh();
    let mut points = vec![Landmark::default(); 468];

    let eye_width = 0.06;
    let lid_gap = openness * eye_width;
    let mut place_eye = |eye: &EyeIndices, cx: f32, cy: f32| {
        points[eye.outer] = Landmark::planar(cx - eye_width / 2.0, cy);
        points[eye.inner] = Landmark::planar(cx + eye_width / 2.0, cy);
        points[eye.upper_a] = Landmark::planar(cx - 0.01, cy - lid_gap / 2.0);
        points[eye.lower_a] = Landmark::planar(cx - 0.01, cy + lid_gap / 2.0);
        points[eye.upper_b] = Landmark::planar(cx + 0.01, cy - lid_gap / 2.0);
        points[eye.lower_b] = Landmark::planar(cx + 0.01, cy + lid_gap / 2.0);
    };
    place_eye(&layout.left_eye, 0.40, 0.40);
    place_eye(&layout.right_eye, 0.60, 0.40);

    let (s, c) = pitch_deg.to_radians().sin_cos();
    points[layout.forehead] = Landmark::new(0.5, 0.25, 0.0);
    points[layout.chin] = Landmark::new(0.5, 0.25 + 0.3 * c, 0.3 * s);

    LandmarkFrame::new(points).with_orientation(OrientationMatrix::from_pitch_deg(pitch_deg))
}
