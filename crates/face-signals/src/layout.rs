//! Landmark index layout

use serde::{Deserialize, Serialize};

/// Indices of the six contour points used for one eye's openness ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeIndices {
    /// Horizontal corner pair
    pub outer: usize,
    pub inner: usize,
    /// First vertical pair
    pub upper_a: usize,
    pub lower_a: usize,
    /// Second vertical pair
    pub upper_b: usize,
    pub lower_b: usize,
}

impl EyeIndices {
    fn max_index(&self) -> usize {
        [
            self.outer,
            self.inner,
            self.upper_a,
            self.lower_a,
            self.upper_b,
            self.lower_b,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Where each landmark the extractor needs lives in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkLayout {
    pub left_eye: EyeIndices,
    pub right_eye: EyeIndices,
    pub forehead: usize,
    pub chin: usize,
}

impl Default for LandmarkLayout {
    fn default() -> Self {
        Self::face_mesh()
    }
}

impl LandmarkLayout {
    /// 468-point face mesh topology
    pub fn face_mesh() -> Self {
        Self {
            left_eye: EyeIndices {
                outer: 33,
                inner: 133,
                upper_a: 160,
                lower_a: 144,
                upper_b: 158,
                lower_b: 153,
            },
            right_eye: EyeIndices {
                outer: 263,
                inner: 362,
                upper_a: 385,
                lower_a: 380,
                upper_b: 387,
                lower_b: 373,
            },
            forehead: 10,
            chin: 152,
        }
    }

    /// Minimum number of points a frame needs for this layout
    pub fn required_points(&self) -> usize {
        self.left_eye
            .max_index()
            .max(self.right_eye.max_index())
            .max(self.forehead)
            .max(self.chin)
            + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_mesh_required_points() {
        assert_eq!(LandmarkLayout::face_mesh().required_points(), 388);
    }
}
