//! Landmark frame types

use serde::{Deserialize, Serialize};

/// A single normalized facial landmark
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth (0.0 when the provider only emits 2D points)
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 2D point with no depth
    pub fn planar(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance in the image plane
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Midpoint between two landmarks
    pub fn midpoint(&self, other: &Landmark) -> Landmark {
        Landmark {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
            z: (self.z + other.z) * 0.5,
        }
    }
}

/// Row-major 3x3 facial rotation matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationMatrix(pub [[f32; 3]; 3]);

impl OrientationMatrix {
    pub fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Rotation about the X axis by `degrees`
    pub fn from_pitch_deg(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    /// Build from a column-major 4x4 transform (the layout face-mesh
    /// providers emit), keeping only the rotation block.
    pub fn from_column_major_4x4(m: &[f32; 16]) -> Self {
        Self([
            [m[0], m[4], m[8]],
            [m[1], m[5], m[9]],
            [m[2], m[6], m[10]],
        ])
    }

    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[row][col]
    }
}

/// One detection instant for a single subject
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Landmarks in provider order
    pub points: Vec<Landmark>,
    /// Facial transformation, when the provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<OrientationMatrix>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self {
            points,
            orientation: None,
        }
    }

    pub fn with_orientation(mut self, orientation: OrientationMatrix) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Get landmark at `index`
    pub fn point(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_ignores_depth() {
        let a = Landmark::new(0.0, 0.0, 5.0);
        let b = Landmark::new(3.0, 4.0, -2.0);
        assert!((a.distance_2d(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_column_major_rotation_block() {
        let mut m = [0.0f32; 16];
        // column 1, row 2
        m[6] = 0.25;
        m[15] = 1.0;
        let r = OrientationMatrix::from_column_major_4x4(&m);
        assert_eq!(r.at(2, 1), 0.25);
        assert_eq!(r.at(1, 2), 0.0);
    }
}
