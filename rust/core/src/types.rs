// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core value types shared by every pipeline stage

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rigid camera-to-world transform, stored as a column-major 4x4 matrix
///
/// This is the layout tracking frameworks hand out (`m[12..15]` is the
/// translation, columns 0..2 are the camera axes expressed in world space).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    pub matrix: [f32; 16],
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        matrix: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Wrap a column-major matrix
    pub fn from_column_major(matrix: [f32; 16]) -> Self {
        Self { matrix }
    }

    /// Build a pose from a rotation and a translation
    pub fn from_parts(rotation: &Matrix3<f32>, translation: Vector3<f32>) -> Self {
        let mut m = Matrix4::<f32>::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        let mut matrix = [0.0f32; 16];
        matrix.copy_from_slice(m.as_slice());
        Self { matrix }
    }

    /// Pose translated to `translation` with identity rotation
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self::from_parts(&Matrix3::identity(), translation)
    }

    pub fn to_matrix4(&self) -> Matrix4<f32> {
        Matrix4::from_column_slice(&self.matrix)
    }

    /// Camera position in world space
    #[inline]
    pub fn translation(&self) -> Vector3<f32> {
        Vector3::new(self.matrix[12], self.matrix[13], self.matrix[14])
    }

    /// Rotation part (camera axes as columns)
    #[inline]
    pub fn rotation(&self) -> Matrix3<f32> {
        let m = &self.matrix;
        Matrix3::new(
            m[0], m[4], m[8], //
            m[1], m[5], m[9], //
            m[2], m[6], m[10],
        )
    }

    /// Heading angle used for keyframe gating: `atan2(m[4], m[0])`
    #[inline]
    pub fn yaw(&self) -> f32 {
        self.matrix[4].atan2(self.matrix[0])
    }

    /// Camera viewing direction (negative third column)
    pub fn forward(&self) -> Vector3<f32> {
        -Vector3::new(self.matrix[8], self.matrix[9], self.matrix[10])
    }

    /// Transform a camera-local point into world space
    #[inline]
    pub fn transform_point(&self, p: &Point3<f32>) -> Point3<f32> {
        let m = &self.matrix;
        Point3::new(
            m[0] * p.x + m[4] * p.y + m[8] * p.z + m[12],
            m[1] * p.x + m[5] * p.y + m[9] * p.z + m[13],
            m[2] * p.x + m[6] * p.y + m[10] * p.z + m[14],
        )
    }

    /// Transform a world point into camera space: `Rᵀ (p − t)`
    #[inline]
    pub fn world_to_camera(&self, p: &Point3<f32>) -> Vector3<f32> {
        let m = &self.matrix;
        let d = Vector3::new(p.x - m[12], p.y - m[13], p.z - m[14]);
        Vector3::new(
            m[0] * d.x + m[1] * d.y + m[2] * d.z,
            m[4] * d.x + m[5] * d.y + m[6] * d.z,
            m[8] * d.x + m[9] * d.y + m[10] * d.z,
        )
    }
}

/// One accepted keyframe of the accumulator's trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectorySample {
    /// Seconds (caller supplied; zero when the capture has no clock)
    pub timestamp: f64,
    pub position: [f32; 3],
    /// Quaternion (x, y, z, w); identity until orientation is recorded
    pub orientation: [f32; 4],
}

impl TrajectorySample {
    pub fn new(timestamp: f64, position: [f32; 3]) -> Self {
        Self {
            timestamp,
            position,
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rotation_z(angle: f32) -> Matrix3<f32> {
        let (s, c) = angle.sin_cos();
        Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn test_from_parts_is_column_major() {
        let pose = Pose::from_translation(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(&pose.matrix[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(pose.matrix[15], 1.0);
    }

    #[test]
    fn test_world_to_camera_inverts_transform() {
        let pose = Pose::from_parts(&rotation_z(0.7), Vector3::new(0.5, -1.0, 2.0));
        let local = Point3::new(0.3, 0.2, -1.5);
        let world = pose.transform_point(&local);
        let back = pose.world_to_camera(&world);
        assert_relative_eq!(back.x, local.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, local.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, local.z, epsilon = 1e-5);
    }

    #[test]
    fn test_yaw_of_z_rotation() {
        let pose = Pose::from_parts(&rotation_z(0.4), Vector3::zeros());
        // m[4] is R01 = -sin, so the heading runs opposite to the rotation
        assert_relative_eq!(pose.yaw(), -0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_forward_is_negative_z_axis() {
        let f = Pose::IDENTITY.forward();
        assert_relative_eq!(f.z, -1.0);
    }
}
