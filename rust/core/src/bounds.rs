// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounds in f64 precision
//!
//! Used to report the extent and centre of loaded clouds and built meshes.
//! Sums are kept in f64 so multi-million point clouds don't drift.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bounding box of a set of 3D points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds3 {
    /// Minimum corner (x, y, z)
    pub min: [f64; 3],
    /// Maximum corner (x, y, z)
    pub max: [f64; 3],
    /// Number of points folded in
    pub sample_count: usize,
}

impl Bounds3 {
    /// Create new bounds initialized to invalid state
    pub fn new() -> Self {
        Self {
            min: [f64::MAX; 3],
            max: [f64::MIN; 3],
            sample_count: 0,
        }
    }

    /// Bounds of an interleaved `x, y, z` position buffer
    pub fn from_positions(positions: &[f32]) -> Self {
        let mut bounds = Self::new();
        for p in positions.chunks_exact(3) {
            bounds.expand(p[0] as f64, p[1] as f64, p[2] as f64);
        }
        bounds
    }

    /// Check if bounds are valid (at least one point added)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sample_count > 0
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, x: f64, y: f64, z: f64) {
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.min[2] = self.min[2].min(z);
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
        self.max[2] = self.max[2].max(z);
        self.sample_count += 1;
    }

    /// Centre of the box, origin when empty
    #[inline]
    pub fn center(&self) -> [f64; 3] {
        if !self.is_valid() {
            return [0.0; 3];
        }
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Extent along each axis, zero when empty
    #[inline]
    pub fn size(&self) -> [f64; 3] {
        if !self.is_valid() {
            return [0.0; 3];
        }
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bounds() {
        let bounds = Bounds3::new();
        assert!(!bounds.is_valid());
        assert_eq!(bounds.center(), [0.0; 3]);
    }

    #[test]
    fn test_from_positions() {
        let bounds = Bounds3::from_positions(&[0.0, 1.0, -2.0, 4.0, 3.0, 2.0]);
        assert_eq!(bounds.sample_count, 2);
        assert_eq!(bounds.min, [0.0, 1.0, -2.0]);
        assert_eq!(bounds.max, [4.0, 3.0, 2.0]);
        assert_eq!(bounds.center(), [2.0, 2.0, 0.0]);
        assert_eq!(bounds.size(), [4.0, 2.0, 4.0]);
    }
}
