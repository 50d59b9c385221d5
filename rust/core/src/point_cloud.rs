// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coloured point clouds

use crate::bounds::Bounds3;

/// A point cloud with optional per-point RGB colour
///
/// Positions are interleaved `x, y, z`; colours, when present, are
/// interleaved `r, g, b` with the same point count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<f32>,
    pub colors: Option<Vec<u8>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(points: usize, colored: bool) -> Self {
        Self {
            positions: Vec::with_capacity(points * 3),
            colors: colored.then(|| Vec::with_capacity(points * 3)),
        }
    }

    /// Build an uncoloured cloud from `[x, y, z]` triples
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        Self {
            positions: points.iter().flatten().copied().collect(),
            colors: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn point(&self, i: usize) -> [f32; 3] {
        let o = i * 3;
        [self.positions[o], self.positions[o + 1], self.positions[o + 2]]
    }

    /// Colour of point `i`, white for uncoloured clouds
    #[inline]
    pub fn color(&self, i: usize) -> [u8; 3] {
        match &self.colors {
            Some(c) => [c[i * 3], c[i * 3 + 1], c[i * 3 + 2]],
            None => [255, 255, 255],
        }
    }

    /// Append a point; the colour is dropped for uncoloured clouds
    pub fn push(&mut self, p: [f32; 3], color: [u8; 3]) {
        self.positions.extend_from_slice(&p);
        if let Some(c) = self.colors.as_mut() {
            c.extend_from_slice(&color);
        }
    }

    pub fn iter_points(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }

    pub fn bounds(&self) -> Bounds3 {
        Bounds3::from_positions(&self.positions)
    }
}
