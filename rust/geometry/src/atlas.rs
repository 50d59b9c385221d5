// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-cell-per-triangle atlas layout
//!
//! Every triangle gets its own square cell; the triangle is mapped onto the
//! cell's lower-left right triangle (A at the cell origin, B along +u, C
//! along +v).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
    pub cols: u32,
    pub rows: u32,
}

impl AtlasLayout {
    /// Near-square grid of `triangle_count` cells
    pub fn for_triangles(triangle_count: usize, cell_size: u32) -> Self {
        let cols = ((triangle_count as f64).sqrt().ceil() as u32).max(1);
        let rows = ((triangle_count as f64 / cols as f64).ceil() as u32).max(1);
        Self {
            width: cols * cell_size,
            height: rows * cell_size,
            cell_size,
            cols,
            rows,
        }
    }

    /// Pixel origin of triangle `t`'s cell
    #[inline]
    pub fn cell_origin(&self, t: usize) -> (u32, u32) {
        let t = t as u32;
        ((t % self.cols) * self.cell_size, (t / self.cols) * self.cell_size)
    }

    /// Atlas UVs for an unindexed soup of `triangle_count` triangles
    pub fn triangle_uvs(&self, triangle_count: usize) -> Vec<f32> {
        let inv_w = 1.0 / self.width as f32;
        let inv_h = 1.0 / self.height as f32;
        let span = self.cell_size as f32 - 1.0;
        let mut uvs = Vec::with_capacity(triangle_count * 6);
        for t in 0..triangle_count {
            let (px, py) = self.cell_origin(t);
            let (px, py) = (px as f32, py as f32);
            uvs.extend_from_slice(&[
                px * inv_w,
                py * inv_h,
                (px + span) * inv_w,
                py * inv_h,
                px * inv_w,
                (py + span) * inv_h,
            ]);
        }
        uvs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_layout_dimensions() {
        let layout = AtlasLayout::for_triangles(10, 64);
        assert_eq!((layout.cols, layout.rows), (4, 3));
        assert_eq!((layout.width, layout.height), (256, 192));

        let empty = AtlasLayout::for_triangles(0, 64);
        assert_eq!((empty.cols, empty.rows), (1, 1));
    }

    #[test]
    fn test_cell_uvs() {
        let layout = AtlasLayout::for_triangles(4, 64);
        let uvs = layout.triangle_uvs(4);
        assert_eq!(uvs.len(), 24);
        // Triangle 3 sits in cell (1, 1)
        let t3 = &uvs[18..24];
        assert_relative_eq!(t3[0], 0.5);
        assert_relative_eq!(t3[1], 0.5);
        assert_relative_eq!(t3[2], 127.0 / 128.0);
        assert_relative_eq!(t3[5], 127.0 / 128.0);
    }
}
