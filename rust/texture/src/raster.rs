// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge-function rasterization of triangles in UV space
//!
//! Texture rows run top to bottom while V grows upwards, so V is flipped.
//! Triangles are drawn in input order (later ones overwrite shared texels);
//! the rows of a single triangle are shaded in parallel.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::control::BakeControl;

/// Barycentric tolerance admitting texels on shared edges
const EDGE_EPS: f32 = -0.0005;

#[inline]
fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (p[0] - a[0]) * (b[1] - a[1]) - (p[1] - a[1]) * (b[0] - a[0])
}

/// A triangle mapped into texture pixel coordinates
#[derive(Debug, Clone, Copy)]
pub struct UvTriangle {
    px: [[f32; 2]; 3],
    inv_area: f32,
    x_range: (u32, u32),
    y_range: (u32, u32),
}

impl UvTriangle {
    /// `None` for triangles with (near) zero UV area
    pub fn new(uvs: [[f32; 2]; 3], width: u32, height: u32) -> Option<Self> {
        let wm = (width - 1) as f32;
        let hm = (height - 1) as f32;
        let px = uvs.map(|uv| [uv[0].clamp(0.0, 1.0) * wm, (1.0 - uv[1].clamp(0.0, 1.0)) * hm]);
        let area = edge(px[0], px[1], px[2]);
        if area.abs() < 1e-6 {
            return None;
        }

        let lo = |k: usize| px.iter().map(|p| p[k]).fold(f32::INFINITY, f32::min);
        let hi = |k: usize| px.iter().map(|p| p[k]).fold(f32::NEG_INFINITY, f32::max);
        let clamp = |v: f32, max: u32| (v.max(0.0) as u32).min(max);
        Some(Self {
            px,
            inv_area: 1.0 / area,
            x_range: (clamp(lo(0).floor(), width - 1), clamp(hi(0).ceil(), width - 1)),
            y_range: (clamp(lo(1).floor(), height - 1), clamp(hi(1).ceil(), height - 1)),
        })
    }

    /// Barycentric weights of the centre of texel `(x, y)`, if it is covered
    #[inline]
    pub fn weights(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        let p = [x as f32 + 0.5, y as f32 + 0.5];
        let [a, b, c] = self.px;
        let w0 = edge(b, c, p) * self.inv_area;
        let w1 = edge(c, a, p) * self.inv_area;
        let w2 = 1.0 - w0 - w1;
        (w0 >= EDGE_EPS && w1 >= EDGE_EPS && w2 >= EDGE_EPS).then_some([w0, w1, w2])
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<u32> {
        self.y_range.0..=self.y_range.1
    }

    pub fn columns(&self) -> std::ops::RangeInclusive<u32> {
        self.x_range.0..=self.x_range.1
    }
}

/// Texels written by [`rasterize`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub written: usize,
    /// Rows left unshaded after cancellation
    pub skipped_rows: usize,
}

impl Coverage {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.skipped_rows == 0
    }
}

/// Shade every covered texel of `tri`
///
/// `shade` receives the barycentric weights; `None` leaves the texel as is.
/// Rows not started before cancellation are skipped.
pub fn rasterize<F>(tex: &mut RgbaImage, tri: &UvTriangle, control: &BakeControl, shade: F) -> Coverage
where
    F: Fn([f32; 3]) -> Option<Rgba<u8>> + Sync,
{
    let rows: Vec<Option<Vec<(u32, u32, Rgba<u8>)>>> = tri
        .rows()
        .into_par_iter()
        .map(|y| {
            if control.is_cancelled() {
                return None;
            }
            let texels = tri
                .columns()
                .filter_map(|x| {
                    let w = tri.weights(x, y)?;
                    shade(w).map(|px| (x, y, px))
                })
                .collect();
            Some(texels)
        })
        .collect();

    let mut coverage = Coverage::default();
    for row in rows {
        let Some(texels) = row else {
            coverage.skipped_rows += 1;
            continue;
        };
        for (x, y, px) in texels {
            tex.put_pixel(x, y, px);
            coverage.written += 1;
        }
    }
    coverage
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_half_square_coverage() {
        let mut tex = RgbaImage::new(11, 11);
        // Lower-left half in UV space -> lower-left half of the texture
        let tri = UvTriangle::new([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]], 11, 11).unwrap();
        let coverage = rasterize(&mut tex, &tri, &BakeControl::new(), |_| Some(RED));
        assert!(coverage.is_complete());
        let written = coverage.written;
        assert!(written > 40 && written < 80, "written {written}");
        assert_eq!(*tex.get_pixel(0, 9), RED);
        assert_eq!(tex.get_pixel(9, 0).0[3], 0);
    }

    #[test]
    fn test_degenerate_uvs_rejected() {
        assert!(UvTriangle::new([[0.2, 0.2], [0.2, 0.2], [0.5, 0.5]], 16, 16).is_none());
    }

    #[test]
    fn test_weights_sum_to_one() {
        let tri = UvTriangle::new([[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]], 101, 101).unwrap();
        let w = tri.weights(50, 50).unwrap();
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cancelled_writes_nothing() {
        let mut tex = RgbaImage::new(8, 8);
        let tri = UvTriangle::new([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]], 8, 8).unwrap();
        let control = BakeControl::new();
        control.cancel();
        let coverage = rasterize(&mut tex, &tri, &control, |_| Some(RED));
        assert_eq!(coverage.written, 0);
        assert_eq!(coverage.skipped_rows, 8);
    }
}
