// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debug rendering of an extracted floorplan

use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::error::Result;
use crate::types::Floorplan;

const BACKGROUND: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);
const MASK_FILL: Rgba<u8> = Rgba([0x2A, 0x2A, 0x2A, 0xFF]);
const CONTOUR: Rgba<u8> = Rgba([0xFF, 0xD5, 0x4F, 0xFF]);
const POLYGON: Rgba<u8> = Rgba([0x66, 0xFF, 0x66, 0xFF]);

/// Mask in dark grey, raw contour pixels in yellow, outline edges in green
pub fn render_preview(plan: &Floorplan) -> RgbaImage {
    let (w, h) = plan.mask.dimensions();
    let mut img = RgbaImage::from_pixel(w, h, BACKGROUND);

    for (x, y, m) in plan.mask.enumerate_pixels() {
        if m.0[0] > 0 {
            img.put_pixel(x, y, MASK_FILL);
        }
    }

    for contour in &plan.contours {
        for p in contour {
            let x = p.x.clamp(0, w as i32 - 1) as u32;
            let y = p.y.clamp(0, h as i32 - 1) as u32;
            img.put_pixel(x, y, CONTOUR);
        }
    }

    if plan.has_polygon() {
        let n = plan.polygon.len();
        for i in 0..n {
            let a = plan.polygon[i];
            let b = plan.polygon[(i + 1) % n];
            let (ax, ay, bx, by) = (a.x as f32, a.y as f32, b.x as f32, b.y as f32);
            // Two pixels wide
            draw_line_segment_mut(&mut img, (ax, ay), (bx, by), POLYGON);
            draw_line_segment_mut(&mut img, (ax + 1.0, ay), (bx + 1.0, by), POLYGON);
            draw_line_segment_mut(&mut img, (ax, ay + 1.0), (bx, by + 1.0), POLYGON);
        }
    }

    img
}

/// Render and write a PNG preview
pub fn save_preview(plan: &Floorplan, path: impl AsRef<Path>) -> Result<()> {
    render_preview(plan).save(path)?;
    Ok(())
}
