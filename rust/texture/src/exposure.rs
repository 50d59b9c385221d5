// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-frame exposure equalisation

use image::RgbImage;

use crate::sample::{bilinear_rgb, luma};

const STRIDE: usize = 24;

/// Mean luma of a coarse grid over the central 35–65 % of the image
pub fn center_luma(img: &RgbImage) -> Option<f32> {
    let (w, h) = img.dimensions();
    let x0 = (w as f32 * 0.35) as u32;
    let x1 = (w as f32 * 0.65) as u32;
    let y0 = (h as f32 * 0.35) as u32;
    let y1 = (h as f32 * 0.65) as u32;

    let mut sum = 0.0f32;
    let mut count = 0usize;
    for y in (y0..y1).step_by(STRIDE) {
        for x in (x0..x1).step_by(STRIDE) {
            sum += luma(&bilinear_rgb(img, x as f32, y as f32));
            count += 1;
        }
    }
    (count > 0).then(|| (sum / count as f32).clamp(0.01, 1.0))
}

/// Gain per image pulling its centre luma towards the median frame
pub fn frame_gains<'a, I>(images: I, gain_min: f32, gain_max: f32) -> Vec<f32>
where
    I: IntoIterator<Item = &'a RgbImage>,
{
    let lumas: Vec<Option<f32>> = images.into_iter().map(center_luma).collect();
    let mut sorted: Vec<f32> = lumas.iter().flatten().copied().collect();
    if sorted.is_empty() {
        return vec![1.0; lumas.len()];
    }
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let reference = sorted[sorted.len() / 2];

    lumas
        .iter()
        .map(|l| (reference / l.unwrap_or(reference)).clamp(gain_min, gain_max))
        .collect()
}
