// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connected component filtering

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::raster::OCCUPIED;

/// Union of the `k` largest 4-connected components of at least `min_size`
/// pixels
///
/// Equal sizes keep raster discovery order. Multiple regions survive so
/// multi-room footprints are not cut down to a single room.
pub fn keep_top_k_components(mask: &GrayImage, k: usize, min_size: usize) -> GrayImage {
    let labels = connected_components(mask, Connectivity::Four, Luma([0u8]));

    let mut sizes: Vec<usize> = Vec::new();
    for label in labels.pixels() {
        let l = label.0[0] as usize;
        if l == 0 {
            continue;
        }
        if l > sizes.len() {
            sizes.resize(l, 0);
        }
        sizes[l - 1] += 1;
    }

    let mut ranked: Vec<(usize, usize)> = sizes
        .iter()
        .enumerate()
        .filter(|(_, &size)| size >= min_size)
        .map(|(i, &size)| (i + 1, size))
        .collect();
    // Stable: ties stay in label (discovery) order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(k);

    let mut keep = vec![false; sizes.len() + 1];
    for (label, _) in &ranked {
        keep[*label] = true;
    }

    let mut out = GrayImage::new(mask.width(), mask.height());
    for (x, y, label) in labels.enumerate_pixels() {
        if keep[label.0[0] as usize] {
            out.put_pixel(x, y, Luma([OCCUPIED]));
        }
    }
    out
}
