// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mask operations for occupancy grids
//!
//! Structuring elements are squares (Chebyshev norm), matching a
//! `(2r + 1) x (2r + 1)` box neighbourhood.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;

/// Morphological dilation: a pixel is set if any pixel in its box is set
pub fn dilate(image: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }
    imageproc::morphology::dilate(image, Norm::LInf, radius)
}

/// Morphological erosion: a pixel stays set only if its whole box is set
///
/// Pixels outside the image count as empty, so nothing within `radius` of
/// the border survives.
pub fn erode(image: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }
    let mut eroded = imageproc::morphology::erode(image, Norm::LInf, radius);
    clear_border(&mut eroded, radius as u32);
    eroded
}

/// Zero every pixel closer than `width` to the image border
fn clear_border(image: &mut GrayImage, width: u32) {
    let (w, h) = image.dimensions();
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if x < width || y < width || x + width >= w || y + width >= h {
            *pixel = Luma([0]);
        }
    }
}

/// Closing that bridges scan gaps, followed by a light dilation
pub fn close_and_dilate(image: &GrayImage, close_radius: u8, dilate_radius: u8) -> GrayImage {
    let closed = erode(&dilate(image, close_radius), close_radius);
    dilate(&closed, dilate_radius)
}

/// Apply Gaussian blur for noise reduction
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Binary threshold: pixels strictly above `threshold` become 255
pub fn threshold(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut result = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel.0[0] > threshold { 255 } else { 0 };
        result.put_pixel(x, y, Luma([value]));
    }
    result
}
