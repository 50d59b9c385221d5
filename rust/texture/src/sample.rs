// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pixel sampling helpers

use image::RgbImage;

pub type Rgb = [f32; 3];

#[inline]
fn to_unit(p: &image::Rgb<u8>) -> Rgb {
    [
        p.0[0] as f32 / 255.0,
        p.0[1] as f32 / 255.0,
        p.0[2] as f32 / 255.0,
    ]
}

/// Bilinear RGB in 0..1 with coordinates clamped into the image
pub fn bilinear_rgb(img: &RgbImage, x: f32, y: f32) -> Rgb {
    let (w, h) = img.dimensions();
    if w <= 1 || h <= 1 {
        return to_unit(img.get_pixel(0, 0));
    }
    let xf = x.clamp(0.0, (w - 1) as f32);
    let yf = y.clamp(0.0, (h - 1) as f32);
    let x0 = (xf as u32).min(w - 1);
    let y0 = (yf as u32).min(h - 1);
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = xf - x0 as f32;
    let ty = yf - y0 as f32;

    let c00 = to_unit(img.get_pixel(x0, y0));
    let c10 = to_unit(img.get_pixel(x1, y0));
    let c01 = to_unit(img.get_pixel(x0, y1));
    let c11 = to_unit(img.get_pixel(x1, y1));

    std::array::from_fn(|k| {
        let top = c00[k] * (1.0 - tx) + c10[k] * tx;
        let bottom = c01[k] * (1.0 - tx) + c11[k] * tx;
        (top * (1.0 - ty) + bottom * ty).clamp(0.0, 1.0)
    })
}

/// Smoothstep fade from 0 on the image border to 1 at `margin` pixels in
pub fn edge_weight(u: f32, v: f32, width: u32, height: u32, margin: f32) -> f32 {
    let du = u.min((width - 1) as f32 - u);
    let dv = v.min((height - 1) as f32 - v);
    let d = du.min(dv);
    if d <= 0.0 {
        return 0.0;
    }
    if margin <= 0.0 {
        return 1.0;
    }
    let t = (d / margin).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Median of a small sample, averaging the middle pair for even counts
pub fn median(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

/// Rec. 709 luma
#[inline]
pub fn luma(c: &Rgb) -> f32 {
    0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2]
}

#[inline]
pub fn clamp_rgb(c: Rgb) -> Rgb {
    c.map(|x| x.clamp(0.0, 1.0))
}

/// Pack an 0..1 colour into an opaque RGBA pixel
#[inline]
pub fn to_rgba(c: &Rgb) -> image::Rgba<u8> {
    let q = |x: f32| (x * 255.0).clamp(0.0, 255.0) as u8;
    image::Rgba([q(c[0]), q(c[1]), q(c[2]), 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bilinear_midpoint() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(1, 0, image::Rgb([255, 0, 0]));
        img.put_pixel(1, 1, image::Rgb([255, 0, 0]));
        let c = bilinear_rgb(&img, 0.5, 0.5);
        assert_relative_eq!(c[0], 0.5);
        assert_relative_eq!(c[1], 0.0);
        // Clamped outside
        let c = bilinear_rgb(&img, 9.0, -3.0);
        assert_relative_eq!(c[0], 1.0);
    }

    #[test]
    fn test_degenerate_image_reads_origin() {
        let img = RgbImage::from_pixel(1, 5, image::Rgb([51, 102, 0]));
        let c = bilinear_rgb(&img, 0.0, 3.0);
        assert_relative_eq!(c[0], 0.2);
        assert_relative_eq!(c[1], 0.4);
    }

    #[test]
    fn test_edge_weight_smoothstep() {
        assert_eq!(edge_weight(0.0, 10.0, 64, 48, 12.0), 0.0);
        assert_relative_eq!(edge_weight(30.0, 24.0, 64, 48, 12.0), 1.0);
        // d = 6 of 12 -> t = 0.5 -> 0.5
        assert_relative_eq!(edge_weight(6.0, 24.0, 64, 48, 12.0), 0.5);
        // measured from the far border too
        assert_relative_eq!(edge_weight(30.0, 44.0, 64, 48, 12.0), edge_weight(3.0, 24.0, 64, 48, 12.0));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_relative_eq!(median(&mut [0.9, 0.1, 0.5]), 0.5);
        assert_relative_eq!(median(&mut [0.4, 0.2, 0.8, 0.6]), 0.5);
    }

    #[test]
    fn test_rgba_quantisation() {
        assert_eq!(to_rgba(&[1.0, 0.5, -1.0]).0, [255, 127, 0, 255]);
    }
}
