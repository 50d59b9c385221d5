// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! External boundary tracing and coarse polygon approximation

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;
use roomscan_geometry::polygon::{rdp_closed, remove_consecutive_duplicates};
use roomscan_geometry::{perimeter, signed_area, PixelPolygon};

use crate::image_ops::{gaussian_blur, threshold};

/// Outer borders of the mask's top-level regions
///
/// The mask is softened and re-binarised first so single-pixel notches do
/// not split the border.
pub fn outer_contours(mask: &GrayImage, blur_sigma: f32, threshold_value: u8) -> Vec<PixelPolygon> {
    let binary = threshold(&gaussian_blur(mask, blur_sigma), threshold_value);
    find_contours::<i32>(&binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points.iter().map(|p| Point2::new(p.x, p.y)).collect())
        .collect()
}

/// Contour enclosing the largest area
pub fn largest_contour(contours: &[PixelPolygon]) -> Option<&PixelPolygon> {
    contours
        .iter()
        .filter(|c| c.len() >= 3)
        .max_by(|a, b| signed_area(a).abs().total_cmp(&signed_area(b).abs()))
}

/// Closed RDP with a tolerance proportional to the contour perimeter
pub fn approximate_polygon(contour: &[Point2<i32>], fraction: f64) -> PixelPolygon {
    let contour = remove_consecutive_duplicates(contour);
    let eps = fraction * perimeter(&contour);
    rdp_closed(&contour, eps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square_mask(size: u32, lo: u32, hi: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn test_square_yields_four_corners() {
        let mask = square_mask(80, 10, 60);
        let contours = outer_contours(&mask, 0.8, 80);
        assert_eq!(contours.len(), 1);
        let poly = approximate_polygon(&contours[0], 0.02);
        assert_eq!(poly.len(), 4);
        for corner in [(10, 10), (59, 10), (59, 59), (10, 59)] {
            assert!(poly.contains(&Point2::new(corner.0, corner.1)), "{corner:?} missing");
        }
    }

    #[test]
    fn test_holes_are_ignored() {
        let mut mask = square_mask(80, 10, 70);
        for y in 30..50 {
            for x in 30..50 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        let contours = outer_contours(&mask, 0.8, 80);
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn test_largest_of_disjoint_regions() {
        let mut mask = square_mask(100, 5, 25);
        for y in 40..90 {
            for x in 40..90 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = outer_contours(&mask, 0.8, 80);
        assert_eq!(contours.len(), 2);
        let best = largest_contour(&contours).unwrap();
        assert!(best.iter().all(|p| p.x >= 40 && p.y >= 40));
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let contours = outer_contours(&GrayImage::new(20, 20), 0.8, 80);
        assert!(contours.is_empty());
        assert!(largest_contour(&contours).is_none());
    }
}
