// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pixel-space room outline clean-up
//!
//! Outlines traced from an occupancy mask are noisy: stair-stepped edges,
//! tiny jogs and runs of nearly collinear vertices. [`clean`] strips those
//! while never returning fewer than three vertices.

use nalgebra::{Point2, Scalar};
use serde::{Deserialize, Serialize};

use crate::orthogonalize::orthogonalize;

/// Closed polygon in integer pixel coordinates
pub type PixelPolygon = Vec<Point2<i32>>;

/// Clean-up tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanParams {
    /// A vertex is dropped when both adjacent edges are shorter than this
    pub min_edge_px: i32,
    /// Closed Ramer–Douglas–Peucker tolerance
    pub rdp_eps_px: f64,
    /// Vertices whose angle is within this many degrees of 180° are dropped
    pub collinear_deg: f64,
}

impl Default for CleanParams {
    fn default() -> Self {
        Self {
            min_edge_px: 6,
            rdp_eps_px: 3.0,
            collinear_deg: 8.0,
        }
    }
}

impl CleanParams {
    pub fn new(min_edge_px: i32, rdp_eps_px: f64, collinear_deg: f64) -> Self {
        Self {
            min_edge_px,
            rdp_eps_px,
            collinear_deg,
        }
    }
}

/// Shoelace signed area; positive for counter-clockwise (y up) winding
pub fn signed_area<T: Scalar + Copy + Into<f64>>(poly: &[Point2<T>]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let a = &poly[i];
        let b = &poly[(i + 1) % n];
        area += a.x.into() * b.y.into() - b.x.into() * a.y.into();
    }
    0.5 * area
}

/// Length of the closed boundary
pub fn perimeter<T: Scalar + Copy + Into<f64>>(poly: &[Point2<T>]) -> f64 {
    let n = poly.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let a = &poly[i];
            let b = &poly[(i + 1) % n];
            let dx = b.x.into() - a.x.into();
            let dy = b.y.into() - a.y.into();
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

#[inline]
fn dist2(a: &Point2<i32>, b: &Point2<i32>) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Drop repeated consecutive vertices, including a closing duplicate
pub fn remove_consecutive_duplicates(poly: &[Point2<i32>]) -> PixelPolygon {
    let mut out: PixelPolygon = Vec::with_capacity(poly.len());
    for p in poly {
        if out.last() != Some(p) {
            out.push(*p);
        }
    }
    if out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Drop vertices whose two adjacent edges are both shorter than `min_edge_px`
pub fn remove_short_edges(poly: &[Point2<i32>], min_edge_px: i32) -> PixelPolygon {
    let n = poly.len();
    if n < 3 {
        return poly.to_vec();
    }
    let min2 = min_edge_px as i64 * min_edge_px as i64;
    let out: PixelPolygon = (0..n)
        .filter(|&i| {
            let prev = &poly[(i + n - 1) % n];
            let cur = &poly[i];
            let next = &poly[(i + 1) % n];
            !(dist2(prev, cur) < min2 && dist2(cur, next) < min2)
        })
        .map(|i| poly[i])
        .collect();

    if out.len() >= 3 {
        out
    } else {
        poly.to_vec()
    }
}

/// Distance from `p` to the segment `a..b`
fn segment_distance(p: &Point2<i32>, a: &Point2<i32>, b: &Point2<i32>) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let vx = b.x as f64 - ax;
    let vy = b.y as f64 - ay;
    let len2 = vx * vx + vy * vy;
    let (px, py) = (p.x as f64, p.y as f64);
    let t = if len2 > 1e-6 {
        ((px - ax) * vx + (py - ay) * vy) / len2
    } else {
        0.0
    };
    let t = t.clamp(0.0, 1.0);
    let dx = px - (ax + t * vx);
    let dy = py - (ay + t * vy);
    (dx * dx + dy * dy).sqrt()
}

fn rdp_mark(points: &[Point2<i32>], a: usize, b: usize, eps: f64, keep: &mut [bool]) {
    if b <= a + 1 {
        return;
    }
    let mut max_d = -1.0;
    let mut split = None;
    for i in a + 1..b {
        let d = segment_distance(&points[i], &points[a], &points[b]);
        if d > max_d {
            max_d = d;
            split = Some(i);
        }
    }
    if let Some(idx) = split {
        if max_d > eps {
            keep[idx] = true;
            rdp_mark(points, a, idx, eps, keep);
            rdp_mark(points, idx, b, eps, keep);
        }
    }
}

/// Ramer–Douglas–Peucker on an open polyline
pub fn rdp_open(points: &[Point2<i32>], eps: f64) -> PixelPolygon {
    if points.len() < 3 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;
    rdp_mark(points, 0, last, eps, &mut keep);
    points
        .iter()
        .zip(&keep)
        .filter(|(_, &k)| k)
        .map(|(p, _)| *p)
        .collect()
}

/// Ramer–Douglas–Peucker on a closed polygon
///
/// The cycle is opened at vertex 0 by appending a copy of it, simplified,
/// and closed again. Polygons with fewer than four vertices are returned
/// unchanged.
pub fn rdp_closed(poly: &[Point2<i32>], eps: f64) -> PixelPolygon {
    if poly.len() < 4 {
        return poly.to_vec();
    }
    let mut open = Vec::with_capacity(poly.len() + 1);
    open.extend_from_slice(poly);
    open.push(poly[0]);

    let mut out = rdp_open(&open, eps);
    if out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    if out.len() >= 3 {
        out
    } else {
        poly.to_vec()
    }
}

/// Drop vertices whose corner angle is within `collinear_deg` of 180°
///
/// Vertices with a zero-length adjacent edge are dropped too.
pub fn remove_almost_collinear(poly: &[Point2<i32>], collinear_deg: f64) -> PixelPolygon {
    let n = poly.len();
    if n < 3 {
        return poly.to_vec();
    }
    let out: PixelPolygon = (0..n)
        .filter(|&i| {
            let prev = &poly[(i + n - 1) % n];
            let cur = &poly[i];
            let next = &poly[(i + 1) % n];
            let (v1x, v1y) = ((prev.x - cur.x) as f64, (prev.y - cur.y) as f64);
            let (v2x, v2y) = ((next.x - cur.x) as f64, (next.y - cur.y) as f64);
            let l1 = (v1x * v1x + v1y * v1y).sqrt();
            let l2 = (v2x * v2x + v2y * v2y).sqrt();
            if l1 < 1e-6 || l2 < 1e-6 {
                return false;
            }
            let cos = ((v1x * v2x + v1y * v2y) / (l1 * l2)).clamp(-1.0, 1.0);
            let angle = cos.acos().to_degrees();
            (180.0 - angle).abs() >= collinear_deg
        })
        .map(|i| poly[i])
        .collect();

    if out.len() >= 3 {
        out
    } else {
        poly.to_vec()
    }
}

/// Clean a traced outline
///
/// Steps, in order: drop consecutive duplicates, drop short double edges,
/// closed RDP, drop near-collinear corners, drop short double edges again.
/// Inputs with fewer than three vertices are returned unchanged.
pub fn clean(poly: &[Point2<i32>], params: &CleanParams) -> PixelPolygon {
    if poly.len() < 3 {
        return poly.to_vec();
    }
    let p = remove_consecutive_duplicates(poly);
    let p = remove_short_edges(&p, params.min_edge_px);
    let p = rdp_closed(&p, params.rdp_eps_px);
    let p = remove_almost_collinear(&p, params.collinear_deg);
    remove_short_edges(&p, params.min_edge_px)
}

/// The standard outline pipeline: clean, snap to right angles, clean again
/// with tighter tolerances
pub fn simplify_room_outline(poly: &[Point2<i32>]) -> PixelPolygon {
    let p = clean(poly, &CleanParams::new(6, 3.0, 8.0));
    let p = orthogonalize(&p);
    clean(&p, &CleanParams::new(6, 2.0, 5.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(v: &[(i32, i32)]) -> PixelPolygon {
        v.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    /// Rectangle traced with extra collinear points and a small jog
    fn noisy_rectangle() -> PixelPolygon {
        pts(&[
            (0, 0),
            (25, 0),
            (50, 1),
            (75, 0),
            (100, 0),
            (100, 0),
            (100, 25),
            (101, 50),
            (100, 51),
            (50, 50),
            (2, 50),
            (0, 48),
            (0, 25),
            (0, 0),
        ])
    }

    #[test]
    fn test_area_and_perimeter() {
        let square = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        assert_relative_eq!(signed_area(&square), 100.0);
        assert_relative_eq!(perimeter(&square), 40.0);
        let reversed: PixelPolygon = square.iter().rev().copied().collect();
        assert_relative_eq!(signed_area(&reversed), -100.0);
    }

    #[test]
    fn test_duplicates_and_closing_point() {
        let p = remove_consecutive_duplicates(&pts(&[(0, 0), (0, 0), (5, 0), (5, 5), (0, 0)]));
        assert_eq!(p, pts(&[(0, 0), (5, 0), (5, 5)]));
    }

    #[test]
    fn test_short_edges_need_both_sides() {
        // (12, 2) has one short and one long edge and must survive
        let p = pts(&[(0, 0), (10, 0), (12, 2), (12, 40), (0, 40)]);
        assert_eq!(remove_short_edges(&p, 6), p);

        let p = pts(&[(0, 0), (20, 0), (22, 1), (24, 0), (40, 0), (40, 40), (0, 40)]);
        let out = remove_short_edges(&p, 6);
        assert!(!out.contains(&Point2::new(22, 1)));
    }

    #[test]
    fn test_rdp_closed_small_input_untouched() {
        let tri = pts(&[(0, 0), (10, 0), (0, 10)]);
        assert_eq!(rdp_closed(&tri, 100.0), tri);
    }

    #[test]
    fn test_collinear_removal() {
        let p = pts(&[(0, 0), (50, 1), (100, 0), (100, 50), (0, 50)]);
        let out = remove_almost_collinear(&p, 8.0);
        assert_eq!(out, pts(&[(0, 0), (100, 0), (100, 50), (0, 50)]));
    }

    #[test]
    fn test_clean_noisy_rectangle() {
        let out = clean(&noisy_rectangle(), &CleanParams::default());
        assert_eq!(out.len(), 4);
        assert!(out.contains(&Point2::new(0, 0)));
        assert!(out.contains(&Point2::new(100, 0)));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean(&noisy_rectangle(), &CleanParams::default());
        let twice = clean(&once, &CleanParams::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_never_below_three() {
        let tiny = pts(&[(0, 0), (1, 0), (1, 1), (0, 1)]);
        let out = clean(&tiny, &CleanParams::default());
        assert!(out.len() >= 3);

        let line = pts(&[(0, 0), (10, 0), (20, 0)]);
        assert_eq!(clean(&line, &CleanParams::default()).len(), 3);
        assert_eq!(clean(&line[..2], &CleanParams::default()).len(), 2);
    }

    #[test]
    fn test_simplify_room_outline() {
        let out = simplify_room_outline(&noisy_rectangle());
        assert_eq!(out.len(), 4);
        assert!(signed_area(&out).abs() > 4500.0);
    }
}
