// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snap an outline to right angles around its dominant wall direction

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Point2;

use crate::polygon::PixelPolygon;

/// Fold an angle into [0, π/2)
#[inline]
fn fold_quarter(mut a: f64) -> f64 {
    a = a.rem_euclid(PI);
    if a >= FRAC_PI_2 {
        a -= FRAC_PI_2;
    }
    a
}

/// Round half up, the way pixel coordinates are rounded elsewhere
#[inline]
fn round_px(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// Length-weighted mean wall direction, in [0, π/2]
///
/// Edge directions are folded into one quadrant and averaged as unit
/// vectors weighted by edge length. Edges shorter than one pixel are
/// ignored.
pub fn dominant_axis(poly: &[Point2<i32>]) -> f64 {
    let n = poly.len();
    let mut sum_cos = 0.0;
    let mut sum_sin = 0.0;
    for i in 0..n {
        let a = &poly[i];
        let b = &poly[(i + 1) % n];
        let dx = (b.x - a.x) as f64;
        let dy = (b.y - a.y) as f64;
        let len2 = dx * dx + dy * dy;
        if len2 < 1.0 {
            continue;
        }
        let folded = fold_quarter(dy.atan2(dx));
        let w = len2.sqrt();
        sum_cos += folded.cos() * w;
        sum_sin += folded.sin() * w;
    }
    sum_sin.atan2(sum_cos)
}

/// Walk the outline from vertex 0, replacing each edge by its projection on
/// whichever of the two axes it is closer to
///
/// Returns the unrounded walk, `n + 1` points including the start.
fn snapped_walk(poly: &[Point2<i32>], base: f64) -> Vec<(f64, f64)> {
    let n = poly.len();
    let axis1 = (base.cos(), base.sin());
    let axis2 = ((base + FRAC_PI_2).cos(), (base + FRAC_PI_2).sin());

    let mut cur = (poly[0].x as f64, poly[0].y as f64);
    let mut walk = Vec::with_capacity(n + 1);
    walk.push(cur);
    for i in 0..n {
        let a = &poly[i];
        let b = &poly[(i + 1) % n];
        let dx = (b.x - a.x) as f64;
        let dy = (b.y - a.y) as f64;
        let p1 = dx * axis1.0 + dy * axis1.1;
        let p2 = dx * axis2.0 + dy * axis2.1;
        if p1.abs() >= p2.abs() {
            cur.0 += axis1.0 * p1;
            cur.1 += axis1.1 * p1;
        } else {
            cur.0 += axis2.0 * p2;
            cur.1 += axis2.1 * p2;
        }
        walk.push(cur);
    }
    walk
}

/// Rectilinear approximation of an outline
///
/// Lossy: skewed edges are forced onto the two dominant axes. The closing
/// vertex is dropped when it lands back on the start. Inputs with fewer
/// than three vertices are returned unchanged.
pub fn orthogonalize(poly: &[Point2<i32>]) -> PixelPolygon {
    if poly.len() < 3 {
        return poly.to_vec();
    }
    let base = dominant_axis(poly);
    let mut out: PixelPolygon = Vec::with_capacity(poly.len() + 1);
    out.push(poly[0]);
    for &(x, y) in snapped_walk(poly, base).iter().skip(1) {
        out.push(Point2::new(round_px(x), round_px(y)));
    }
    if out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}
