// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation utilities
//!
//! Ear clipping for simple polygons without holes. Self-intersecting or
//! degenerate outlines don't fail: clipping stops when no ear is left and
//! the triangles found so far are returned.

use nalgebra::Point2;

use crate::polygon::signed_area;

/// Upper bound on clipping rounds
const MAX_ITERATIONS: usize = 10_000;

#[inline]
fn is_convex(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    cross > 1e-6
}

/// Barycentric point-in-triangle test, boundary inclusive
#[inline]
fn point_in_triangle(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let den = v0.x * v1.y - v1.x * v0.y;
    if den.abs() < 1e-8 {
        return false;
    }
    let u = (v2.x * v1.y - v1.x * v2.y) / den;
    let v = (v0.x * v2.y - v2.x * v0.y) / den;
    u >= 0.0 && v >= 0.0 && u + v <= 1.0
}

/// Triangulate a simple polygon (no holes)
///
/// Returns triangles as indices into `points`, wound counter-clockwise
/// (the input order is reversed first when it is clockwise). Fewer than
/// three points give no triangles.
pub fn triangulate(points: &[Point2<f64>]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let mut active: Vec<usize> = (0..n).collect();
    if signed_area(points) < 0.0 {
        active.reverse();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    let mut guard = 0;

    while active.len() > 3 && guard < MAX_ITERATIONS {
        let m = active.len();
        let ear = (0..m).find(|&i| {
            let i0 = active[(i + m - 1) % m];
            let i1 = active[i];
            let i2 = active[(i + 1) % m];
            let (a, b, c) = (&points[i0], &points[i1], &points[i2]);
            if !is_convex(a, b, c) {
                return false;
            }
            !active
                .iter()
                .filter(|&&j| j != i0 && j != i1 && j != i2)
                .any(|&j| point_in_triangle(&points[j], a, b, c))
        });

        let Some(i) = ear else {
            break;
        };
        triangles.push([active[(i + m - 1) % m], active[i], active[(i + 1) % m]]);
        active.remove(i);
        guard += 1;
    }

    if active.len() == 3 {
        triangles.push([active[0], active[1], active[2]]);
    }

    triangles
}
