// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room extrusion
//!
//! Turns a world-space outline (points in the XZ plane, Y up) into walls,
//! a floor at Y = 0 and a ceiling at the wall height.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::polygon::{perimeter, signed_area};
use crate::triangulation::triangulate;

/// How surfaces share the texture atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UvLayout {
    /// Walls span the full atlas; floor and ceiling reuse it by XZ position
    #[default]
    Shared,
    /// Walls in the top half, floor bottom-left, ceiling bottom-right
    Packed,
}

impl UvLayout {
    #[inline]
    fn wall(self, u: f32, v: f32) -> (f32, f32) {
        match self {
            UvLayout::Shared => (u, v),
            UvLayout::Packed => (u, 0.5 + 0.5 * v),
        }
    }

    #[inline]
    fn floor(self, u: f32, v: f32) -> (f32, f32) {
        match self {
            UvLayout::Shared => (u, v),
            UvLayout::Packed => (0.5 * u, 0.5 * v),
        }
    }

    #[inline]
    fn ceiling(self, u: f32, v: f32) -> (f32, f32) {
        match self {
            UvLayout::Shared => (u, v),
            UvLayout::Packed => (0.5 + 0.5 * u, 0.5 * v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrudeConfig {
    /// Wall height (meters)
    pub height: f64,
    /// Target wall strip width (meters)
    pub wall_step: f64,
    pub uv_layout: UvLayout,
}

impl Default for ExtrudeConfig {
    fn default() -> Self {
        Self {
            height: 2.7,
            wall_step: 0.10,
            uv_layout: UvLayout::Shared,
        }
    }
}

/// Number of wall strips for an edge
#[inline]
pub fn wall_steps(edge_len: f64, wall_step: f64) -> usize {
    ((edge_len / wall_step) as usize).max(1)
}

/// Floor facing +Y and ceiling facing -Y over the same triangulation
fn add_caps(mesh: &mut Mesh, poly: &[Point2<f64>], triangles: &[[usize; 3]], height: f64, layout: UvLayout) {
    let (min_x, max_x, min_z, max_z) = poly.iter().fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(x0, x1, z0, z1), p| (x0.min(p.x), x1.max(p.x), z0.min(p.y), z1.max(p.y)),
    );
    let range_x = (max_x - min_x).max(1e-6);
    let range_z = (max_z - min_z).max(1e-6);
    let planar_uv = |p: &Point2<f64>| {
        (
            ((p.x - min_x) / range_x).clamp(0.0, 1.0) as f32,
            ((p.y - min_z) / range_z).clamp(0.0, 1.0) as f32,
        )
    };

    let floor_base = mesh.vertex_count() as u32;
    for p in poly {
        let (u, v) = planar_uv(p);
        let (u, v) = layout.floor(u, v);
        mesh.add_vertex(Point3::new(p.x, 0.0, p.y), u, v);
    }
    for t in triangles {
        let [a, b, c] = t.map(|i| floor_base + i as u32);
        mesh.add_triangle(a, c, b);
    }

    let ceiling_base = mesh.vertex_count() as u32;
    for p in poly {
        let (u, v) = planar_uv(p);
        let (u, v) = layout.ceiling(u, v);
        mesh.add_vertex(Point3::new(p.x, height, p.y), u, v);
    }
    for t in triangles {
        let [a, b, c] = t.map(|i| ceiling_base + i as u32);
        mesh.add_triangle(a, b, c);
    }
}

/// Extrude a room outline into walls, floor and ceiling
///
/// The outline is re-oriented counter-clockwise (viewed from +Y looking
/// down with X right and Z up) so that walls face the room interior. Each
/// edge is cut into strips about `wall_step` wide; wall U runs along the
/// perimeter and V from floor (0) to ceiling (1). Floor triangles face +Y
/// and ceiling triangles use the reversed winding, facing −Y. Floor and
/// ceiling UVs are XZ normalised within the outline's bounding box.
///
/// An outline the ear clipper cannot cut (collinear or self-intersecting)
/// still yields its walls, without floor or ceiling.
///
/// Vertex normals are computed before returning.
pub fn extrude_room(outline: &[Point2<f64>], config: &ExtrudeConfig) -> Result<Mesh> {
    if outline.len() < 3 {
        return Err(Error::InvalidPolygon(format!(
            "need at least 3 points, got {}",
            outline.len()
        )));
    }
    if outline.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(Error::InvalidPolygon("non-finite coordinate".into()));
    }
    if !(config.height > 0.0) || !(config.wall_step > 0.0) {
        return Err(Error::InvalidExtrusion(format!(
            "height {} and wall step {} must be positive",
            config.height, config.wall_step
        )));
    }

    let mut poly = outline.to_vec();
    if signed_area(&poly) < 0.0 {
        poly.reverse();
    }
    let n = poly.len();
    let height = config.height;
    let layout = config.uv_layout;

    let edge_len: Vec<f64> = (0..n)
        .map(|i| (poly[(i + 1) % n] - poly[i]).norm().max(1e-6))
        .collect();
    let total = perimeter(&poly).max(1e-6);

    let wall_quads: usize = edge_len.iter().map(|&l| wall_steps(l, config.wall_step)).sum();
    let mut mesh = Mesh::with_capacity(wall_quads * 4 + n * 2, wall_quads * 6 + n * 6);

    // Walls
    let mut acc_len = 0.0;
    for i in 0..n {
        let a = poly[i];
        let d = poly[(i + 1) % n] - a;
        let len = edge_len[i];
        let steps = wall_steps(len, config.wall_step);

        for s in 0..steps {
            let t0 = s as f64 / steps as f64;
            let t1 = (s + 1) as f64 / steps as f64;
            let p0 = a + d * t0;
            let p1 = a + d * t1;
            let u0 = ((acc_len + len * t0) / total) as f32;
            let u1 = ((acc_len + len * t1) / total) as f32;

            let (bu0, bv) = layout.wall(u0, 0.0);
            let (tu0, tv) = layout.wall(u0, 1.0);
            let (tu1, _) = layout.wall(u1, 1.0);
            let (bu1, _) = layout.wall(u1, 0.0);

            let bl = mesh.add_vertex(Point3::new(p0.x, 0.0, p0.y), bu0, bv);
            let tl = mesh.add_vertex(Point3::new(p0.x, height, p0.y), tu0, tv);
            let tr = mesh.add_vertex(Point3::new(p1.x, height, p1.y), tu1, tv);
            let br = mesh.add_vertex(Point3::new(p1.x, 0.0, p1.y), bu1, bv);

            mesh.add_triangle(bl, tr, tl);
            mesh.add_triangle(bl, br, tr);
        }
        acc_len += len;
    }
    let wall_triangles = mesh.triangle_count();

    // Floor and ceiling
    let triangles = triangulate(&poly);
    if triangles.is_empty() {
        tracing::warn!(corners = n, "outline has no ears, emitting walls only");
    } else {
        add_caps(&mut mesh, &poly, &triangles, height, layout);
    }

    mesh.compute_normals();

    tracing::debug!(
        corners = n,
        wall_triangles,
        cap_triangles = triangles.len(),
        vertices = mesh.vertex_count(),
        "extruded room"
    );

    Ok(mesh)
}
