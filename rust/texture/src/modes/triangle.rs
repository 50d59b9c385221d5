// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One colour per triangle
//!
//! Each triangle goes through up to three passes: a strict multi-view
//! blend, a relaxed one with looser facing and edge thresholds, and a
//! depth-only lookup of the centroid. Triangles none of them resolve keep
//! the neutral colour.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use roomscan_core::FrameRecord;
use roomscan_geometry::TriangleSoup;

use super::{check_input, Baked, NEUTRAL};
use crate::config::{BakeConfig, PassParams};
use crate::control::{BakeControl, Progress};
use crate::error::Result;
use crate::frames::{FrameLoader, LoadedFrame};
use crate::report::Outcome;
use crate::sample::{bilinear_rgb, edge_weight, median, Rgb};
use crate::scoring::{centroid, facing, unit_normal, Candidate, TopK};
use crate::session::Session;

/// Barycentric sample pattern: centroid, towards each corner, towards each edge
const BARY: [[f32; 3]; 7] = [
    [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
    [0.6, 0.2, 0.2],
    [0.2, 0.6, 0.2],
    [0.2, 0.2, 0.6],
    [0.45, 0.45, 0.1],
    [0.45, 0.1, 0.45],
    [0.1, 0.45, 0.45],
];

const INSET: f32 = 2.0;
const FALLBACK_INSET: f32 = 1.0;

struct Ctx<'a> {
    frames: &'a [LoadedFrame],
    z_sign: f32,
    min_z: f32,
    top_k: usize,
}

fn blend_pass(ctx: &Ctx, tri: &[Point3<f32>; 3], normal: &Vector3<f32>, pass: &PassParams) -> Option<Rgb> {
    let mid = centroid(tri);
    let mut top = TopK::new(ctx.top_k);

    for frame in ctx.frames {
        let face = facing(normal, &mid, &frame.record.camera_position());
        if face < pass.min_facing {
            continue;
        }

        let img = &frame.image.image;
        let mut channels = [[0.0f32; BARY.len()]; 3];
        let mut got = 0;
        let mut edge_sum = 0.0f32;
        let mut best_z = f32::MAX;

        for b in &BARY {
            let p = Point3::from(tri[0].coords * b[0] + tri[1].coords * b[1] + tri[2].coords * b[2]);
            let Some(sp) = frame.to_sensor(&p, ctx.z_sign, ctx.min_z) else {
                continue;
            };
            best_z = best_z.min(sp.depth);
            let Some(hit) = frame.to_image(&sp, INSET) else {
                continue;
            };
            let ew = edge_weight(hit.u, hit.v, img.width(), img.height(), pass.edge_margin_px);
            if ew <= 0.0 {
                continue;
            }
            let rgb = bilinear_rgb(img, hit.u, hit.v);
            for k in 0..3 {
                channels[k][got] = rgb[k];
            }
            edge_sum += ew;
            got += 1;
        }
        if got == 0 {
            continue;
        }

        let rgb = [
            median(&mut channels[0][..got]),
            median(&mut channels[1][..got]),
            median(&mut channels[2][..got]),
        ];
        let face = face.clamp(0.0, 1.0);
        let mut weight = (1.0 / best_z.max(ctx.min_z))
            * face
            * face
            * (edge_sum / got as f32).clamp(0.0, 1.0);
        if got < pass.min_samples {
            weight *= pass.soft_penalty;
        }
        if weight > 0.0 {
            top.push(Candidate { weight, rgb });
        }
    }
    top.blend()
}

/// Closest frame seeing the centroid, ignoring facing and edges
fn depth_fallback(ctx: &Ctx, tri: &[Point3<f32>; 3]) -> Option<Rgb> {
    let mid = centroid(tri);
    let mut best: Option<(f32, Rgb)> = None;
    for frame in ctx.frames {
        let Some(hit) = frame.project(&mid, ctx.z_sign, ctx.min_z, FALLBACK_INSET) else {
            continue;
        };
        let score = 1.0 / hit.depth;
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, bilinear_rgb(&frame.image.image, hit.u, hit.v)));
        }
    }
    best.map(|(_, rgb)| rgb)
}

fn resolve(ctx: &Ctx, config: &BakeConfig, tri: &[Point3<f32>; 3]) -> (Rgb, Outcome) {
    let normal = unit_normal(tri);
    if let Some(rgb) = blend_pass(ctx, tri, &normal, &config.strict) {
        return (rgb, Outcome::Painted);
    }
    if let Some(rgb) = blend_pass(ctx, tri, &normal, &config.relaxed) {
        return (rgb, Outcome::Relaxed);
    }
    if let Some(rgb) = depth_fallback(ctx, tri) {
        return (rgb, Outcome::Fallback);
    }
    ([NEUTRAL; 3], Outcome::Defaulted)
}

/// Bake one colour per triangle, expanded to per-vertex RGB (9 floats per
/// triangle, 0..1)
pub fn bake_triangle_colors(
    soup: &TriangleSoup,
    frames: &[FrameRecord],
    loader: &dyn FrameLoader,
    config: &BakeConfig,
    control: &BakeControl,
) -> Result<Baked<Vec<f32>>> {
    check_input(soup, config, false)?;
    let n = soup.triangle_count();
    let mut session = Session::open(soup, frames, loader, config, false, n);
    let mut colors = vec![NEUTRAL; soup.vertex_count() * 3];

    let ctx = Ctx {
        frames: &session.frames,
        z_sign: session.z_sign,
        min_z: config.min_z,
        top_k: config.top_k,
    };
    let progress = Progress::new(control, n);
    let resolved: Vec<Option<(Rgb, Outcome)>> = (0..n)
        .into_par_iter()
        .map(|t| {
            if control.is_cancelled() {
                return None;
            }
            let result = resolve(&ctx, config, &soup.triangle(t));
            progress.step();
            Some(result)
        })
        .collect();

    let mut interrupted = false;
    for (t, result) in resolved.into_iter().enumerate() {
        let Some((rgb, outcome)) = result else {
            interrupted = true;
            continue;
        };
        for corner in 0..3 {
            let o = (t * 3 + corner) * 3;
            colors[o..o + 3].copy_from_slice(&rgb);
        }
        session.report.record(outcome);
    }
    session.report.cancelled = interrupted;

    Ok(Baked {
        output: colors,
        report: session.finish(),
    })
}
