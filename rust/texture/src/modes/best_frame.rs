// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use image::{Rgba, RgbaImage};
use nalgebra::Point3;
use roomscan_core::FrameRecord;
use roomscan_geometry::TriangleSoup;

use super::{check_input, filled_texture, Baked, EMPTY_FILL};
use crate::config::BakeConfig;
use crate::control::{BakeControl, Progress};
use crate::error::Result;
use crate::frames::{FrameLoader, LoadedFrame};
use crate::raster::{rasterize, UvTriangle};
use crate::report::Outcome;
use crate::sample::{bilinear_rgb, to_rgba};
use crate::scoring::{centroid, facing, unit_normal};
use crate::session::Session;

const FILL: Rgba<u8> = Rgba([0x2F, 0x2F, 0x2F, 0xFF]);
const MAX_SCORE: f32 = 10.0;

/// Frames seeing `p` well inside their border, nearest first
fn nearest_frames<'a>(
    frames: &'a [LoadedFrame],
    p: &Point3<f32>,
    z_sign: f32,
    config: &BakeConfig,
) -> Vec<&'a LoadedFrame> {
    let mut scored: Vec<(f32, &LoadedFrame)> = frames
        .iter()
        .filter_map(|f| {
            let hit = f.project(p, z_sign, config.min_z, config.edge_margin_px)?;
            Some(((1.0 / hit.depth).clamp(0.0, MAX_SCORE), f))
        })
        .collect();
    // Stable: equally close frames keep capture order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(config.top_k)
        .map(|(_, f)| f)
        .collect()
}

/// Bake a UV texture where every texel takes its colour from the first of
/// the triangle's preferred frames that sees it
pub fn bake_uv_best_frame(
    soup: &TriangleSoup,
    frames: &[FrameRecord],
    loader: &dyn FrameLoader,
    config: &BakeConfig,
    control: &BakeControl,
) -> Result<Baked<RgbaImage>> {
    check_input(soup, config, true)?;
    let n = soup.triangle_count();
    let mut session = Session::open(soup, frames, loader, config, false, n);

    if session.frames.is_empty() {
        session.report.defaulted = n;
        return Ok(Baked {
            output: filled_texture(config, EMPTY_FILL),
            report: session.finish(),
        });
    }

    let mut tex = filled_texture(config, FILL);
    let progress = Progress::new(control, n);
    let mut interrupted = false;
    for t in 0..n {
        if control.is_cancelled() {
            interrupted = true;
            break;
        }
        progress.step();

        let tri = soup.triangle(t);
        let Some(uv_tri) = UvTriangle::new(soup.triangle_uvs(t), tex.width(), tex.height()) else {
            session.report.record(Outcome::Defaulted);
            continue;
        };

        let mid = centroid(&tri);
        let normal = unit_normal(&tri);
        let preferred: Vec<&LoadedFrame> = nearest_frames(&session.frames, &mid, session.z_sign, config)
            .into_iter()
            .filter(|f| facing(&normal, &mid, &f.record.camera_position()) > config.min_facing)
            .collect();
        if preferred.is_empty() {
            session.report.record(Outcome::Defaulted);
            continue;
        }

        let z_sign = session.z_sign;
        let coverage = rasterize(&mut tex, &uv_tri, control, |w| {
            let p = Point3::from(tri[0].coords * w[0] + tri[1].coords * w[1] + tri[2].coords * w[2]);
            preferred.iter().find_map(|f| {
                let hit = f.project(&p, z_sign, config.min_z, config.edge_margin_px)?;
                Some(to_rgba(&bilinear_rgb(&f.image.image, hit.u, hit.v)))
            })
        });
        if !coverage.is_complete() {
            interrupted = true;
            break;
        }
        session.report.record(Outcome::Painted);
    }
    session.report.cancelled = interrupted;

    Ok(Baked {
        output: tex,
        report: session.finish(),
    })
}
