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
use crate::sample::{bilinear_rgb, edge_weight, to_rgba, Rgb};
use crate::scoring::{Candidate, TopK};
use crate::session::Session;

const FILL: Rgba<u8> = Rgba([0x3A, 0x3A, 0x3A, 0xFF]);
const INSET: f32 = 2.0;

/// Exposure-corrected blend of the frames seeing a world point
///
/// Views nearer the image centre and closer to the point weigh more.
fn vertex_color(frames: &[LoadedFrame], p: &Point3<f32>, z_sign: f32, config: &BakeConfig) -> Option<Rgb> {
    let mut top = TopK::new(config.top_k);
    for frame in frames {
        let Some(hit) = frame.project(p, z_sign, config.min_z, INSET) else {
            continue;
        };
        let img = &frame.image.image;
        let (w, h) = img.dimensions();
        let ew = edge_weight(hit.u, hit.v, w, h, config.edge_margin_px);
        if ew <= 0.0 {
            continue;
        }
        let rgb = bilinear_rgb(img, hit.u, hit.v).map(|c| (c * frame.gain).clamp(0.0, 1.0));

        let (cx, cy) = (w as f32 * 0.5, h as f32 * 0.5);
        let dx = (hit.u - cx) / cx;
        let dy = (hit.v - cy) / cy;
        let center = (1.0 - (dx * dx + dy * dy)).clamp(0.0, 1.0);

        let weight = (1.0 / hit.depth) * ew * (0.25 + 0.75 * center);
        top.push(Candidate { weight, rgb });
    }
    top.blend()
}

/// Bake a UV texture by interpolating per-vertex colours across each
/// triangle's UV footprint
///
/// Triangles whose three corners are all unseen are skipped and keep the
/// dark fill; a corner that is unseen borrows the colour of a seen one.
pub fn bake_uv_gouraud(
    soup: &TriangleSoup,
    frames: &[FrameRecord],
    loader: &dyn FrameLoader,
    config: &BakeConfig,
    control: &BakeControl,
) -> Result<Baked<RgbaImage>> {
    check_input(soup, config, true)?;
    let n = soup.triangle_count();
    let mut session = Session::open(soup, frames, loader, config, true, n);

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

        let [a, b, c] = soup.triangle(t);
        let corners = [a, b, c].map(|p| vertex_color(&session.frames, &p, session.z_sign, config));
        let Some(first) = corners.iter().flatten().next().copied() else {
            session.report.record(Outcome::Defaulted);
            continue;
        };
        let ca = corners[0].unwrap_or(first);
        let cb = corners[1].unwrap_or(ca);
        let cc = corners[2].unwrap_or(ca);

        let Some(tri) = UvTriangle::new(soup.triangle_uvs(t), tex.width(), tex.height()) else {
            session.report.record(Outcome::Defaulted);
            continue;
        };
        let coverage = rasterize(&mut tex, &tri, control, |w| {
            let rgb: Rgb = std::array::from_fn(|k| ca[k] * w[0] + cb[k] * w[1] + cc[k] * w[2]);
            Some(to_rgba(&rgb))
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
