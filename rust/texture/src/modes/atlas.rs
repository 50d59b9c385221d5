// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use image::RgbaImage;
use nalgebra::Point3;
use rayon::prelude::*;
use roomscan_core::FrameRecord;
use roomscan_geometry::{AtlasLayout, TriangleSoup};

use super::{check_input, Baked, EMPTY_FILL};
use crate::config::BakeConfig;
use crate::control::{BakeControl, Progress};
use crate::error::Result;
use crate::frames::{FrameLoader, LoadedFrame};
use crate::report::Outcome;
use crate::sample::{bilinear_rgb, edge_weight, to_rgba, Rgb};
use crate::scoring::{centroid, Candidate, TopK};
use crate::session::Session;

const INSET: f32 = 2.0;

fn point_color(frames: &[LoadedFrame], p: &Point3<f32>, z_sign: f32, config: &BakeConfig) -> Option<Rgb> {
    let mut top = TopK::new(config.top_k);
    for frame in frames {
        let Some(hit) = frame.project(p, z_sign, config.min_z, INSET) else {
            continue;
        };
        let img = &frame.image.image;
        let ew = edge_weight(hit.u, hit.v, img.width(), img.height(), config.edge_margin_px);
        if ew <= 0.0 {
            continue;
        }
        top.push(Candidate {
            weight: ew / hit.depth,
            rgb: bilinear_rgb(img, hit.u, hit.v),
        });
    }
    top.blend()
}

/// Paint each triangle's centroid colour into its own square atlas cell
///
/// The atlas is sized by [`AtlasLayout::for_triangles`]; pair it with
/// [`AtlasLayout::triangle_uvs`] for the matching texture coordinates.
pub fn bake_triangle_atlas(
    soup: &TriangleSoup,
    frames: &[FrameRecord],
    loader: &dyn FrameLoader,
    config: &BakeConfig,
    control: &BakeControl,
) -> Result<Baked<RgbaImage>> {
    check_input(soup, config, false)?;
    let n = soup.triangle_count();
    let layout = AtlasLayout::for_triangles(n, config.atlas_cell_size);
    let mut session = Session::open(soup, frames, loader, config, false, n);
    let mut atlas = RgbaImage::from_pixel(layout.width, layout.height, EMPTY_FILL);

    let progress = Progress::new(control, n);
    let loaded = &session.frames;
    let z_sign = session.z_sign;
    let colors: Vec<Option<Option<Rgb>>> = (0..n)
        .into_par_iter()
        .map(|t| {
            if control.is_cancelled() {
                return None;
            }
            let rgb = point_color(loaded, &centroid(&soup.triangle(t)), z_sign, config);
            progress.step();
            Some(rgb)
        })
        .collect();

    let cs = layout.cell_size;
    let mut interrupted = false;
    for (t, color) in colors.into_iter().enumerate() {
        match color {
            Some(Some(rgb)) => {
                let px = to_rgba(&rgb);
                let (x0, y0) = layout.cell_origin(t);
                for y in y0..(y0 + cs).min(layout.height) {
                    for x in x0..(x0 + cs).min(layout.width) {
                        atlas.put_pixel(x, y, px);
                    }
                }
                session.report.record(Outcome::Painted);
            }
            Some(None) => session.report.record(Outcome::Defaulted),
            None => interrupted = true,
        }
    }
    session.report.cancelled = interrupted;

    Ok(Baked {
        output: atlas,
        report: session.finish(),
    })
}
