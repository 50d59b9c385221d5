// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use nalgebra::Point3;
use rayon::prelude::*;
use roomscan_core::FrameRecord;
use roomscan_geometry::TriangleSoup;

use super::{check_input, Baked, NEUTRAL};
use crate::config::BakeConfig;
use crate::control::{BakeControl, Progress};
use crate::error::Result;
use crate::frames::{FrameLoader, LoadedFrame};
use crate::report::Outcome;
use crate::sample::{bilinear_rgb, Rgb};
use crate::session::Session;

const INSET: f32 = 2.0;

/// Push channels away from their mean, then brighten
fn boost(rgb: Rgb, saturation: f32, brightness: f32) -> Rgb {
    let mean = (rgb[0] + rgb[1] + rgb[2]) / 3.0;
    rgb.map(|c| {
        let c = (mean + (c - mean) * saturation).clamp(0.0, 1.0);
        (c * brightness).clamp(0.0, 1.0)
    })
}

fn nearest_view(frames: &[LoadedFrame], p: &Point3<f32>, z_sign: f32, config: &BakeConfig) -> Option<Rgb> {
    frames
        .iter()
        .filter_map(|f| f.project(p, z_sign, config.min_z, INSET).map(|hit| (hit, f)))
        // First of equally near frames wins
        .fold(None, |best: Option<(f32, Rgb)>, (hit, f)| {
            let score = 1.0 / hit.depth;
            match best {
                Some((s, _)) if s >= score => best,
                _ => Some((score, bilinear_rgb(&f.image.image, hit.u, hit.v))),
            }
        })
        .map(|(_, rgb)| boost(rgb, config.saturation_boost, config.brightness_boost))
}

/// Colour every vertex from the nearest frame that sees it (RGB 0..1,
/// 3 floats per vertex)
pub fn bake_vertex_colors(
    soup: &TriangleSoup,
    frames: &[FrameRecord],
    loader: &dyn FrameLoader,
    config: &BakeConfig,
    control: &BakeControl,
) -> Result<Baked<Vec<f32>>> {
    check_input(soup, config, false)?;
    let n = soup.vertex_count();
    let mut session = Session::open(soup, frames, loader, config, false, n);

    let progress = Progress::new(control, n);
    let loaded = &session.frames;
    let z_sign = session.z_sign;
    let resolved: Vec<Option<Option<Rgb>>> = (0..n)
        .into_par_iter()
        .map(|v| {
            if control.is_cancelled() {
                return None;
            }
            let rgb = nearest_view(loaded, &soup.vertex(v), z_sign, config);
            progress.step();
            Some(rgb)
        })
        .collect();

    let mut colors = vec![NEUTRAL; n * 3];
    let mut interrupted = false;
    for (v, result) in resolved.into_iter().enumerate() {
        match result {
            Some(Some(rgb)) => {
                colors[v * 3..v * 3 + 3].copy_from_slice(&rgb);
                session.report.record(Outcome::Painted);
            }
            Some(None) => session.report.record(Outcome::Defaulted),
            None => interrupted = true,
        }
    }
    session.report.cancelled = interrupted;

    Ok(Baked {
        output: colors,
        report: session.finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_boost_leaves_gray_hue() {
        let c = boost([0.5, 0.5, 0.5], 1.4, 1.1);
        assert_relative_eq!(c[0], 0.55);
        assert_relative_eq!(c[2], 0.55);
    }

    #[test]
    fn test_boost_saturates() {
        let c = boost([0.6, 0.3, 0.3], 1.4, 1.0);
        // mean 0.4: 0.4 + 0.2 * 1.4 = 0.68, 0.4 - 0.1 * 1.4 = 0.26
        assert_relative_eq!(c[0], 0.68, epsilon = 1e-6);
        assert_relative_eq!(c[1], 0.26, epsilon = 1e-6);
    }
}
