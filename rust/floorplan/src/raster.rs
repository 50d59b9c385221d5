// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor band selection and occupancy rasterization

use image::{GrayImage, Luma};
use roomscan_core::PointCloud;

use crate::types::{FloorBand, FloorplanConfig, GridMapping};

/// Occupied pixel value in masks
pub const OCCUPIED: u8 = 255;

/// Height band between the configured percentiles of all point heights
///
/// Biases the raster towards floor-level returns and away from furniture
/// tops and the ceiling. `cloud` must not be empty.
pub fn floor_band(cloud: &PointCloud, config: &FloorplanConfig) -> FloorBand {
    let mut ys: Vec<f32> = cloud.iter_points().map(|p| p[1]).collect();
    ys.sort_unstable_by(|a, b| a.total_cmp(b));

    let n = ys.len();
    let at = |q: f32| ys[((n as f32 * q) as usize).min(n.saturating_sub(1))];
    let low_y = at(config.band_low);
    let high_y = at(config.band_high);

    let mut band = FloorBand {
        low_y,
        high_y,
        points: 0,
        fallback: false,
    };
    band.points = cloud.iter_points().filter(|p| band.contains(p[1])).count();
    band.fallback = band.points < config.min_band_points;
    band
}

/// Grid covering the band (or the whole cloud after a fallback)
pub fn grid_mapping(cloud: &PointCloud, band: &FloorBand, config: &FloorplanConfig) -> GridMapping {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for p in cloud.iter_points() {
        if !band.fallback && !band.contains(p[1]) {
            continue;
        }
        let xz = [p[0] as f64, p[2] as f64];
        for k in 0..2 {
            min[k] = min[k].min(xz[k]);
            max[k] = max[k].max(xz[k]);
        }
    }

    let range_x = config.min_range.max(max[0] - min[0]);
    let range_z = config.min_range.max(max[1] - min[1]);
    let side = |range: f64| {
        ((range / config.meters_per_pixel) as u32).clamp(config.min_grid_size, config.max_grid_size)
    };

    GridMapping {
        min_x: min[0],
        min_z: min[1],
        range_x,
        range_z,
        width: side(range_x),
        height: side(range_z),
    }
}

/// Mark one pixel per contributing point
pub fn rasterize(cloud: &PointCloud, band: &FloorBand, mapping: &GridMapping) -> GrayImage {
    let mut mask = GrayImage::new(mapping.width, mapping.height);
    for p in cloud.iter_points() {
        if !band.fallback && !band.contains(p[1]) {
            continue;
        }
        let (col, row) = mapping.world_to_pixel(p[0] as f64, p[2] as f64);
        mask.put_pixel(col, row, Luma([OCCUPIED]));
    }
    mask
}

/// Number of non-zero pixels
pub fn count_occupied(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] > 0).count()
}
