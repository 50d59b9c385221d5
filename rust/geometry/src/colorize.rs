// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex colours from the scanned point cloud

use rayon::prelude::*;
use roomscan_core::PointCloud;
use serde::{Deserialize, Serialize};

/// Colour of vertices with no nearby cloud point
pub const NEUTRAL_GRAY: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorizeParams {
    /// Search radius in the XZ plane (meters)
    pub max_dist: f32,
    /// Cloud points further than this in height are ignored
    pub max_dy: f32,
    /// Only every n-th cloud point is considered
    pub sample_step: usize,
}

impl Default for ColorizeParams {
    fn default() -> Self {
        Self {
            max_dist: 0.25,
            max_dy: 0.6,
            sample_step: 2,
        }
    }
}

/// Per-vertex RGB (0..1) from the nearest cloud point in XZ
pub fn colorize_by_nearest_point(
    positions: &[f32],
    cloud: &PointCloud,
    params: &ColorizeParams,
) -> Vec<f32> {
    let max_d2 = params.max_dist * params.max_dist;
    let step = params.sample_step.max(1);

    positions
        .par_chunks_exact(3)
        .flat_map_iter(|v| {
            let mut best = None;
            let mut best_d2 = f32::INFINITY;
            for i in (0..cloud.len()).step_by(step) {
                let [cx, cy, cz] = cloud.point(i);
                let dx = cx - v[0];
                let dz = cz - v[2];
                let d2 = dx * dx + dz * dz;
                if d2 < best_d2 && d2 <= max_d2 && (cy - v[1]).abs() < params.max_dy {
                    best_d2 = d2;
                    best = Some(i);
                }
            }
            match best {
                Some(i) => cloud.color(i).map(|c| c as f32 / 255.0),
                None => [NEUTRAL_GRAY; 3],
            }
        })
        .collect()
}

/// Flat shades for floor and ceiling vertices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceOverride {
    pub floor_y: f32,
    pub ceiling_y: f32,
    pub eps: f32,
    pub floor_shade: f32,
    pub ceiling_shade: f32,
}

impl Default for SurfaceOverride {
    fn default() -> Self {
        Self {
            floor_y: 0.0,
            ceiling_y: 2.7,
            eps: 0.02,
            floor_shade: 0.35,
            ceiling_shade: 0.85,
        }
    }
}

/// Paint vertices lying on the floor or ceiling height with flat grays
pub fn override_horizontal_surfaces(colors: &mut [f32], positions: &[f32], o: &SurfaceOverride) {
    for (c, p) in colors.chunks_exact_mut(3).zip(positions.chunks_exact(3)) {
        let y = p[1];
        if (y - o.floor_y).abs() < o.eps {
            c.fill(o.floor_shade);
        } else if (y - o.ceiling_y).abs() < o.eps {
            c.fill(o.ceiling_shade);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cloud() -> PointCloud {
        let mut cloud = PointCloud::with_capacity(4, true);
        cloud.push([0.0, 1.0, 0.0], [255, 0, 0]);
        cloud.push([9.0, 9.0, 9.0], [0, 0, 0]);
        cloud.push([0.1, 1.0, 0.0], [0, 255, 0]);
        cloud.push([9.0, 9.0, 9.0], [0, 0, 0]);
        cloud
    }

    #[test]
    fn test_nearest_point_with_sampling_step() {
        // Point 2 is nearer to x = 0.1 but both samples (0, 2) are considered
        let colors = colorize_by_nearest_point(&[0.09, 1.0, 0.0], &cloud(), &ColorizeParams::default());
        assert_eq!(colors, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_far_vertices_stay_neutral() {
        let positions = [5.0, 1.0, 5.0, 0.0, 3.0, 0.0];
        let colors = colorize_by_nearest_point(&positions, &cloud(), &ColorizeParams::default());
        for c in colors {
            assert_relative_eq!(c, NEUTRAL_GRAY);
        }
    }

    #[test]
    fn test_surface_override() {
        let positions = [0.0, 0.0, 0.0, 0.0, 1.3, 0.0, 0.0, 2.69, 0.0];
        let mut colors = vec![0.5; 9];
        override_horizontal_surfaces(&mut colors, &positions, &SurfaceOverride::default());
        assert_eq!(colors, vec![0.35, 0.35, 0.35, 0.5, 0.5, 0.5, 0.85, 0.85, 0.85]);
    }
}
