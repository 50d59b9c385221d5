// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth-range filtering and voxel-grid down-sampling of camera-space clouds

use crate::voxel::VoxelGrid;
use roomscan_core::PointCloud;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Nearest kept depth in front of the camera (meters)
    pub min_depth: f32,
    /// Farthest kept depth (meters)
    pub max_depth: f32,
    /// Down-sampling voxel size (meters)
    pub voxel_size: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_depth: 0.25,
            max_depth: 6.0,
            voxel_size: 0.02,
        }
    }
}

/// Keep points whose depth (`-z`, camera looks down −Z) lies in range, then
/// average the survivors per voxel
///
/// Output is sorted by voxel key.
pub fn filter_and_downsample(points: &[f32], config: &FilterConfig) -> Vec<f32> {
    let mut grid = VoxelGrid::new(config.voxel_size);
    for p in points.chunks_exact(3) {
        let depth = -p[2];
        if depth >= config.min_depth && depth <= config.max_depth {
            grid.insert([p[0], p[1], p[2]], [0; 3]);
        }
    }
    grid.sorted_cells()
        .iter()
        .flat_map(|(_, cell)| cell.mean_position())
        .collect()
}

/// Voxel-average a world-space cloud, averaging colours as well
///
/// No depth filter is applied.
pub fn downsample_cloud(cloud: &PointCloud, voxel_size: f32) -> PointCloud {
    let mut grid = VoxelGrid::new(voxel_size);
    for i in 0..cloud.len() {
        grid.insert(cloud.point(i), cloud.color(i));
    }
    let cells = grid.sorted_cells();
    let mut out = PointCloud::with_capacity(cells.len(), cloud.colors.is_some());
    for (_, cell) in &cells {
        out.push(cell.mean_position(), cell.mean_color());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_depth_window() {
        let points = [
            0.0, 0.0, -0.1, // too close
            0.0, 0.0, -1.0, // kept
            0.0, 0.0, -7.0, // too far
            0.0, 0.0, 1.0, // behind the camera
        ];
        let out = filter_and_downsample(&points, &FilterConfig::default());
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[2], -1.0);
    }

    #[test]
    fn test_voxel_average() {
        let points = [0.001, 0.001, -1.001, 0.003, 0.005, -1.003];
        let out = filter_and_downsample(&points, &FilterConfig::default());
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[0], 0.002, epsilon = 1e-6);
        assert_relative_eq!(out[1], 0.003, epsilon = 1e-6);
        assert_relative_eq!(out[2], -1.002, epsilon = 1e-6);
    }

    #[test]
    fn test_downsample_cloud_keeps_colour() {
        let mut cloud = PointCloud::with_capacity(3, true);
        cloud.push([0.001, 0.0, 0.0], [100, 0, 0]);
        cloud.push([0.002, 0.0, 0.0], [200, 0, 0]);
        cloud.push([1.0, 0.0, 0.0], [0, 0, 50]);
        let out = downsample_cloud(&cloud, 0.02);
        assert_eq!(out.len(), 2);
        assert_eq!(out.color(0), [150, 0, 0]);
    }
}
