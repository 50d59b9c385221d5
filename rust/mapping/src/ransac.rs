// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor-plane detection with RANSAC
//!
//! Looks for the dominant near-horizontal plane lying below the cloud
//! centre. Sampling uses a fixed seed so repeated runs agree.

use nalgebra::Vector3;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    pub iterations: usize,
    /// Point-to-plane distance below which a point is an inlier (meters)
    pub inlier_threshold: f32,
    /// Minimum |normal.y| of an accepted plane
    pub min_normal_y: f32,
    /// Clouds smaller than this are not searched
    pub min_points: usize,
    /// Absolute floor on the winning inlier count
    pub min_inliers: usize,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            iterations: 250,
            inlier_threshold: 0.03,
            min_normal_y: 0.85,
            min_points: 200,
            min_inliers: 500,
            seed: 7,
        }
    }
}

/// Plane `a·x + b·y + c·z + d = 0` with unit normal `(a, b, c)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: [f32; 3],
    pub d: f32,
}

impl Plane {
    #[inline]
    pub fn distance(&self, p: &[f32]) -> f32 {
        (self.normal[0] * p[0] + self.normal[1] * p[1] + self.normal[2] * p[2] + self.d).abs()
    }

    /// Height of the plane above the origin (`x = z = 0`)
    #[inline]
    pub fn height_at_origin(&self) -> f32 {
        -self.d / self.normal[1]
    }
}

#[derive(Debug, Clone)]
pub struct FloorPlane {
    pub plane: Plane,
    pub inlier_mask: Vec<bool>,
    pub inlier_count: usize,
}

fn count_inliers(points: &[f32], plane: &Plane, threshold: f32) -> usize {
    points
        .chunks_exact(3)
        .filter(|p| plane.distance(p) < threshold)
        .count()
}

/// Find the floor plane of an interleaved `x, y, z` cloud
///
/// Returns `None` for clouds under `min_points`, or when the best plane has
/// fewer than `max(min_inliers, n / 30)` inliers.
pub fn find_floor_plane(points: &[f32], center_y: f32, config: &RansacConfig) -> Option<FloorPlane> {
    let n = points.len() / 3;
    if n < config.min_points {
        return None;
    }

    let point = |i: usize| Vector3::new(points[i * 3], points[i * 3 + 1], points[i * 3 + 2]);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<(Plane, usize)> = None;

    for _ in 0..config.iterations {
        let i1 = rng.random_range(0..n);
        let i2 = rng.random_range(0..n);
        let i3 = rng.random_range(0..n);
        if i1 == i2 || i1 == i3 || i2 == i3 {
            continue;
        }

        let p1 = point(i1);
        let cross = (point(i2) - p1).cross(&(point(i3) - p1));
        let norm = cross.norm();
        if norm < 1e-6 {
            continue;
        }
        let normal = cross / norm;
        if normal.y.abs() < config.min_normal_y {
            continue;
        }

        let plane = Plane {
            normal: [normal.x, normal.y, normal.z],
            d: -normal.dot(&p1),
        };
        if plane.height_at_origin() > center_y {
            continue;
        }

        let count = count_inliers(points, &plane, config.inlier_threshold);
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((plane, count));
        }
    }

    let (plane, count) = best?;
    if count < config.min_inliers.max(n / 30) {
        tracing::debug!(inliers = count, "floor plane rejected");
        return None;
    }

    let inlier_mask: Vec<bool> = points
        .chunks_exact(3)
        .map(|p| plane.distance(p) < config.inlier_threshold)
        .collect();
    let inlier_count = inlier_mask.iter().filter(|&&b| b).count();

    Some(FloorPlane {
        plane,
        inlier_mask,
        inlier_count,
    })
}
