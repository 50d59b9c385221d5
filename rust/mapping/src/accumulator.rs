// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! World map accumulation
//!
//! Folds tracked frames (camera pose + camera-local points) into a sparse
//! voxel map. Frames are gated by motion so that standing still does not
//! grow the map, and each accepted frame is stride-subsampled to a fixed
//! point budget.

use crate::error::{Error, Result};
use crate::voxel::VoxelGrid;
use nalgebra::Point3;
use roomscan_core::{PointCloud, Pose, TrajectorySample};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::Path;

/// Accumulator tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Minimum camera translation between keyframes (meters)
    pub min_move_meters: f32,
    /// Minimum heading change between keyframes (radians)
    pub min_turn_rad: f32,
    /// Voxel edge length (meters)
    pub voxel_size: f32,
    /// Points kept per frame before stride subsampling kicks in
    pub point_budget: usize,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            min_move_meters: 0.25,
            min_turn_rad: 0.20,
            voxel_size: 0.03,
            point_budget: 2500,
        }
    }
}

impl AccumulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.voxel_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "voxel_size must be positive, got {}",
                self.voxel_size
            )));
        }
        if self.point_budget == 0 {
            return Err(Error::InvalidConfig("point_budget must be at least 1".into()));
        }
        Ok(())
    }
}

/// What happened to a frame passed to [`WorldMapAccumulator::add_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Accepted { points_used: usize, new_voxels: usize },
    NotRunning,
    BelowMotionThreshold,
}

#[derive(Debug, Clone, Copy)]
struct Keyframe {
    position: [f32; 3],
    yaw: f32,
}

/// Wrap an angle difference into [-π, π]
#[inline]
pub fn wrap_angle(mut d: f32) -> f32 {
    while d > PI {
        d -= 2.0 * PI;
    }
    while d < -PI {
        d += 2.0 * PI;
    }
    d
}

/// Deterministic colour from world height
///
/// Heights from -1.5 m to 1.5 m run blue → green → red.
#[inline]
pub fn height_color(y: f32) -> [u8; 3] {
    let t = ((y + 1.5) / 3.0).clamp(0.0, 1.0);
    [
        (255.0 * t) as u8,
        (255.0 * (1.0 - (t - 0.5).abs() * 2.0)) as u8,
        (255.0 * (1.0 - t)) as u8,
    ]
}

/// Sparse voxel world map with a keyframe trajectory
///
/// Owned by the caller; one capture session at a time. `start()` clears all
/// data, `stop()` only halts intake.
#[derive(Debug, Clone)]
pub struct WorldMapAccumulator {
    config: AccumulatorConfig,
    grid: VoxelGrid,
    trajectory: Vec<TrajectorySample>,
    last_keyframe: Option<Keyframe>,
    running: bool,
}

impl Default for WorldMapAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldMapAccumulator {
    pub fn new() -> Self {
        let config = AccumulatorConfig::default();
        Self {
            grid: VoxelGrid::new(config.voxel_size),
            config,
            trajectory: Vec::new(),
            last_keyframe: None,
            running: false,
        }
    }

    pub fn with_config(config: AccumulatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            grid: VoxelGrid::new(config.voxel_size),
            config,
            trajectory: Vec::new(),
            last_keyframe: None,
            running: false,
        })
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Clear everything and begin accepting frames
    pub fn start(&mut self) {
        self.reset();
        self.running = true;
    }

    /// Stop accepting frames; accumulated data is kept
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Clear map, trajectory and keyframe memory without changing the
    /// running state
    pub fn reset(&mut self) {
        self.grid.clear();
        self.trajectory.clear();
        self.last_keyframe = None;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Add a frame with no timestamp
    pub fn add_frame(&mut self, pose: &Pose, local_points: &[f32]) -> FrameOutcome {
        self.add_frame_at(0.0, pose, local_points)
    }

    /// Add a frame of camera-local `x, y, z` points observed at `pose`
    ///
    /// `timestamp` (seconds) is only recorded in the trajectory.
    pub fn add_frame_at(&mut self, timestamp: f64, pose: &Pose, local_points: &[f32]) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::NotRunning;
        }

        let t = pose.translation();
        let keyframe = Keyframe {
            position: [t.x, t.y, t.z],
            yaw: pose.yaw(),
        };

        if let Some(last) = self.last_keyframe {
            let dx = keyframe.position[0] - last.position[0];
            let dy = keyframe.position[1] - last.position[1];
            let dz = keyframe.position[2] - last.position[2];
            let moved = (dx * dx + dy * dy + dz * dz).sqrt();
            let turned = wrap_angle(keyframe.yaw - last.yaw).abs();
            if moved < self.config.min_move_meters && turned < self.config.min_turn_rad {
                return FrameOutcome::BelowMotionThreshold;
            }
        }

        self.last_keyframe = Some(keyframe);
        self.trajectory
            .push(TrajectorySample::new(timestamp, keyframe.position));

        let n = local_points.len() / 3;
        let stride = (n / self.config.point_budget).max(1);
        let mut points_used = 0;
        let mut new_voxels = 0;

        for p in local_points.chunks_exact(3).step_by(stride) {
            let world = pose.transform_point(&Point3::new(p[0], p[1], p[2]));
            let w = [world.x, world.y, world.z];
            if self.grid.insert(w, height_color(w[1])) {
                new_voxels += 1;
            }
            points_used += 1;
        }

        tracing::debug!(
            keyframe = self.trajectory.len(),
            points_used,
            new_voxels,
            voxels = self.grid.len(),
            "accepted keyframe"
        );

        FrameOutcome::Accepted {
            points_used,
            new_voxels,
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.grid.len()
    }

    pub fn keyframe_count(&self) -> usize {
        self.trajectory.len()
    }

    pub fn trajectory(&self) -> &[TrajectorySample] {
        &self.trajectory
    }

    /// Mean position and colour of every voxel, sorted by voxel key
    pub fn point_cloud(&self) -> PointCloud {
        let cells = self.grid.sorted_cells();
        let mut cloud = PointCloud::with_capacity(cells.len(), true);
        for (_, cell) in &cells {
            cloud.push(cell.mean_position(), cell.mean_color());
        }
        cloud
    }

    pub fn save_ply(&self, path: impl AsRef<Path>) -> Result<()> {
        let cloud = self.point_cloud();
        roomscan_core::ply::save_point_cloud(path, &cloud)?;
        tracing::info!(points = cloud.len(), "saved world map");
        Ok(())
    }

    pub fn save_trajectory(&self, path: impl AsRef<Path>) -> Result<()> {
        roomscan_core::trajectory::save_trajectory(path, &self.trajectory)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};

    fn yaw_pose(angle: f32, t: [f32; 3]) -> Pose {
        let (s, c) = angle.sin_cos();
        let r = Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);
        Pose::from_parts(&r, Vector3::new(t[0], t[1], t[2]))
    }

    #[test]
    fn test_not_running_is_noop() {
        let mut acc = WorldMapAccumulator::new();
        let outcome = acc.add_frame(&Pose::IDENTITY, &[0.0, 0.0, 0.0]);
        assert_eq!(outcome, FrameOutcome::NotRunning);
        assert_eq!(acc.voxel_count(), 0);
    }

    #[test]
    fn test_first_frame_always_accepted() {
        let mut acc = WorldMapAccumulator::new();
        acc.start();
        let outcome = acc.add_frame(&Pose::IDENTITY, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(
            outcome,
            FrameOutcome::Accepted {
                points_used: 2,
                new_voxels: 2
            }
        );
        assert_eq!(acc.keyframe_count(), 1);
    }

    #[test]
    fn test_motion_gating() {
        let mut acc = WorldMapAccumulator::new();
        acc.start();
        let pts = [0.0, 0.0, -1.0];
        acc.add_frame(&yaw_pose(0.0, [0.0, 0.0, 0.0]), &pts);

        // Small move and small turn
        let outcome = acc.add_frame(&yaw_pose(0.1, [0.1, 0.0, 0.0]), &pts);
        assert_eq!(outcome, FrameOutcome::BelowMotionThreshold);

        // Enough translation
        let outcome = acc.add_frame(&yaw_pose(0.0, [0.3, 0.0, 0.0]), &pts);
        assert!(matches!(outcome, FrameOutcome::Accepted { .. }));

        // Enough rotation in place
        let outcome = acc.add_frame(&yaw_pose(0.25, [0.3, 0.0, 0.0]), &pts);
        assert!(matches!(outcome, FrameOutcome::Accepted { .. }));
        assert_eq!(acc.keyframe_count(), 3);
    }

    #[test]
    fn test_yaw_difference_wraps() {
        let mut acc = WorldMapAccumulator::new();
        acc.start();
        acc.add_frame(&yaw_pose(3.1, [0.0; 3]), &[]);
        // 3.1 → -3.1 is a 0.083 rad turn across the seam
        let outcome = acc.add_frame(&yaw_pose(-3.1, [0.0; 3]), &[]);
        assert_eq!(outcome, FrameOutcome::BelowMotionThreshold);
    }

    #[test]
    fn test_stride_limits_points_per_frame() {
        let mut acc = WorldMapAccumulator::new();
        acc.start();
        let points: Vec<f32> = (0..10_000).flat_map(|i| [i as f32 * 0.01, 0.0, 0.0]).collect();
        match acc.add_frame(&Pose::IDENTITY, &points) {
            FrameOutcome::Accepted { points_used, .. } => assert_eq!(points_used, 2500),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_single_voxel_mean() {
        let mut acc = WorldMapAccumulator::new();
        acc.start();
        let mut points = Vec::new();
        let (mut sx, mut sy, mut sz) = (0.0f64, 0.0f64, 0.0f64);
        for i in 0..100 {
            let f = i as f32 / 100.0;
            let p = [0.001 + 0.02 * f, 0.002 + 0.025 * f, 0.003 + 0.01 * f];
            sx += p[0] as f64;
            sy += p[1] as f64;
            sz += p[2] as f64;
            points.extend_from_slice(&p);
        }
        acc.add_frame(&Pose::IDENTITY, &points);
        assert_eq!(acc.voxel_count(), 1);

        let cloud = acc.point_cloud();
        let p = cloud.point(0);
        assert_relative_eq!(p[0] as f64, sx / 100.0, epsilon = 1e-6);
        assert_relative_eq!(p[1] as f64, sy / 100.0, epsilon = 1e-6);
        assert_relative_eq!(p[2] as f64, sz / 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_height_color() {
        assert_eq!(height_color(-1.5), [0, 0, 255]);
        assert_eq!(height_color(0.0), [127, 255, 127]);
        assert_eq!(height_color(5.0), [255, 0, 0]);
    }

    #[test]
    fn test_stop_keeps_data_and_start_clears() {
        let mut acc = WorldMapAccumulator::new();
        acc.start();
        acc.add_frame(&Pose::IDENTITY, &[0.0, 0.0, 0.0]);
        acc.stop();
        assert!(!acc.is_running());
        assert_eq!(acc.voxel_count(), 1);
        acc.start();
        assert_eq!(acc.voxel_count(), 0);
        assert_eq!(acc.keyframe_count(), 0);
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = AccumulatorConfig {
            voxel_size: 0.0,
            ..Default::default()
        };
        assert!(WorldMapAccumulator::with_config(config).is_err());
    }
}
