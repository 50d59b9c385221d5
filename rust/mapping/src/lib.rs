// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RoomScan world mapping
//!
//! Sparse voxel accumulation of tracked point-cloud frames, plus the
//! point-cloud clean-up helpers used before floorplan extraction.

pub mod accumulator;
pub mod error;
pub mod filter;
pub mod motion;
pub mod ransac;
pub mod voxel;

pub use accumulator::{AccumulatorConfig, FrameOutcome, WorldMapAccumulator};
pub use error::{Error, Result};
pub use filter::{downsample_cloud, filter_and_downsample, FilterConfig};
pub use motion::{motion_delta, CaptureGate, MotionDelta};
pub use ransac::{find_floor_plane, FloorPlane, Plane, RansacConfig};
pub use voxel::{VoxelCell, VoxelGrid, VoxelKey};
