// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Captured frame records

use crate::types::Pose;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One captured camera frame: image name, pinhole intrinsics at capture
/// resolution and the camera-to-world pose
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameRecord {
    /// Image file name, relative to the frames directory
    pub file: String,
    pub timestamp_ns: i64,
    pub width: u32,
    pub height: u32,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub pose: Pose,
}

impl FrameRecord {
    /// Camera centre in world space
    #[inline]
    pub fn camera_position(&self) -> nalgebra::Vector3<f32> {
        self.pose.translation()
    }
}

/// Ordered frame records loaded from a pose log
#[derive(Debug, Clone, Default)]
pub struct PoseLog {
    pub frames: Vec<FrameRecord>,
    /// Rows dropped because they were short or unparsable
    pub skipped_rows: usize,
}

impl PoseLog {
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
