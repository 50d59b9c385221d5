// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera motion between two poses, used to gate image capture

use roomscan_core::Pose;
use serde::{Deserialize, Serialize};

/// Translation (meters) and rotation (degrees) between two poses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDelta {
    pub translation: f32,
    pub rotation_deg: f32,
}

/// Angle between the forward axes plus camera-centre distance
pub fn motion_delta(a: &Pose, b: &Pose) -> MotionDelta {
    let translation = (b.translation() - a.translation()).norm();
    let cos = a.forward().dot(&b.forward()).clamp(-1.0, 1.0);
    MotionDelta {
        translation,
        rotation_deg: cos.acos().to_degrees(),
    }
}

/// Thresholds for capturing a new keyframe image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureGate {
    pub min_translation: f32,
    pub min_rotation_deg: f32,
}

impl Default for CaptureGate {
    fn default() -> Self {
        Self {
            min_translation: 0.20,
            min_rotation_deg: 10.0,
        }
    }
}

impl CaptureGate {
    /// `true` when `current` moved or turned enough since `last`
    pub fn should_capture(&self, last: Option<&Pose>, current: &Pose) -> bool {
        match last {
            None => true,
            Some(last) => {
                let delta = motion_delta(last, current);
                delta.translation >= self.min_translation
                    || delta.rotation_deg >= self.min_rotation_deg
            }
        }
    }
}
