// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::config::BakeMode;

/// Diagnostic counts of one bake
///
/// `targets` is the number of triangles (or vertices, in vertex mode).
/// Every target ends up in exactly one of `painted`, `relaxed`, `fallback`
/// or `defaulted`, unless the bake was cancelled first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeReport {
    pub mode: BakeMode,
    /// Frames in the pose log
    pub frames_available: usize,
    /// Frames left after even subsampling
    pub frames_picked: usize,
    pub frames_loaded: usize,
    /// Picked frames whose image was absent or undecodable
    pub frames_missing: usize,
    pub z_sign: f32,
    pub targets: usize,
    pub painted: usize,
    pub relaxed: usize,
    pub fallback: usize,
    pub defaulted: usize,
    pub cancelled: bool,
}

impl BakeReport {
    pub fn new(mode: BakeMode, targets: usize) -> Self {
        Self {
            mode,
            frames_available: 0,
            frames_picked: 0,
            frames_loaded: 0,
            frames_missing: 0,
            z_sign: 1.0,
            targets,
            painted: 0,
            relaxed: 0,
            fallback: 0,
            defaulted: 0,
            cancelled: false,
        }
    }

    /// Targets that were resolved one way or another
    pub fn resolved(&self) -> usize {
        self.painted + self.relaxed + self.fallback + self.defaulted
    }

    pub(crate) fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Painted => self.painted += 1,
            Outcome::Relaxed => self.relaxed += 1,
            Outcome::Fallback => self.fallback += 1,
            Outcome::Defaulted => self.defaulted += 1,
        }
    }
}

/// How a single target got its colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Painted,
    Relaxed,
    Fallback,
    Defaulted,
}
