// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bake parameters
//!
//! The thresholds below were tuned against real captures rather than
//! derived from a camera model, so every one of them is configurable.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Aggregation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BakeMode {
    /// One colour per triangle, strict/relaxed/fallback cascade
    Triangles,
    /// Per-vertex blends interpolated across each triangle's UV footprint
    Gouraud,
    /// Per texel, the closest frame that sees it wins
    BestFrame,
    /// Nearest frame per vertex with a saturation boost
    VertexColors,
    /// Centroid colour painted into a per-triangle atlas cell
    Atlas,
}

impl BakeMode {
    pub fn name(&self) -> &'static str {
        match self {
            BakeMode::Triangles => "triangles",
            BakeMode::Gouraud => "gouraud",
            BakeMode::BestFrame => "best-frame",
            BakeMode::VertexColors => "vertex-colors",
            BakeMode::Atlas => "atlas",
        }
    }

    /// Modes producing a UV texture rather than colours
    pub fn is_texture(&self) -> bool {
        matches!(self, BakeMode::Gouraud | BakeMode::BestFrame | BakeMode::Atlas)
    }
}

impl std::str::FromStr for BakeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "triangles" => Ok(BakeMode::Triangles),
            "gouraud" => Ok(BakeMode::Gouraud),
            "best-frame" => Ok(BakeMode::BestFrame),
            "vertex-colors" => Ok(BakeMode::VertexColors),
            "atlas" => Ok(BakeMode::Atlas),
            other => Err(Error::InvalidInput(format!("unknown bake mode '{other}'"))),
        }
    }
}

/// Thresholds of one pass of the triangle cascade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassParams {
    /// Minimum dot(normal, direction to camera)
    pub min_facing: f32,
    /// Edge-weight fade distance (pixels)
    pub edge_margin_px: f32,
    /// Fewer projected samples than this are penalised
    pub min_samples: usize,
    /// Weight multiplier for penalised candidates
    pub soft_penalty: f32,
}

impl PassParams {
    pub fn strict(edge_margin_px: f32) -> Self {
        Self {
            min_facing: 0.10,
            edge_margin_px,
            min_samples: 2,
            soft_penalty: 0.35,
        }
    }

    /// Looser pass derived from a strict one
    pub fn relaxed_from(strict: &PassParams) -> Self {
        Self {
            min_facing: 0.02,
            edge_margin_px: (strict.edge_margin_px * 0.5).max(6.0),
            min_samples: 1,
            soft_penalty: 0.55,
        }
    }
}

/// How the camera forward sign is chosen
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZSignPolicy {
    /// Probe a few frames and vertices and take the sign with more hits
    #[default]
    Auto,
    /// Use this sign (+1 or -1) unconditionally
    Fixed(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    pub mode: BakeMode,
    /// Frames are subsampled evenly down to this many
    pub max_frames: usize,
    /// Decoded frames wider than this are downsampled by an integer factor
    pub downscale_max_w: u32,
    /// Points closer than this to the camera plane are rejected (meters)
    pub min_z: f32,
    /// Candidates blended per target
    pub top_k: usize,
    /// Edge-weight fade distance, or inset for the best-frame test (pixels)
    pub edge_margin_px: f32,
    pub strict: PassParams,
    pub relaxed: PassParams,
    /// Facing threshold used by the best-frame mode
    pub min_facing: f32,
    pub texture_width: u32,
    pub texture_height: u32,
    pub atlas_cell_size: u32,
    pub z_sign: ZSignPolicy,
    pub z_sign_probe_frames: usize,
    pub z_sign_probe_vertices: usize,
    pub gain_min: f32,
    pub gain_max: f32,
    pub saturation_boost: f32,
    pub brightness_boost: f32,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self::for_mode(BakeMode::BestFrame)
    }
}

impl BakeConfig {
    /// Tuned defaults of each mode
    pub fn for_mode(mode: BakeMode) -> Self {
        let (max_frames, downscale_max_w, min_z, top_k, edge_margin_px) = match mode {
            BakeMode::Triangles => (120, 960, 0.20, 10, 12.0),
            BakeMode::Gouraud => (140, 1280, 0.20, 8, 12.0),
            BakeMode::BestFrame => (140, 1280, 0.20, 8, 14.0),
            BakeMode::VertexColors => (40, 640, 0.25, 1, 0.0),
            BakeMode::Atlas => (120, 960, 0.20, 6, 10.0),
        };
        let strict = PassParams::strict(edge_margin_px);
        Self {
            mode,
            max_frames,
            downscale_max_w,
            min_z,
            top_k,
            edge_margin_px,
            relaxed: PassParams::relaxed_from(&strict),
            strict,
            min_facing: 0.12,
            texture_width: 2048,
            texture_height: 1024,
            atlas_cell_size: 64,
            z_sign: ZSignPolicy::Auto,
            z_sign_probe_frames: 5,
            z_sign_probe_vertices: 120,
            gain_min: 0.6,
            gain_max: 1.6,
            saturation_boost: 1.4,
            brightness_boost: 1.1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_frames == 0 || self.top_k == 0 {
            return Err(Error::InvalidInput(
                "max_frames and top_k must be at least 1".into(),
            ));
        }
        if self.downscale_max_w == 0 {
            return Err(Error::InvalidInput("downscale_max_w must be positive".into()));
        }
        if self.mode.is_texture() && self.mode != BakeMode::Atlas {
            if self.texture_width < 2 || self.texture_height < 2 {
                return Err(Error::InvalidInput(format!(
                    "texture size {}x{} is too small",
                    self.texture_width, self.texture_height
                )));
            }
        }
        if self.atlas_cell_size < 2 {
            return Err(Error::InvalidInput("atlas cells must be at least 2 px".into()));
        }
        if !(self.gain_min > 0.0 && self.gain_min <= self.gain_max) {
            return Err(Error::InvalidInput(format!(
                "gain range {}..{} is invalid",
                self.gain_min, self.gain_max
            )));
        }
        if let ZSignPolicy::Fixed(s) = self.z_sign {
            if s != 1.0 && s != -1.0 {
                return Err(Error::InvalidInput(format!("z sign must be +1 or -1, got {s}")));
            }
        }
        Ok(())
    }
}
