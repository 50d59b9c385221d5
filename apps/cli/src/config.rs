// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration loaded from environment variables and an
//! optional JSON parameter file.
//!
//! Precedence, lowest first: library defaults, `--params` file,
//! `ROOMSCAN_*` variables, command-line flags.

use std::path::Path;

use anyhow::{Context, Result};
use roomscan_floorplan::FloorplanConfig;
use roomscan_geometry::{ColorizeParams, ExtrudeConfig, SurfaceOverride};
use roomscan_mapping::{FilterConfig, RansacConfig};
use roomscan_texture::{BakeConfig, BakeMode};
use serde::{Deserialize, Serialize};

/// Settings read from `ROOMSCAN_*` variables. Unset or unparsable
/// variables leave the lower layers in charge.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Wall height in meters.
    pub wall_height: Option<f64>,
    /// Target wall strip width in meters.
    pub wall_step: Option<f64>,
    /// UV texture width in pixels.
    pub texture_width: Option<u32>,
    /// UV texture height in pixels.
    pub texture_height: Option<u32>,
    /// Frame budget of a bake.
    pub max_frames: Option<usize>,
    /// Decode width cap of a bake.
    pub downscale_max_w: Option<u32>,
    pub bake_mode: Option<BakeMode>,
    /// Number of worker threads for parallel processing.
    pub worker_threads: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            wall_height: var("ROOMSCAN_WALL_HEIGHT").and_then(|v| v.parse().ok()),
            wall_step: var("ROOMSCAN_WALL_STEP").and_then(|v| v.parse().ok()),
            texture_width: var("ROOMSCAN_TEXTURE_WIDTH").and_then(|v| v.parse().ok()),
            texture_height: var("ROOMSCAN_TEXTURE_HEIGHT").and_then(|v| v.parse().ok()),
            max_frames: var("ROOMSCAN_MAX_FRAMES").and_then(|v| v.parse().ok()),
            downscale_max_w: var("ROOMSCAN_DOWNSCALE_MAX_W").and_then(|v| v.parse().ok()),
            bake_mode: var("ROOMSCAN_BAKE_MODE").and_then(|v| v.parse().ok()),
            worker_threads: var("ROOMSCAN_WORKER_THREADS")
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or_else(num_cpus::get),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Library parameter structs, as read from `--params file.json`
///
/// Missing sections keep their defaults. A `bake` section replaces the
/// per-mode defaults; the selected mode still applies on top of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub filter: FilterConfig,
    pub ransac: RansacConfig,
    pub floorplan: FloorplanConfig,
    pub extrude: ExtrudeConfig,
    /// Cloud colours for plain meshes
    pub colorize: ColorizeParams,
    /// Floor and ceiling shades; heights follow the extruded room
    pub surfaces: SurfaceOverride,
    pub bake: Option<BakeConfig>,
}

impl PipelineParams {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading parameter file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing parameter file {}", path.display()))
    }

    /// Extrusion parameters with the environment's wall settings applied
    pub fn extrude_config(&self, app: &AppConfig) -> ExtrudeConfig {
        ExtrudeConfig {
            height: app.wall_height.unwrap_or(self.extrude.height),
            wall_step: app.wall_step.unwrap_or(self.extrude.wall_step),
            ..self.extrude
        }
    }

    /// Mode chosen by the environment, else by the parameter file
    pub fn bake_mode(&self, app: &AppConfig) -> BakeMode {
        app.bake_mode
            .or(self.bake.as_ref().map(|b| b.mode))
            .unwrap_or_else(|| BakeConfig::default().mode)
    }

    /// Bake parameters for `mode`, with the environment's overrides applied
    pub fn bake_config(&self, app: &AppConfig, mode: BakeMode) -> BakeConfig {
        let mut config = match &self.bake {
            Some(bake) => BakeConfig {
                mode,
                ..bake.clone()
            },
            None => BakeConfig::for_mode(mode),
        };
        if let Some(w) = app.texture_width {
            config.texture_width = w;
        }
        if let Some(h) = app.texture_height {
            config.texture_height = h;
        }
        if let Some(n) = app.max_frames {
            config.max_frames = n;
        }
        if let Some(w) = app.downscale_max_w {
            config.downscale_max_w = w;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let app = config(&[]);
        let params = PipelineParams::default();
        assert_eq!(params.extrude_config(&app).height, 2.7);
        assert_eq!(params.bake_mode(&app), BakeMode::BestFrame);
        let bake = params.bake_config(&app, BakeMode::BestFrame);
        assert_eq!((bake.texture_width, bake.texture_height), (2048, 1024));
        assert!(app.worker_threads >= 1);
    }

    #[test]
    fn test_variables_override_defaults() {
        let app = config(&[
            ("ROOMSCAN_WALL_HEIGHT", "2.4"),
            ("ROOMSCAN_BAKE_MODE", "gouraud"),
            ("ROOMSCAN_MAX_FRAMES", "30"),
            ("ROOMSCAN_WORKER_THREADS", "3"),
        ]);
        assert_eq!(app.wall_height, Some(2.4));
        assert_eq!(app.bake_mode, Some(BakeMode::Gouraud));
        assert_eq!(app.max_frames, Some(30));
        assert_eq!(app.worker_threads, 3);
    }

    #[test]
    fn test_unparsable_variables_are_ignored() {
        let app = config(&[("ROOMSCAN_WALL_STEP", "wide"), ("ROOMSCAN_BAKE_MODE", "sepia")]);
        assert!(app.wall_step.is_none());
        assert_eq!(PipelineParams::default().bake_mode(&app), BakeMode::BestFrame);
    }

    #[test]
    fn test_environment_beats_parameter_file() {
        let params: PipelineParams =
            serde_json::from_str(r#"{"extrude": {"height": 3.0, "wall_step": 0.2}}"#).unwrap();
        let app = config(&[("ROOMSCAN_WALL_HEIGHT", "2.5")]);
        let extrude = params.extrude_config(&app);
        assert_eq!(extrude.height, 2.5);
        assert_eq!(extrude.wall_step, 0.2);
    }

    #[test]
    fn test_bake_config_applies_overrides() {
        let app = AppConfig {
            max_frames: Some(12),
            texture_width: Some(512),
            ..config(&[])
        };
        let bake = PipelineParams::default().bake_config(&app, BakeMode::Triangles);
        assert_eq!(bake.mode, BakeMode::Triangles);
        assert_eq!(bake.max_frames, 12);
        assert_eq!(bake.texture_width, 512);
        // Untouched mode defaults survive
        assert_eq!(bake.downscale_max_w, 960);
    }

    #[test]
    fn test_params_file_sections_are_optional() {
        let params: PipelineParams = serde_json::from_str(r#"{"extrude": {"height": 3.0}}"#).unwrap();
        assert_eq!(params.extrude.height, 3.0);
        assert_eq!(params.extrude.wall_step, 0.10);
        assert!(params.bake.is_none());
    }
}
