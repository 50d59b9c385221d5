// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Texture
//!
//! Multi-view photo texturing of reconstructed room meshes.
//!
//! Captured frames are projected onto an unindexed triangle soup through
//! their pinhole intrinsics and camera-to-world poses. Every mode picks an
//! evenly spread subset of frames, decodes them once, settles the camera
//! forward sign, and then aggregates colour per triangle, per vertex or
//! per texel:
//!
//! | Mode | Output |
//! |------|--------|
//! | [`bake_triangle_colors`] | per-vertex RGB, constant per triangle |
//! | [`bake_vertex_colors`] | per-vertex RGB |
//! | [`bake_uv_gouraud`] | UV texture, interpolated vertex colours |
//! | [`bake_uv_best_frame`] | UV texture, nearest frame per texel |
//! | [`bake_triangle_atlas`] | one-cell-per-triangle atlas |
//!
//! Unresolved targets keep a neutral colour; missing frames are skipped
//! and counted in the [`BakeReport`].
//!
//! ```rust,ignore
//! use roomscan_texture::{bake_uv_best_frame, BakeConfig, BakeControl, BakeMode, DirectoryLoader};
//!
//! let loader = DirectoryLoader::new("capture/frames");
//! let config = BakeConfig::for_mode(BakeMode::BestFrame);
//! let baked = bake_uv_best_frame(&soup, &log.frames, &loader, &config, &BakeControl::new())?;
//! baked.output.save("texture.png")?;
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod exposure;
pub mod frames;
pub mod modes;
pub mod projection;
pub mod raster;
pub mod report;
pub mod sample;
pub mod scoring;
mod session;
pub mod zsign;

pub use config::{BakeConfig, BakeMode, PassParams, ZSignPolicy};
pub use control::BakeControl;
pub use error::{Error, Result};
pub use frames::{pick_evenly, DecodedImage, DirectoryLoader, FrameLoader, MemoryLoader, Rotation};
pub use modes::{
    bake_triangle_atlas, bake_triangle_colors, bake_uv_best_frame, bake_uv_gouraud,
    bake_vertex_colors, texture_coordinates, Baked,
};
pub use report::BakeReport;
