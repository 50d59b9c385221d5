// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Core
//!
//! Data model and textual interchange formats shared by the room
//! reconstruction crates.
//!
//! ## Overview
//!
//! - **Poses**: column-major camera-to-world transforms ([`Pose`]) and the
//!   per-frame capture records ([`FrameRecord`]) read from `poses.csv`
//! - **Point clouds**: [`PointCloud`] with optional RGB and [`Bounds3`]
//! - **Formats**: ASCII PLY for clouds and meshes, pose CSV, trajectory CSV
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roomscan_core::{ply, poses};
//!
//! let cloud = ply::load_point_cloud("capture/map.ply")?;
//! println!("{} points, centre {:?}", cloud.len(), cloud.bounds().center());
//!
//! let log = poses::load_poses("capture/poses.csv")?;
//! println!("{} frames ({} rows skipped)", log.len(), log.skipped_rows);
//! ```
//!
//! ## Performance
//!
//! Number parsing goes through [fast-float](https://docs.rs/fast-float) and
//! [lexical-core](https://docs.rs/lexical-core).
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for the data model

pub mod bounds;
pub mod error;
pub mod fast_parse;
pub mod frame;
pub mod ply;
pub mod point_cloud;
pub mod poses;
pub mod trajectory;
pub mod types;

pub use bounds::Bounds3;
pub use error::{Error, Result};
pub use frame::{FrameRecord, PoseLog};
pub use ply::{MeshView, PlyMesh};
pub use point_cloud::PointCloud;
pub use types::{Pose, TrajectorySample};
