// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for floorplan extraction
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("not enough points for a floorplan: got {points}, need at least {required}")]
    InsufficientData { points: usize, required: usize },

    #[error("invalid floorplan configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] roomscan_core::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
