// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for texture baking
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while baking
///
/// Per-frame problems (missing or undecodable images) are not errors; they
/// are counted in the bake report and the frame is skipped.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] roomscan_core::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bake input: {0}")]
    InvalidInput(String),
}
