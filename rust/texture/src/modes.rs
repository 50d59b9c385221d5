// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bake modes

mod atlas;
mod best_frame;
mod gouraud;
mod triangle;
mod vertex;

pub use atlas::bake_triangle_atlas;
pub use best_frame::bake_uv_best_frame;
pub use gouraud::bake_uv_gouraud;
pub use triangle::bake_triangle_colors;
pub use vertex::bake_vertex_colors;

use image::{Rgba, RgbaImage};
use roomscan_geometry::{AtlasLayout, TriangleSoup};

use crate::config::{BakeConfig, BakeMode};
use crate::error::{Error, Result};

/// Neutral colour for targets no frame could resolve
pub const NEUTRAL: f32 = 0.7;

/// Texture returned when no frame could be loaded at all
pub const EMPTY_FILL: Rgba<u8> = Rgba([0x77, 0x77, 0x77, 0xFF]);

/// Output of a bake with its diagnostics
#[derive(Debug, Clone)]
pub struct Baked<T> {
    pub output: T,
    pub report: crate::report::BakeReport,
}

/// Texture coordinates of `soup` into the texture a bake in `config.mode`
/// produces, one `u, v` pair per soup vertex
///
/// The UV modes paint through the soup's own UVs. The atlas mode gives
/// every triangle its own cell; those coordinates are returned with V
/// flipped so that, as in the UV modes, `v = 1` is the top texture row.
/// `None` for the per-vertex colour modes.
pub fn texture_coordinates(soup: &TriangleSoup, config: &BakeConfig) -> Option<Vec<f32>> {
    match config.mode {
        BakeMode::BestFrame | BakeMode::Gouraud => Some(soup.uvs.clone()),
        BakeMode::Atlas => {
            let n = soup.triangle_count();
            let mut uvs = AtlasLayout::for_triangles(n, config.atlas_cell_size).triangle_uvs(n);
            for v in uvs.iter_mut().skip(1).step_by(2) {
                *v = 1.0 - *v;
            }
            Some(uvs)
        }
        BakeMode::Triangles | BakeMode::VertexColors => None,
    }
}

fn check_input(soup: &TriangleSoup, config: &BakeConfig, needs_uvs: bool) -> Result<()> {
    config.validate()?;
    if soup.positions.len() % 9 != 0 {
        return Err(Error::InvalidInput(format!(
            "{} position floats is not a whole number of triangles",
            soup.positions.len()
        )));
    }
    if needs_uvs && soup.uvs.len() != soup.vertex_count() * 2 {
        return Err(Error::InvalidInput(format!(
            "expected {} uv floats, found {}",
            soup.vertex_count() * 2,
            soup.uvs.len()
        )));
    }
    Ok(())
}

fn filled_texture(config: &BakeConfig, fill: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(config.texture_width, config.texture_height, fill)
}
