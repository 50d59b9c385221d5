// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan extraction from scanned point clouds
//!
//! The pipeline:
//! 1. Select a floor-level height band of the cloud
//! 2. Rasterize it into an occupancy grid over the XZ plane
//! 3. Close scan gaps with morphology and keep the dominant components
//! 4. Trace the outer border and reduce it to a coarse polygon
//!
//! # Usage
//!
//! ```rust,ignore
//! use roomscan_floorplan::{extract_floorplan, FloorplanConfig};
//!
//! let cloud = roomscan_core::ply::load_point_cloud("map.ply")?;
//! let plan = extract_floorplan(&cloud, &FloorplanConfig::default())?;
//! if plan.has_polygon() {
//!     let outline = plan.world_polygon();
//! }
//! ```

pub mod components;
pub mod contour;
pub mod error;
pub mod image_ops;
pub mod preview;
pub mod raster;
pub mod types;

pub use error::{Error, Result};
pub use preview::{render_preview, save_preview};
pub use types::{FloorBand, Floorplan, FloorplanConfig, FloorplanSummary, GridMapping};

use roomscan_core::PointCloud;
use tracing::{debug, info};

/// Extract the dominant room outline of a point cloud
///
/// Fails only when the cloud is too small. A result without a polygon means
/// no region survived filtering yet.
pub fn extract_floorplan(cloud: &PointCloud, config: &FloorplanConfig) -> Result<Floorplan> {
    config.validate()?;
    let n = cloud.len();
    if n <= config.min_points {
        return Err(Error::InsufficientData {
            points: n,
            required: config.min_points + 1,
        });
    }

    let band = raster::floor_band(cloud, config);
    debug!(
        low = band.low_y,
        high = band.high_y,
        points = band.points,
        fallback = band.fallback,
        "floor band"
    );

    let mapping = raster::grid_mapping(cloud, &band, config);
    let raw = raster::rasterize(cloud, &band, &mapping);
    let dense = image_ops::close_and_dilate(&raw, config.close_radius, config.dilate_radius);
    let mask = components::keep_top_k_components(&dense, config.top_k, config.min_component_px);
    let occupied = raster::count_occupied(&mask);

    let contours = contour::outer_contours(&mask, config.blur_sigma, config.contour_threshold);
    let polygon = contour::largest_contour(&contours)
        .map(|c| contour::approximate_polygon(c, config.approx_fraction))
        .filter(|p| p.len() >= 3)
        .unwrap_or_default();

    info!(
        width = mapping.width,
        height = mapping.height,
        occupied,
        contours = contours.len(),
        vertices = polygon.len(),
        "floorplan extracted"
    );

    Ok(Floorplan {
        polygon,
        contours,
        mapping,
        mask,
        occupied,
        band,
    })
}
