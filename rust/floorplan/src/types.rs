// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for floorplan extraction

use image::GrayImage;
use nalgebra::Point2;
use roomscan_geometry::{signed_area, PixelPolygon};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorplanConfig {
    /// The cloud must hold more than this many points
    pub min_points: usize,
    /// Lower height percentile of the floor band (0..1)
    pub band_low: f32,
    /// Upper height percentile of the floor band (0..1)
    pub band_high: f32,
    /// Below this many band points the whole cloud is rasterized instead
    pub min_band_points: usize,
    /// Grid resolution in meters per pixel
    pub meters_per_pixel: f64,
    /// Smallest grid side (pixels)
    pub min_grid_size: u32,
    /// Largest grid side (pixels)
    pub max_grid_size: u32,
    /// Lower bound on the XZ extent (meters)
    pub min_range: f64,
    /// Closing radius (dilate then erode)
    pub close_radius: u8,
    /// Final light dilation radius
    pub dilate_radius: u8,
    /// Number of connected components kept
    pub top_k: usize,
    /// Components smaller than this (pixels) are speckle
    pub min_component_px: usize,
    /// Blur applied before contour tracing
    pub blur_sigma: f32,
    /// Binarisation threshold after the blur
    pub contour_threshold: u8,
    /// Polygon approximation tolerance as a fraction of the contour perimeter
    pub approx_fraction: f64,
}

impl Default for FloorplanConfig {
    fn default() -> Self {
        Self {
            min_points: 50,
            band_low: 0.20,
            band_high: 0.40,
            min_band_points: 120,
            meters_per_pixel: 0.02,
            min_grid_size: 240,
            max_grid_size: 1600,
            min_range: 0.5,
            close_radius: 3,
            dilate_radius: 1,
            top_k: 8,
            min_component_px: 120,
            blur_sigma: 0.8, // ~3x3 kernel
            contour_threshold: 80,
            approx_fraction: 0.02,
        }
    }
}

impl FloorplanConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.band_low)
            || !(0.0..=1.0).contains(&self.band_high)
            || self.band_low > self.band_high
        {
            return Err(Error::InvalidConfig(format!(
                "floor band percentiles must satisfy 0 <= low <= high <= 1, got {}..{}",
                self.band_low, self.band_high
            )));
        }
        if !(self.meters_per_pixel > 0.0) || !(self.min_range > 0.0) {
            return Err(Error::InvalidConfig(
                "grid resolution and minimum range must be positive".into(),
            ));
        }
        if self.min_grid_size < 2 || self.min_grid_size > self.max_grid_size {
            return Err(Error::InvalidConfig(format!(
                "grid size bounds {}..{} are invalid",
                self.min_grid_size, self.max_grid_size
            )));
        }
        Ok(())
    }
}

/// Affine mapping between grid pixels and the world XZ plane
///
/// Pixel rows grow downwards while world Z grows upwards, so rows are
/// flipped in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMapping {
    pub min_x: f64,
    pub min_z: f64,
    pub range_x: f64,
    pub range_z: f64,
    pub width: u32,
    pub height: u32,
}

impl GridMapping {
    /// Grid cell `(col, row)` holding a world point, clamped into the grid
    pub fn world_to_pixel(&self, x: f64, z: f64) -> (u32, u32) {
        let w = self.width as i64;
        let h = self.height as i64;
        let u = ((x - self.min_x) / self.range_x * (w - 1) as f64) as i64;
        let v = ((z - self.min_z) / self.range_z * (h - 1) as f64) as i64;
        let u = u.clamp(0, w - 1);
        let v = v.clamp(0, h - 1);
        (u as u32, (h - 1 - v) as u32)
    }

    /// World XZ position of a (possibly fractional) pixel coordinate
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let v = (self.height - 1) as f64 - row;
        (
            self.min_x + col / (self.width - 1) as f64 * self.range_x,
            self.min_z + v / (self.height - 1) as f64 * self.range_z,
        )
    }

    /// Convert a pixel outline into world XZ coordinates
    pub fn polygon_to_world(&self, poly: &[Point2<i32>]) -> Vec<Point2<f64>> {
        poly.iter()
            .map(|p| {
                let (x, z) = self.pixel_to_world(p.x as f64, p.y as f64);
                Point2::new(x, z)
            })
            .collect()
    }

    /// Size of one pixel in meters along X and Z
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            self.range_x / (self.width - 1) as f64,
            self.range_z / (self.height - 1) as f64,
        )
    }
}

/// Height band treated as floor-level geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorBand {
    pub low_y: f32,
    pub high_y: f32,
    /// Points inside the band
    pub points: usize,
    /// The band was too sparse and the whole cloud was used
    pub fallback: bool,
}

impl FloorBand {
    #[inline]
    pub fn contains(&self, y: f32) -> bool {
        y >= self.low_y && y <= self.high_y
    }
}

/// Result of one extraction
#[derive(Debug, Clone)]
pub struct Floorplan {
    /// Room outline in pixel coordinates; empty when no region survived
    pub polygon: PixelPolygon,
    /// Outer borders of the kept mask, before approximation
    pub contours: Vec<PixelPolygon>,
    pub mapping: GridMapping,
    /// Denoised occupancy mask (255 = occupied)
    pub mask: GrayImage,
    /// Occupied pixels of `mask`
    pub occupied: usize,
    pub band: FloorBand,
}

impl Floorplan {
    /// `false` means "not enough data yet", not a failure
    pub fn has_polygon(&self) -> bool {
        self.polygon.len() >= 3
    }

    pub fn world_polygon(&self) -> Vec<Point2<f64>> {
        self.mapping.polygon_to_world(&self.polygon)
    }

    pub fn summary(&self) -> FloorplanSummary {
        let world = self.world_polygon();
        FloorplanSummary {
            width: self.mapping.width,
            height: self.mapping.height,
            occupied: self.occupied,
            band: self.band,
            mapping: self.mapping,
            polygon_px: self.polygon.iter().map(|p| [p.x, p.y]).collect(),
            polygon_world: world.iter().map(|p| [p.x, p.y]).collect(),
            area_m2: signed_area(&world).abs(),
        }
    }
}

/// Serialisable digest of a [`Floorplan`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorplanSummary {
    pub width: u32,
    pub height: u32,
    pub occupied: usize,
    pub band: FloorBand,
    pub mapping: GridMapping,
    pub polygon_px: Vec<[i32; 2]>,
    /// Outline in world XZ (meters)
    pub polygon_world: Vec<[f64; 2]>,
    pub area_m2: f64,
}

impl FloorplanSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
