// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame selection, decoding and caching
//!
//! Frames are decoded without applying their orientation hint: the stored
//! pixel grid is what the intrinsics describe, up to a rotation, and the
//! projection tries the hinted rotation first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use roomscan_core::FrameRecord;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Rotation between the sensor grid and the stored image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Rotations to try, hinted one first
    #[inline]
    pub fn candidates(self) -> [Rotation; 5] {
        [self, Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270]
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Pure rotations map over; mirrored orientations are treated as upright
    pub fn from_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Rotate90 => Rotation::R90,
            Orientation::Rotate180 => Rotation::R180,
            Orientation::Rotate270 => Rotation::R270,
            _ => Rotation::R0,
        }
    }
}

/// A decoded, possibly downsampled frame
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: RgbImage,
    pub rotation: Rotation,
    /// Integer factor the capture intrinsics must be divided by
    pub scale: u32,
}

impl DecodedImage {
    /// Downsample `image` by `max(1, width / max_width)`
    pub fn new(image: RgbImage, rotation: Rotation, max_width: u32) -> Self {
        let scale = (image.width() / max_width.max(1)).max(1);
        let image = if scale > 1 {
            let w = (image.width() / scale).max(1);
            let h = (image.height() / scale).max(1);
            imageops::resize(&image, w, h, FilterType::Triangle)
        } else {
            image
        };
        Self {
            image,
            rotation,
            scale,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode capability used by the baker
pub trait FrameLoader: Send + Sync {
    /// Decode frame `name`, downsampled to at most about `max_width` pixels wide
    fn load(&self, name: &str, max_width: u32) -> Result<DecodedImage>;
}

/// Loads frames from a directory of JPEG/PNG files
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FrameLoader for DirectoryLoader {
    fn load(&self, name: &str, max_width: u32) -> Result<DecodedImage> {
        let path = self.root.join(name);
        let mut decoder = ImageReader::open(&path)?
            .with_guessed_format()?
            .into_decoder()?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let image = DynamicImage::from_decoder(decoder)?.into_rgb8();
        Ok(DecodedImage::new(
            image,
            Rotation::from_orientation(orientation),
            max_width,
        ))
    }
}

/// Per-bake cache of decoded frames keyed by file name
///
/// Failed loads are cached too, so a missing file is reported once.
#[derive(Default)]
pub struct FrameCache {
    entries: FxHashMap<String, Option<Arc<DecodedImage>>>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        loader: &dyn FrameLoader,
        name: &str,
        max_width: u32,
    ) -> Option<Arc<DecodedImage>> {
        if let Some(entry) = self.entries.get(name) {
            return entry.clone();
        }
        let entry = match loader.load(name, max_width) {
            Ok(decoded) => {
                debug!(
                    frame = name,
                    width = decoded.width(),
                    height = decoded.height(),
                    scale = decoded.scale,
                    "decoded frame"
                );
                Some(Arc::new(decoded))
            }
            Err(e) => {
                warn!(frame = name, error = %e, "skipping frame");
                None
            }
        };
        self.entries.insert(name.to_string(), entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A picked frame together with its decoded image
#[derive(Debug, Clone)]
pub struct LoadedFrame {
    pub record: FrameRecord,
    pub image: Arc<DecodedImage>,
    /// Exposure gain; 1.0 unless the mode equalises exposure
    pub gain: f32,
}

/// Subsample `frames` evenly down to `max`
///
/// Keeps the first frame and spreads the rest with a fractional step.
pub fn pick_evenly(frames: &[FrameRecord], max: usize) -> Vec<&FrameRecord> {
    let n = frames.len();
    if n <= max {
        return frames.iter().collect();
    }
    let step = n as f64 / max as f64;
    (0..max)
        .map(|k| &frames[((k as f64 * step) as usize).min(n - 1)])
        .collect()
}

/// In-memory loader, mostly for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    images: FxHashMap<String, (RgbImage, Rotation)>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, image: RgbImage, rotation: Rotation) {
        self.images.insert(name.into(), (image, rotation));
    }
}

impl FrameLoader for MemoryLoader {
    fn load(&self, name: &str, max_width: u32) -> Result<DecodedImage> {
        let (image, rotation) = self
            .images
            .get(name)
            .ok_or_else(|| Error::InvalidInput(format!("no frame named '{name}'")))?;
        Ok(DecodedImage::new(image.clone(), *rotation, max_width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomscan_core::Pose;

    fn record(file: &str) -> FrameRecord {
        FrameRecord {
            file: file.to_string(),
            timestamp_ns: 0,
            width: 64,
            height: 48,
            fx: 50.0,
            fy: 50.0,
            cx: 32.0,
            cy: 24.0,
            pose: Pose::IDENTITY,
        }
    }

    #[test]
    fn test_pick_evenly_spreads_frames() {
        let frames: Vec<FrameRecord> = (0..10).map(|i| record(&format!("{i}.jpg"))).collect();
        let picked: Vec<&str> = pick_evenly(&frames, 4).iter().map(|f| f.file.as_str()).collect();
        // step 2.5 -> 0, 2, 5, 7
        assert_eq!(picked, vec!["0.jpg", "2.jpg", "5.jpg", "7.jpg"]);
        assert_eq!(pick_evenly(&frames, 20).len(), 10);
    }

    #[test]
    fn test_downsample_by_integer_factor() {
        let decoded = DecodedImage::new(RgbImage::new(2000, 1000), Rotation::R0, 960);
        assert_eq!(decoded.scale, 2);
        assert_eq!((decoded.width(), decoded.height()), (1000, 500));

        let small = DecodedImage::new(RgbImage::new(640, 480), Rotation::R90, 960);
        assert_eq!(small.scale, 1);
        assert_eq!(small.width(), 640);
    }

    #[test]
    fn test_cache_remembers_failures() {
        let mut loader = MemoryLoader::new();
        loader.insert("a.jpg", RgbImage::new(8, 8), Rotation::R0);
        let mut cache = FrameCache::new();
        assert!(cache.get_or_load(&loader, "a.jpg", 960).is_some());
        assert!(cache.get_or_load(&loader, "missing.jpg", 960).is_none());
        assert!(cache.get_or_load(&loader, "missing.jpg", 960).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_rotation_candidates_start_with_hint() {
        assert_eq!(Rotation::R270.candidates()[0], Rotation::R270);
        assert_eq!(Rotation::from_orientation(Orientation::Rotate90), Rotation::R90);
        assert_eq!(Rotation::from_orientation(Orientation::FlipHorizontal), Rotation::R0);
    }

    #[test]
    fn test_directory_loader_missing_file_is_io_error() {
        let loader = DirectoryLoader::new("/nonexistent/frames");
        assert!(matches!(loader.load("x.jpg", 960), Err(Error::Io(_))));
    }
}
