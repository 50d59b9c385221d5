// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! World-to-image projection

use nalgebra::Point3;

use crate::frames::{LoadedFrame, Rotation};

/// A world point seen by a frame, in downsampled sensor coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPoint {
    pub u: f32,
    pub v: f32,
    /// Signed camera depth (meters), always > `min_z`
    pub depth: f32,
}

/// A world point located inside a frame's stored image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub u: f32,
    pub v: f32,
    pub depth: f32,
}

/// Map sensor coordinates into a stored image of `bmp_w × bmp_h`
///
/// `ws × hs` is the downsampled sensor size. For quarter turns the sensor
/// axes swap before scaling.
pub fn map_to_image(
    u0: f32,
    v0: f32,
    ws: u32,
    hs: u32,
    bmp_w: u32,
    bmp_h: u32,
    rotation: Rotation,
) -> (f32, f32) {
    let (wf, hf) = (ws as f32, hs as f32);
    let scale = |u: f32, v: f32, ww: f32, hh: f32| (u * bmp_w as f32 / ww, v * bmp_h as f32 / hh);
    match rotation {
        Rotation::R0 => scale(u0, v0, wf, hf),
        Rotation::R90 => scale((hf - 1.0) - v0, u0, hf, wf),
        Rotation::R180 => scale((wf - 1.0) - u0, (hf - 1.0) - v0, wf, hf),
        Rotation::R270 => scale(v0, (wf - 1.0) - u0, hf, wf),
    }
}

/// `inset ≤ u ≤ W − 1 − inset`, same for v
#[inline]
pub fn inside(u: f32, v: f32, width: u32, height: u32, inset: f32) -> bool {
    u >= inset
        && v >= inset
        && u <= width as f32 - 1.0 - inset
        && v <= height as f32 - 1.0 - inset
}

impl LoadedFrame {
    /// Pinhole projection in the downsampled sensor grid
    ///
    /// `None` when the point is not in front of the camera by more than
    /// `min_z` under the given forward sign.
    pub fn to_sensor(&self, p: &Point3<f32>, z_sign: f32, min_z: f32) -> Option<SensorPoint> {
        let rec = &self.record;
        let cam = rec.pose.world_to_camera(p);
        let depth = z_sign * cam.z;
        if depth <= min_z {
            return None;
        }
        let s = self.image.scale as f32;
        Some(SensorPoint {
            u: rec.fx / s * (cam.x / depth) + rec.cx / s,
            v: rec.fy / s * (cam.y / depth) + rec.cy / s,
            depth,
        })
    }

    /// Locate a sensor point in the stored image, trying the hinted
    /// rotation first and then every quarter turn
    pub fn to_image(&self, sp: &SensorPoint, inset: f32) -> Option<Projection> {
        let img = &self.image;
        let ws = (self.record.width / img.scale).max(1);
        let hs = (self.record.height / img.scale).max(1);
        let (bw, bh) = (img.width(), img.height());
        img.rotation.candidates().into_iter().find_map(|rot| {
            let (u, v) = map_to_image(sp.u, sp.v, ws, hs, bw, bh, rot);
            inside(u, v, bw, bh, inset).then_some(Projection {
                u,
                v,
                depth: sp.depth,
            })
        })
    }

    /// Project a world point to a pixel at least `inset` away from the border
    #[inline]
    pub fn project(&self, p: &Point3<f32>, z_sign: f32, min_z: f32, inset: f32) -> Option<Projection> {
        self.to_sensor(p, z_sign, min_z)
            .and_then(|sp| self.to_image(&sp, inset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::DecodedImage;
    use approx::assert_relative_eq;
    use image::RgbImage;
    use roomscan_core::{FrameRecord, Pose};
    use std::sync::Arc;

    fn frame(width: u32, height: u32, rotation: Rotation, image_size: (u32, u32)) -> LoadedFrame {
        LoadedFrame {
            record: FrameRecord {
                file: "f.jpg".into(),
                timestamp_ns: 0,
                width,
                height,
                fx: 50.0,
                fy: 50.0,
                cx: width as f32 / 2.0,
                cy: height as f32 / 2.0,
                pose: Pose::IDENTITY,
            },
            image: Arc::new(DecodedImage {
                image: RgbImage::new(image_size.0, image_size.1),
                rotation,
                scale: 1,
            }),
            gain: 1.0,
        }
    }

    #[test]
    fn test_quarter_turn_mapping() {
        // 64x48 sensor, stored rotated as 48x64
        let (u, v) = map_to_image(10.0, 5.0, 64, 48, 48, 64, Rotation::R90);
        assert_relative_eq!(u, 42.0);
        assert_relative_eq!(v, 10.0);
        let (u, v) = map_to_image(10.0, 5.0, 64, 48, 48, 64, Rotation::R270);
        assert_relative_eq!(u, 5.0);
        assert_relative_eq!(v, 53.0);
        let (u, v) = map_to_image(10.0, 5.0, 64, 48, 64, 48, Rotation::R180);
        assert_relative_eq!(u, 53.0);
        assert_relative_eq!(v, 42.0);
    }

    #[test]
    fn test_mapping_rescales_to_image() {
        let (u, v) = map_to_image(32.0, 24.0, 64, 48, 128, 96, Rotation::R0);
        assert_relative_eq!(u, 64.0);
        assert_relative_eq!(v, 48.0);
    }

    #[test]
    fn test_projection_respects_sign_and_depth() {
        let f = frame(64, 48, Rotation::R0, (64, 48));
        let p = Point3::new(0.2, -0.1, 2.0);
        let hit = f.project(&p, 1.0, 0.2, 2.0).unwrap();
        assert_relative_eq!(hit.u, 37.0);
        assert_relative_eq!(hit.v, 21.5);
        assert_relative_eq!(hit.depth, 2.0);
        assert!(f.project(&p, -1.0, 0.2, 2.0).is_none());
        assert!(f.project(&Point3::new(0.0, 0.0, 0.1), 1.0, 0.2, 2.0).is_none());
    }

    #[test]
    fn test_falls_back_to_other_rotation() {
        // Hint says a quarter turn but the image is stored upright
        let f = frame(64, 48, Rotation::R90, (64, 48));
        // Quarter turn puts this at v = 1.8, too close to the border
        let p = Point3::new(-0.592, 0.0, 1.0);
        let hit = f.project(&p, 1.0, 0.2, 2.0).unwrap();
        assert_relative_eq!(hit.u, 2.4, epsilon = 1e-4);
        assert_relative_eq!(hit.v, 24.0);
        // Far right of the sensor falls outside every candidate
        assert!(f.project(&Point3::new(2.0, 0.0, 1.0), 1.0, 0.2, 2.0).is_none());
    }

    #[test]
    fn test_inside_inset() {
        assert!(inside(2.0, 2.0, 64, 48, 2.0));
        assert!(inside(61.0, 45.0, 64, 48, 2.0));
        assert!(!inside(61.5, 45.0, 64, 48, 2.0));
        assert!(inside(62.0, 46.0, 64, 48, 1.0));
    }
}
