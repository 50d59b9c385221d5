// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bake modes against a synthetic one-camera scene
//!
//! The camera sits at the origin looking down +Z with a 64x48 sensor.
//! The front triangle spans the middle of the view two meters away.

use std::sync::atomic::Ordering;

use approx::assert_relative_eq;
use image::{Rgb, RgbImage};
use roomscan_core::{FrameRecord, Pose};
use roomscan_geometry::TriangleSoup;
use roomscan_texture::{
    bake_triangle_atlas, bake_triangle_colors, bake_uv_best_frame, bake_uv_gouraud,
    bake_vertex_colors, texture_coordinates, BakeConfig, BakeControl, BakeMode, Error, MemoryLoader, Rotation,
    ZSignPolicy,
};

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

fn loader() -> MemoryLoader {
    let mut loader = MemoryLoader::new();
    loader.insert("red.png", RgbImage::from_pixel(64, 48, Rgb([255, 0, 0])), Rotation::R0);
    loader.insert("gray.png", RgbImage::from_pixel(64, 48, Rgb([128, 128, 128])), Rotation::R0);
    loader
}

/// Front-facing triangle (normal towards the camera) with UVs spanning the texture
fn front_soup() -> TriangleSoup {
    TriangleSoup::from_parts(
        vec![-0.5, -0.3, 2.0, 0.0, 0.3, 2.0, 0.5, -0.3, 2.0],
        vec![0.0, 0.0, 0.5, 1.0, 1.0, 0.0],
    )
    .unwrap()
}

fn small_texture(mode: BakeMode) -> BakeConfig {
    BakeConfig {
        texture_width: 32,
        texture_height: 16,
        ..BakeConfig::for_mode(mode)
    }
}

#[test]
fn test_triangle_colors_from_single_view() {
    let baked = bake_triangle_colors(
        &front_soup(),
        &[record("red.png")],
        &loader(),
        &BakeConfig::for_mode(BakeMode::Triangles),
        &BakeControl::new(),
    )
    .unwrap();

    assert_eq!(baked.output.len(), 9);
    for rgb in baked.output.chunks_exact(3) {
        assert_relative_eq!(rgb[0], 1.0);
        assert_relative_eq!(rgb[1], 0.0);
    }
    let report = baked.report;
    assert_eq!(report.z_sign, 1.0);
    assert_eq!((report.painted, report.relaxed, report.fallback, report.defaulted), (1, 0, 0, 0));
    assert_eq!(report.frames_loaded, 1);
}

#[test]
fn test_edge_on_triangle_uses_depth_fallback() {
    // Lies in the x = 0 plane, so it never faces the camera
    let soup = TriangleSoup::from_parts(
        vec![0.0, -0.2, 1.8, 0.0, 0.2, 2.0, 0.0, -0.2, 2.2],
        vec![0.0; 6],
    )
    .unwrap();
    let baked = bake_triangle_colors(
        &soup,
        &[record("red.png")],
        &loader(),
        &BakeConfig::for_mode(BakeMode::Triangles),
        &BakeControl::new(),
    )
    .unwrap();
    assert_eq!(baked.report.fallback, 1);
    assert_relative_eq!(baked.output[0], 1.0);
}

#[test]
fn test_unseen_triangle_keeps_neutral() {
    let soup = TriangleSoup::from_parts(
        vec![-0.5, -0.3, -2.0, 0.5, -0.3, -2.0, 0.0, 0.3, -2.0],
        vec![0.0; 6],
    )
    .unwrap();
    let config = BakeConfig {
        z_sign: ZSignPolicy::Fixed(1.0),
        ..BakeConfig::for_mode(BakeMode::Triangles)
    };
    let baked = bake_triangle_colors(&soup, &[record("red.png")], &loader(), &config, &BakeControl::new())
        .unwrap();
    assert_eq!(baked.report.defaulted, 1);
    assert!(baked.output.iter().all(|&c| c == 0.7));
}

#[test]
fn test_cancelled_bake_leaves_neutral_colors() {
    let control = BakeControl::new();
    control.cancel();
    let baked = bake_triangle_colors(
        &front_soup(),
        &[record("red.png")],
        &loader(),
        &BakeConfig::for_mode(BakeMode::Triangles),
        &control,
    )
    .unwrap();
    assert!(baked.report.cancelled);
    assert_eq!(baked.report.resolved(), 0);
    assert!(baked.output.iter().all(|&c| c == 0.7));
}

#[test]
fn test_missing_frames_are_counted() {
    let baked = bake_triangle_colors(
        &front_soup(),
        &[record("red.png"), record("missing.png")],
        &loader(),
        &BakeConfig::for_mode(BakeMode::Triangles),
        &BakeControl::new(),
    )
    .unwrap();
    assert_eq!(baked.report.frames_picked, 2);
    assert_eq!(baked.report.frames_missing, 1);
    assert_eq!(baked.report.painted, 1);
}

#[test]
fn test_vertex_colors_are_boosted() {
    let soup = front_soup();
    let baked = bake_vertex_colors(
        &soup,
        &[record("gray.png")],
        &loader(),
        &BakeConfig::for_mode(BakeMode::VertexColors),
        &BakeControl::new(),
    )
    .unwrap();
    assert_eq!(baked.output.len(), soup.vertex_count() * 3);
    // Gray keeps its hue; 128/255 brightened by 1.1
    for &c in &baked.output {
        assert_relative_eq!(c, 0.552, epsilon = 1e-3);
    }
    assert_eq!(baked.report.painted, 3);
}

#[test]
fn test_gouraud_paints_uv_footprint() {
    let baked = bake_uv_gouraud(
        &front_soup(),
        &[record("red.png")],
        &loader(),
        &small_texture(BakeMode::Gouraud),
        &BakeControl::new(),
    )
    .unwrap();
    let tex = baked.output;
    assert_eq!(tex.dimensions(), (32, 16));
    assert_eq!(tex.get_pixel(16, 12).0, [255, 0, 0, 255]);
    // Outside the footprint keeps the fill
    assert_eq!(tex.get_pixel(0, 0).0, [0x3A, 0x3A, 0x3A, 255]);
    assert_eq!(baked.report.painted, 1);
}

#[test]
fn test_best_frame_paints_uv_footprint() {
    let baked = bake_uv_best_frame(
        &front_soup(),
        &[record("red.png")],
        &loader(),
        &small_texture(BakeMode::BestFrame),
        &BakeControl::new(),
    )
    .unwrap();
    let tex = baked.output;
    assert_eq!(tex.get_pixel(16, 12).0, [255, 0, 0, 255]);
    assert_eq!(tex.get_pixel(31, 0).0, [0x2F, 0x2F, 0x2F, 255]);
}

#[test]
fn test_empty_pose_log_gives_uniform_texture() {
    let baked = bake_uv_best_frame(
        &front_soup(),
        &[],
        &loader(),
        &small_texture(BakeMode::BestFrame),
        &BakeControl::new(),
    )
    .unwrap();
    assert!(baked.output.pixels().all(|p| p.0 == [0x77, 0x77, 0x77, 255]));
    assert_eq!(baked.report.defaulted, 1);
    assert_eq!(baked.report.frames_available, 0);
}

#[test]
fn test_atlas_fills_cell() {
    let baked = bake_triangle_atlas(
        &front_soup(),
        &[record("red.png")],
        &loader(),
        &BakeConfig::for_mode(BakeMode::Atlas),
        &BakeControl::new(),
    )
    .unwrap();
    let atlas = baked.output;
    assert_eq!(atlas.dimensions(), (64, 64));
    assert!(atlas.pixels().all(|p| p.0 == [255, 0, 0, 255]));
}

#[test]
fn test_partial_triangle_input_rejected() {
    let soup = TriangleSoup {
        positions: vec![0.0; 8],
        uvs: Vec::new(),
    };
    let result = bake_triangle_colors(
        &soup,
        &[],
        &loader(),
        &BakeConfig::for_mode(BakeMode::Triangles),
        &BakeControl::new(),
    );
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_cancel_after_last_target_keeps_bake_complete() {
    let control = BakeControl::new();
    let flag = control.cancel_flag();
    let control = control.with_progress(move |done, total| {
        if done == total {
            flag.store(true, Ordering::Relaxed);
        }
    });
    let baked = bake_vertex_colors(
        &front_soup(),
        &[record("red.png")],
        &loader(),
        &BakeConfig::for_mode(BakeMode::VertexColors),
        &control,
    )
    .unwrap();
    assert!(control.is_cancelled());
    assert!(!baked.report.cancelled);
    assert_eq!(baked.report.resolved(), 3);
}

#[test]
fn test_late_cancel_does_not_mark_triangle_bake() {
    let control = BakeControl::new();
    let flag = control.cancel_flag();
    let control = control.with_progress(move |done, total| {
        if done == total {
            flag.store(true, Ordering::Relaxed);
        }
    });
    let baked = bake_triangle_colors(
        &front_soup(),
        &[record("red.png")],
        &loader(),
        &BakeConfig::for_mode(BakeMode::Triangles),
        &control,
    )
    .unwrap();
    assert!(!baked.report.cancelled);
    assert_eq!(baked.report.painted, 1);
}

#[test]
fn test_uv_modes_export_soup_uvs() {
    let soup = front_soup();
    for mode in [BakeMode::BestFrame, BakeMode::Gouraud] {
        let uvs = texture_coordinates(&soup, &BakeConfig::for_mode(mode)).unwrap();
        assert_eq!(uvs, soup.uvs);
    }
    for mode in [BakeMode::Triangles, BakeMode::VertexColors] {
        assert!(texture_coordinates(&soup, &BakeConfig::for_mode(mode)).is_none());
    }
}

#[test]
fn test_atlas_coordinates_land_in_painted_cell() {
    // Two triangles: the second one is behind the camera and stays unpainted
    let soup = TriangleSoup::from_parts(
        vec![
            -0.5, -0.3, 2.0, 0.0, 0.3, 2.0, 0.5, -0.3, 2.0, //
            -0.5, -0.3, -2.0, 0.5, -0.3, -2.0, 0.0, 0.3, -2.0,
        ],
        vec![0.0; 12],
    )
    .unwrap();
    let config = BakeConfig {
        z_sign: ZSignPolicy::Fixed(1.0),
        ..BakeConfig::for_mode(BakeMode::Atlas)
    };
    let baked = bake_triangle_atlas(&soup, &[record("red.png")], &loader(), &config, &BakeControl::new())
        .unwrap();
    let atlas = baked.output;
    let uvs = texture_coordinates(&soup, &config).unwrap();
    assert_eq!(uvs.len(), soup.vertex_count() * 2);

    let (w, h) = atlas.dimensions();
    let texel = |uv: &[f32]| {
        let x = (uv[0] * w as f32).round() as u32;
        let y = ((1.0 - uv[1]) * h as f32).round() as u32;
        atlas.get_pixel(x.min(w - 1), y.min(h - 1)).0
    };
    for uv in uvs[..6].chunks_exact(2) {
        assert_eq!(texel(uv), [255, 0, 0, 255]);
    }
    for uv in uvs[6..].chunks_exact(2) {
        assert_eq!(texel(uv), [0x77, 0x77, 0x77, 255]);
    }
}
