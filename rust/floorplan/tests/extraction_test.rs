// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point cloud to outline, end to end

use approx::assert_relative_eq;
use roomscan_core::PointCloud;
use roomscan_floorplan::{extract_floorplan, Error, FloorplanConfig};
use roomscan_geometry::{signed_area, simplify_room_outline};

/// 3 m x 2 m room: dense floor at y = 0 and a sparser ceiling at y = 2.5
fn scanned_room() -> PointCloud {
    let mut points = Vec::new();
    for i in 0..=150 {
        for k in 0..=100 {
            points.push([i as f32 * 0.02, 0.0, k as f32 * 0.02]);
        }
    }
    for i in 0..=75 {
        for k in 0..=50 {
            points.push([i as f32 * 0.04, 2.5, k as f32 * 0.04]);
        }
    }
    PointCloud::from_points(&points)
}

#[test]
fn test_too_few_points() {
    let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0]; 50]);
    match extract_floorplan(&cloud, &FloorplanConfig::default()) {
        Err(Error::InsufficientData { points, required }) => {
            assert_eq!(points, 50);
            assert_eq!(required, 51);
        }
        other => panic!("expected InsufficientData, got {other:?}"),
    }
}

#[test]
fn test_room_outline_is_rectangle() {
    let plan = extract_floorplan(&scanned_room(), &FloorplanConfig::default()).unwrap();
    assert!(!plan.band.fallback);
    assert_eq!((plan.mapping.width, plan.mapping.height), (240, 240));
    assert!(plan.has_polygon());
    assert_eq!(plan.polygon.len(), 4);

    // Erosion trims a thin border where the room touches the grid edge
    let area = signed_area(&plan.polygon).abs();
    assert!(area > 0.9 * 239.0 * 239.0, "area = {area}");

    let world = plan.world_polygon();
    let world_area = signed_area(&world).abs();
    assert_relative_eq!(world_area, 6.0, max_relative = 0.1);
}

#[test]
fn test_outline_survives_simplification() {
    let plan = extract_floorplan(&scanned_room(), &FloorplanConfig::default()).unwrap();
    let clean = simplify_room_outline(&plan.polygon);
    assert_eq!(clean.len(), 4);
}

#[test]
fn test_scattered_noise_yields_empty_polygon() {
    // Isolated points far apart never form a component of 120 pixels
    let points: Vec<[f32; 3]> = (0..60)
        .map(|i| [(i % 8) as f32 * 1.0, 0.0, (i / 8) as f32 * 1.0])
        .collect();
    let plan = extract_floorplan(&PointCloud::from_points(&points), &FloorplanConfig::default())
        .unwrap();
    assert!(!plan.has_polygon());
    assert_eq!(plan.occupied, 0);
    assert!(plan.summary().polygon_world.is_empty());
}
