// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outline to mesh, end to end

use approx::assert_relative_eq;
use roomscan_geometry::extrusion::wall_steps;
use roomscan_geometry::{
    extrude_room, signed_area, simplify_room_outline, ExtrudeConfig, Point2, TriangleSoup,
};

const PX_TO_M: f64 = 0.02;

fn traced_rectangle() -> Vec<Point2<i32>> {
    // 100 x 60 px with stair-step noise and redundant points along the walls
    vec![
        Point2::new(0, 0),
        Point2::new(30, 0),
        Point2::new(31, 1),
        Point2::new(60, 0),
        Point2::new(100, 0),
        Point2::new(100, 30),
        Point2::new(100, 60),
        Point2::new(70, 60),
        Point2::new(30, 60),
        Point2::new(0, 60),
        Point2::new(0, 30),
    ]
}

#[test]
fn test_simplified_outline_extrudes_to_closed_room() {
    let outline = simplify_room_outline(&traced_rectangle());
    assert_eq!(outline.len(), 4);
    assert_relative_eq!(signed_area(&outline).abs(), 6000.0);

    let world: Vec<Point2<f64>> = outline
        .iter()
        .map(|p| Point2::new(p.x as f64 * PX_TO_M, p.y as f64 * PX_TO_M))
        .collect();

    let config = ExtrudeConfig::default();
    let mesh = extrude_room(&world, &config).unwrap();

    let strips: usize = (0..world.len())
        .map(|i| {
            let len = (world[(i + 1) % world.len()] - world[i]).norm();
            wall_steps(len, config.wall_step)
        })
        .sum();
    assert_eq!(mesh.triangle_count(), 2 * strips + 2 * (world.len() - 2));
    assert_eq!(mesh.normals.len(), mesh.positions.len());

    let (min, max) = mesh.bounds();
    assert_relative_eq!(min.y, 0.0);
    assert_relative_eq!(max.y, config.height as f32, epsilon = 1e-5);
    assert_relative_eq!(max.x - min.x, 2.0, epsilon = 1e-5);
    assert_relative_eq!(max.z - min.z, 1.2, epsilon = 1e-5);
}

#[test]
fn test_soup_expansion_keeps_triangles() {
    let square = vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ];
    let mesh = extrude_room(&square, &ExtrudeConfig::default()).unwrap();
    let soup: TriangleSoup = mesh.to_triangle_soup();
    assert_eq!(soup.triangle_count(), mesh.triangle_count());
    assert_eq!(soup.uvs.len(), soup.triangle_count() * 6);
}
