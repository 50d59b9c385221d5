// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RoomScan Geometry Processing
//!
//! Room outline simplification, ear-clipping triangulation and extrusion of
//! the outline into a textured wall/floor/ceiling mesh, using nalgebra for
//! the vector math.

pub mod atlas;
pub mod colorize;
pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod orthogonalize;
pub mod polygon;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use atlas::AtlasLayout;
pub use colorize::{colorize_by_nearest_point, override_horizontal_surfaces, ColorizeParams, SurfaceOverride};
pub use error::{Error, Result};
pub use extrusion::{extrude_room, ExtrudeConfig, UvLayout};
pub use mesh::{Mesh, TriangleSoup};
pub use orthogonalize::{dominant_axis, orthogonalize};
pub use polygon::{clean, perimeter, signed_area, simplify_room_outline, CleanParams, PixelPolygon};
pub use triangulation::triangulate;
