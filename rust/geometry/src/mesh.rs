// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};

/// Indexed triangle mesh with per-vertex UVs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz); empty until [`Mesh::compute_normals`]
    pub normals: Vec<f32>,
    /// Texture coordinates (u, v)
    pub uvs: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::new(),
            uvs: Vec::with_capacity(vertex_count * 2),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex, returning its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, u: f32, v: f32) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);
        self.uvs.push(u);
        self.uvs.push(v);
        index
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn position(&self, i: usize) -> Point3<f32> {
        Point3::new(
            self.positions[i * 3],
            self.positions[i * 3 + 1],
            self.positions[i * 3 + 2],
        )
    }

    /// Calculate bounds (min, max)
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            min.x = min.x.min(chunk[0]);
            min.y = min.y.min(chunk[1]);
            min.z = min.z.min(chunk[2]);
            max.x = max.x.max(chunk[0]);
            max.y = max.y.max(chunk[1]);
            max.z = max.z.max(chunk[2]);
        });

        (min, max)
    }

    /// Area-weighted vertex normals
    ///
    /// Each vertex gets the normalised sum of the unnormalised face normals
    /// of its triangles; vertices with no usable faces get +Y.
    pub fn compute_normals(&mut self) {
        let mut acc = vec![Vector3::<f32>::zeros(); self.vertex_count()];

        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let v0 = self.position(i0);
            let n = (self.position(i1) - v0).cross(&(self.position(i2) - v0));
            acc[i0] += n;
            acc[i1] += n;
            acc[i2] += n;
        }

        self.normals.clear();
        self.normals.reserve(acc.len() * 3);
        for n in acc {
            let len = n.norm();
            if len > 1e-8 {
                self.normals.extend_from_slice(&[n.x / len, n.y / len, n.z / len]);
            } else {
                self.normals.extend_from_slice(&[0.0, 1.0, 0.0]);
            }
        }
    }

    /// Expand to an unindexed triangle soup: three vertices per triangle
    pub fn to_triangle_soup(&self) -> TriangleSoup {
        let mut positions = Vec::with_capacity(self.indices.len() * 3);
        let mut uvs = Vec::with_capacity(self.indices.len() * 2);
        let has_uvs = self.uvs.len() == self.vertex_count() * 2;
        for &i in &self.indices {
            let i = i as usize;
            positions.extend_from_slice(&self.positions[i * 3..i * 3 + 3]);
            if has_uvs {
                uvs.extend_from_slice(&self.uvs[i * 2..i * 2 + 2]);
            } else {
                uvs.extend_from_slice(&[0.0, 0.0]);
            }
        }
        TriangleSoup { positions, uvs }
    }
}

/// Unindexed triangles: 9 position floats and 6 UV floats per triangle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleSoup {
    pub positions: Vec<f32>,
    pub uvs: Vec<f32>,
}

impl TriangleSoup {
    /// Wrap raw buffers, checking that they describe whole triangles
    pub fn from_parts(positions: Vec<f32>, uvs: Vec<f32>) -> Result<Self> {
        if positions.is_empty() {
            return Err(Error::EmptyMesh("triangle soup has no vertices".into()));
        }
        if positions.len() % 9 != 0 {
            return Err(Error::InvalidMesh(format!(
                "{} position floats is not a whole number of triangles",
                positions.len()
            )));
        }
        if uvs.len() != positions.len() / 3 * 2 {
            return Err(Error::InvalidMesh(format!(
                "expected {} uv floats, found {}",
                positions.len() / 3 * 2,
                uvs.len()
            )));
        }
        Ok(Self { positions, uvs })
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 9
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn vertex(&self, v: usize) -> Point3<f32> {
        Point3::new(
            self.positions[v * 3],
            self.positions[v * 3 + 1],
            self.positions[v * 3 + 2],
        )
    }

    /// Corners of triangle `t`
    #[inline]
    pub fn triangle(&self, t: usize) -> [Point3<f32>; 3] {
        [self.vertex(t * 3), self.vertex(t * 3 + 1), self.vertex(t * 3 + 2)]
    }

    /// UVs of triangle `t`
    #[inline]
    pub fn triangle_uvs(&self, t: usize) -> [[f32; 2]; 3] {
        let o = t * 6;
        let uv = &self.uvs;
        [[uv[o], uv[o + 1]], [uv[o + 2], uv[o + 3]], [uv[o + 4], uv[o + 5]]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0), 0.0, 0.0);
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0), 1.0, 0.0);
        let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0), 1.0, 1.0);
        let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0), 0.0, 1.0);
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
        mesh
    }

    #[test]
    fn test_compute_normals_flat_quad() {
        let mut mesh = quad();
        mesh.compute_normals();
        assert_eq!(mesh.normals.len(), 12);
        for n in mesh.normals.chunks_exact(3) {
            assert_relative_eq!(n[2], 1.0);
        }
    }

    #[test]
    fn test_isolated_vertex_defaults_up() {
        let mut mesh = quad();
        mesh.add_vertex(Point3::new(5.0, 5.0, 5.0), 0.0, 0.0);
        mesh.compute_normals();
        assert_eq!(&mesh.normals[12..15], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_triangle_soup_expansion() {
        let soup = quad().to_triangle_soup();
        assert_eq!(soup.positions.len(), 18);
        assert_eq!(soup.uvs.len(), 12);
        assert_eq!(soup.triangle_count(), 2);
        // Second triangle is (a, c, d)
        assert_eq!(soup.vertex(4), Point3::new(1.0, 1.0, 0.0));
        assert_eq!(soup.triangle_uvs(1)[2], [0.0, 1.0]);
    }

    #[test]
    fn test_from_parts_validation() {
        assert!(matches!(
            TriangleSoup::from_parts(vec![], vec![]),
            Err(Error::EmptyMesh(_))
        ));
        assert!(matches!(
            TriangleSoup::from_parts(vec![0.0; 9], vec![0.0; 4]),
            Err(Error::InvalidMesh(_))
        ));
        assert!(TriangleSoup::from_parts(vec![0.0; 9], vec![0.0; 6]).is_ok());
    }

    #[test]
    fn test_bounds() {
        let mut mesh = quad();
        mesh.add_vertex(Point3::new(0.5, -1.0, 2.0), 0.0, 0.0);
        let (min, max) = mesh.bounds();
        assert_eq!(min, Point3::new(0.0, -1.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 2.0));
        assert_eq!(Mesh::new().bounds(), (Point3::origin(), Point3::origin()));
    }
}
