// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASCII PLY reading and writing
//!
//! Only the subset written by capture tools is supported: `format ascii 1.0`,
//! a vertex element with float `x y z` (optionally followed by float
//! texture coordinates `s t` and by uchar `red green blue`) and, for
//! meshes, a face element of triangle lists. Textured meshes name their
//! image in a `comment TextureFile` header line.

use crate::error::{Error, Result};
use crate::fast_parse::{parse_channel, parse_f32, parse_u32, split_whitespace_fields};
use crate::point_cloud::PointCloud;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Parsed header of an ASCII PLY file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlyHeader {
    pub vertex_count: usize,
    pub face_count: usize,
    pub has_uv: bool,
    pub has_color: bool,
    pub texture_file: Option<String>,
}

impl PlyHeader {
    /// First colour column of a vertex row
    #[inline]
    fn color_column(&self) -> usize {
        if self.has_uv {
            5
        } else {
            3
        }
    }
}

/// Indexed triangle mesh as stored in a PLY file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlyMesh {
    pub positions: Vec<f32>,
    /// `s, t` per vertex; empty when the file has no texture coordinates
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
    pub texture_file: Option<String>,
}

/// Borrowed buffers of a mesh to write
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshView<'a> {
    pub positions: &'a [f32],
    pub indices: &'a [u32],
    /// `s, t` per vertex
    pub uvs: Option<&'a [f32]>,
    /// `r, g, b` per vertex
    pub colors: Option<&'a [u8]>,
    /// Image the texture coordinates refer to
    pub texture_file: Option<&'a str>,
}

impl<'a> MeshView<'a> {
    pub fn new(positions: &'a [f32], indices: &'a [u32]) -> Self {
        Self {
            positions,
            indices,
            ..Default::default()
        }
    }

    /// Check that every buffer agrees with the vertex count
    pub fn validate(&self) -> Result<()> {
        if self.positions.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "{} position floats is not a whole number of vertices",
                self.positions.len()
            )));
        }
        let vertex_count = self.positions.len() / 3;
        if self.indices.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "{} indices is not a whole number of triangles",
                self.indices.len()
            )));
        }
        if let Some(&i) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(Error::InvalidMesh(format!(
                "index {i} out of range for {vertex_count} vertices"
            )));
        }
        if let Some(uvs) = self.uvs {
            if uvs.len() != vertex_count * 2 {
                return Err(Error::InvalidMesh(format!(
                    "expected {} uv floats, found {}",
                    vertex_count * 2,
                    uvs.len()
                )));
            }
        }
        if let Some(colors) = self.colors {
            if colors.len() != vertex_count * 3 {
                return Err(Error::InvalidMesh(format!(
                    "expected {} colour bytes, found {}",
                    vertex_count * 3,
                    colors.len()
                )));
            }
        }
        Ok(())
    }
}

fn element_count(line: &str, line_no: usize) -> Result<usize> {
    line.split_ascii_whitespace()
        .last()
        .and_then(parse_u32)
        .map(|n| n as usize)
        .ok_or_else(|| Error::parse(line_no, format!("bad element count: {line}")))
}

/// Read the header up to and including `end_header`
///
/// Returns the header and the number of lines consumed.
pub fn read_header<R: BufRead>(lines: &mut std::io::Lines<R>) -> Result<(PlyHeader, usize)> {
    let mut header = PlyHeader::default();
    let mut line_no = 0usize;

    match lines.next() {
        Some(line) => {
            line_no += 1;
            if line?.trim() != "ply" {
                return Err(Error::InvalidHeader("missing 'ply' magic".into()));
            }
        }
        None => return Err(Error::InvalidHeader("empty file".into())),
    }

    for line in lines {
        let line = line?;
        line_no += 1;
        let line = line.trim();
        if line == "end_header" {
            return Ok((header, line_no));
        }
        if let Some(format) = line.strip_prefix("format ") {
            if format.trim() != "ascii 1.0" {
                return Err(Error::InvalidHeader(format!(
                    "unsupported format '{}'",
                    format.trim()
                )));
            }
        } else if line.starts_with("element vertex") {
            header.vertex_count = element_count(line, line_no)?;
        } else if line.starts_with("element face") {
            header.face_count = element_count(line, line_no)?;
        } else if line.starts_with("property uchar red") {
            header.has_color = true;
        } else if line == "property float s" {
            header.has_uv = true;
        } else if let Some(file) = line.strip_prefix("comment TextureFile ") {
            header.texture_file = Some(file.trim().to_string());
        }
    }

    Err(Error::InvalidHeader("missing end_header".into()))
}

fn parse_xyz(line: &str, line_no: usize) -> Result<[f32; 3]> {
    let mut fields = split_whitespace_fields(line);
    let mut xyz = [0.0f32; 3];
    for (found, slot) in xyz.iter_mut().enumerate() {
        let field = fields.next().ok_or(Error::MissingColumns {
            line: line_no,
            expected: 3,
            found,
        })?;
        *slot = parse_f32(field)
            .ok_or_else(|| Error::parse(line_no, format!("not a number: '{field}'")))?;
    }
    Ok(xyz)
}

/// Read an ASCII point cloud
///
/// Reads at most `element vertex` rows. Colour channels are clamped to
/// 0..=255; rows without colour in a coloured file default to white.
pub fn read_point_cloud<R: BufRead>(reader: R) -> Result<PointCloud> {
    let mut lines = reader.lines();
    let (header, mut line_no) = read_header(&mut lines)?;
    let mut cloud = PointCloud::with_capacity(header.vertex_count, header.has_color);

    for line in lines.take(header.vertex_count) {
        let line = line?;
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let xyz = parse_xyz(&line, line_no)?;
        let mut rgb = [255u8; 3];
        if header.has_color {
            let channels: Vec<u8> = split_whitespace_fields(&line)
                .skip(header.color_column())
                .take(3)
                .filter_map(parse_channel)
                .collect();
            if channels.len() == 3 {
                rgb.copy_from_slice(&channels);
            }
        }
        cloud.push(xyz, rgb);
    }

    Ok(cloud)
}

/// Load a point cloud from disk
pub fn load_point_cloud(path: impl AsRef<Path>) -> Result<PointCloud> {
    let file = File::open(path)?;
    read_point_cloud(BufReader::new(file))
}

/// Write a point cloud, with colour properties when the cloud has colours
pub fn write_point_cloud<W: Write>(mut writer: W, cloud: &PointCloud) -> Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", cloud.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if cloud.colors.is_some() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "end_header")?;

    for i in 0..cloud.len() {
        let [x, y, z] = cloud.point(i);
        if cloud.colors.is_some() {
            let [r, g, b] = cloud.color(i);
            writeln!(writer, "{x} {y} {z} {r} {g} {b}")?;
        } else {
            writeln!(writer, "{x} {y} {z}")?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn save_point_cloud(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    write_point_cloud(BufWriter::new(File::create(path)?), cloud)
}

fn parse_st(line: &str, line_no: usize) -> Result<[f32; 2]> {
    let fields: Vec<&str> = split_whitespace_fields(line).skip(3).take(2).collect();
    if fields.len() < 2 {
        return Err(Error::MissingColumns {
            line: line_no,
            expected: 5,
            found: 3 + fields.len(),
        });
    }
    let mut st = [0.0f32; 2];
    for (slot, field) in st.iter_mut().zip(&fields) {
        *slot = parse_f32(field)
            .ok_or_else(|| Error::parse(line_no, format!("not a number: '{field}'")))?;
    }
    Ok(st)
}

/// Read an ASCII triangle mesh; faces that are not triangles are skipped
pub fn read_mesh<R: BufRead>(reader: R) -> Result<PlyMesh> {
    let mut lines = reader.lines();
    let (header, mut line_no) = read_header(&mut lines)?;
    let mut mesh = PlyMesh {
        positions: Vec::with_capacity(header.vertex_count * 3),
        uvs: Vec::with_capacity(if header.has_uv { header.vertex_count * 2 } else { 0 }),
        indices: Vec::with_capacity(header.face_count * 3),
        texture_file: header.texture_file.clone(),
    };

    let mut vertices_left = header.vertex_count;
    let mut faces_left = header.face_count;
    for line in lines {
        let line = line?;
        line_no += 1;
        if vertices_left > 0 {
            vertices_left -= 1;
            mesh.positions.extend_from_slice(&parse_xyz(&line, line_no)?);
            if header.has_uv {
                mesh.uvs.extend_from_slice(&parse_st(&line, line_no)?);
            }
            continue;
        }
        if faces_left == 0 {
            break;
        }
        faces_left -= 1;

        let fields: Vec<&str> = split_whitespace_fields(&line).collect();
        if fields.first().and_then(|f| parse_u32(f)) != Some(3) {
            continue;
        }
        if fields.len() < 4 {
            return Err(Error::MissingColumns {
                line: line_no,
                expected: 4,
                found: fields.len(),
            });
        }
        for field in &fields[1..4] {
            let index = parse_u32(field)
                .ok_or_else(|| Error::parse(line_no, format!("bad vertex index '{field}'")))?;
            mesh.indices.push(index);
        }
    }

    Ok(mesh)
}

pub fn load_mesh(path: impl AsRef<Path>) -> Result<PlyMesh> {
    read_mesh(BufReader::new(File::open(path)?))
}

/// Write an indexed triangle mesh
///
/// Buffers are checked with [`MeshView::validate`] before anything is
/// written.
pub fn write_mesh<W: Write>(mut writer: W, mesh: &MeshView) -> Result<()> {
    mesh.validate()?;
    let vertex_count = mesh.positions.len() / 3;
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    if let Some(file) = mesh.texture_file {
        writeln!(writer, "comment TextureFile {file}")?;
    }
    writeln!(writer, "element vertex {vertex_count}")?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if mesh.uvs.is_some() {
        writeln!(writer, "property float s")?;
        writeln!(writer, "property float t")?;
    }
    if mesh.colors.is_some() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "element face {}", mesh.indices.len() / 3)?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, p) in mesh.positions.chunks_exact(3).enumerate() {
        write!(writer, "{} {} {}", p[0], p[1], p[2])?;
        if let Some(uv) = mesh.uvs {
            write!(writer, " {} {}", uv[i * 2], uv[i * 2 + 1])?;
        }
        if let Some(c) = mesh.colors {
            write!(writer, " {} {} {}", c[i * 3], c[i * 3 + 1], c[i * 3 + 2])?;
        }
        writeln!(writer)?;
    }
    for tri in mesh.indices.chunks_exact(3) {
        writeln!(writer, "3 {} {} {}", tri[0], tri[1], tri[2])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_mesh(path: impl AsRef<Path>, mesh: &MeshView) -> Result<()> {
    mesh.validate()?;
    write_mesh(BufWriter::new(File::create(path)?), mesh)
}
