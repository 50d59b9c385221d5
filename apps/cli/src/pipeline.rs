// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command implementations

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};
use roomscan_core::{ply, poses, MeshView, PointCloud};
use roomscan_floorplan::{extract_floorplan, save_preview, Floorplan};
use roomscan_geometry::{
    colorize_by_nearest_point, extrude_room, override_horizontal_surfaces, simplify_room_outline,
    Mesh, Point2, SurfaceOverride, TriangleSoup,
};
use roomscan_mapping::{downsample_cloud, find_floor_plane, FloorPlane};
use roomscan_texture::{
    bake_triangle_atlas, bake_triangle_colors, bake_uv_best_frame, bake_uv_gouraud,
    bake_vertex_colors, texture_coordinates, BakeControl, BakeMode, BakeReport, DirectoryLoader,
};
use tracing::{info, warn};

use crate::config::{AppConfig, PipelineParams};

enum BakeOutput {
    Texture(RgbaImage),
    /// RGB per soup vertex
    Colors(Vec<f32>),
}

pub struct Pipeline {
    pub app: AppConfig,
    pub params: PipelineParams,
}

fn load_cloud(path: &Path) -> Result<PointCloud> {
    let cloud = ply::load_point_cloud(path).with_context(|| format!("loading cloud {}", path.display()))?;
    info!(points = cloud.len(), colored = cloud.colors.is_some(), "cloud loaded");
    Ok(cloud)
}

/// World-space outline of the extracted room
fn room_outline(plan: &Floorplan) -> Result<Vec<Point2<f64>>> {
    if !plan.has_polygon() {
        bail!(
            "no room outline found ({} occupied pixels); capture more of the floor",
            plan.occupied
        );
    }
    let simplified = simplify_room_outline(&plan.polygon);
    if simplified.len() < 3 {
        bail!("room outline collapsed to {} corners during simplification", simplified.len());
    }
    info!(raw = plan.polygon.len(), simplified = simplified.len(), "outline simplified");
    Ok(plan.mapping.polygon_to_world(&simplified))
}

fn to_bytes(colors: &[f32]) -> Vec<u8> {
    colors
        .iter()
        .map(|&c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}

/// Triangle soups are written indexed, one index per vertex
fn soup_indices(soup: &TriangleSoup) -> Vec<u32> {
    (0..soup.vertex_count() as u32).collect()
}

/// Write the baked soup with the texture coordinates its texture was
/// painted through
fn write_textured_soup<W: Write>(writer: W, soup: &TriangleSoup, uvs: &[f32], texture: &str) -> Result<()> {
    let indices = soup_indices(soup);
    let view = MeshView {
        uvs: Some(uvs),
        texture_file: Some(texture),
        ..MeshView::new(&soup.positions, &indices)
    };
    ply::write_mesh(writer, &view)?;
    Ok(())
}

fn progress_bar(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")?
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message(message);
    Ok(pb)
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

impl Pipeline {
    fn floor_plane(&self, cloud: &PointCloud) -> Option<FloorPlane> {
        let center_y = cloud.bounds().center()[1] as f32;
        let floor = find_floor_plane(&cloud.positions, center_y, &self.params.ransac)?;
        info!(
            height = floor.plane.height_at_origin(),
            inliers = floor.inlier_count,
            "floor plane found"
        );
        Some(floor)
    }

    /// Height of the dominant floor plane, or 0 when none is found
    fn floor_height(&self, cloud: &PointCloud) -> f32 {
        match self.floor_plane(cloud) {
            Some(floor) => floor.plane.height_at_origin(),
            None => {
                warn!("no floor plane found, mesh floor stays at y = 0");
                0.0
            }
        }
    }

    /// Extrude the outline and lift it onto the floor plane
    fn build_mesh(&self, outline: &[Point2<f64>], floor_y: f32) -> Result<Mesh> {
        let config = self.params.extrude_config(&self.app);
        let mut mesh = extrude_room(outline, &config).context("extruding room")?;
        for p in mesh.positions.chunks_exact_mut(3) {
            p[1] += floor_y;
        }
        info!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            height = config.height,
            "mesh built"
        );
        Ok(mesh)
    }

    pub fn floorplan(&self, cloud: &Path, out: Option<&Path>, preview: Option<&Path>) -> Result<()> {
        info!(path = %cloud.display(), "[1/3] loading point cloud");
        let cloud = load_cloud(cloud)?;

        info!("[2/3] extracting floorplan");
        let plan = extract_floorplan(&cloud, &self.params.floorplan).context("extracting floorplan")?;
        let summary = plan.summary();

        info!("[3/3] writing results");
        let json = summary.to_json()?;
        match out {
            Some(path) => std::fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?,
            None => println!("{json}"),
        }
        if let Some(path) = preview {
            save_preview(&plan, path).with_context(|| format!("writing preview {}", path.display()))?;
        }

        if plan.has_polygon() {
            info!(corners = summary.polygon_px.len(), area_m2 = summary.area_m2, "floorplan ready");
        } else {
            warn!(occupied = plan.occupied, "no room outline yet");
        }
        Ok(())
    }

    pub fn mesh(&self, cloud: &Path, out: &Path) -> Result<()> {
        info!(path = %cloud.display(), "[1/4] loading point cloud");
        let cloud = load_cloud(cloud)?;

        info!("[2/4] extracting floorplan");
        let plan = extract_floorplan(&cloud, &self.params.floorplan).context("extracting floorplan")?;
        let outline = room_outline(&plan)?;

        info!("[3/4] extruding room");
        let floor_y = self.floor_height(&cloud);
        let mesh = self.build_mesh(&outline, floor_y)?;

        info!(path = %out.display(), "[4/4] writing mesh");
        let colors = cloud.colors.is_some().then(|| {
            let mut rgb = colorize_by_nearest_point(&mesh.positions, &cloud, &self.params.colorize);
            let surfaces = SurfaceOverride {
                floor_y,
                ceiling_y: floor_y + self.params.extrude_config(&self.app).height as f32,
                ..self.params.surfaces
            };
            override_horizontal_surfaces(&mut rgb, &mesh.positions, &surfaces);
            to_bytes(&rgb)
        });
        let view = MeshView {
            colors: colors.as_deref(),
            ..MeshView::new(&mesh.positions, &mesh.indices)
        };
        ply::save_mesh(out, &view).with_context(|| format!("writing mesh {}", out.display()))?;
        Ok(())
    }

    pub fn bake(
        &self,
        capture: &Path,
        cloud: Option<&Path>,
        mode: BakeMode,
        out: Option<&Path>,
    ) -> Result<BakeReport> {
        let cloud_path = cloud.map_or_else(|| capture.join("map.ply"), Path::to_path_buf);
        let out = out.map_or_else(
            || capture.join(if mode.is_texture() { "texture.png" } else { "colored.ply" }),
            Path::to_path_buf,
        );

        info!(path = %cloud_path.display(), "[1/5] loading point cloud");
        let cloud = load_cloud(&cloud_path)?;

        info!("[2/5] building room mesh");
        let plan = extract_floorplan(&cloud, &self.params.floorplan).context("extracting floorplan")?;
        let outline = room_outline(&plan)?;
        let mesh = self.build_mesh(&outline, self.floor_height(&cloud))?;

        info!("[3/5] reading pose log");
        let pose_path = capture.join("poses.csv");
        let log = poses::load_poses(&pose_path).with_context(|| format!("reading {}", pose_path.display()))?;
        if log.skipped_rows > 0 {
            warn!(skipped = log.skipped_rows, "malformed pose rows skipped");
        }
        info!(frames = log.len(), "poses loaded");

        info!(mode = mode.name(), "[4/5] baking");
        let config = self.params.bake_config(&self.app, mode);
        let loader = DirectoryLoader::new(capture.join("frames"));
        let soup = mesh.to_triangle_soup();
        let pb = progress_bar("baking")?;
        let bar = pb.clone();
        let control = BakeControl::new().with_progress(move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        });

        let frames = &log.frames;
        let (output, report) = match mode {
            BakeMode::BestFrame => {
                let baked = bake_uv_best_frame(&soup, frames, &loader, &config, &control)?;
                (BakeOutput::Texture(baked.output), baked.report)
            }
            BakeMode::Gouraud => {
                let baked = bake_uv_gouraud(&soup, frames, &loader, &config, &control)?;
                (BakeOutput::Texture(baked.output), baked.report)
            }
            BakeMode::Atlas => {
                let baked = bake_triangle_atlas(&soup, frames, &loader, &config, &control)?;
                (BakeOutput::Texture(baked.output), baked.report)
            }
            BakeMode::Triangles => {
                let baked = bake_triangle_colors(&soup, frames, &loader, &config, &control)?;
                (BakeOutput::Colors(baked.output), baked.report)
            }
            BakeMode::VertexColors => {
                let baked = bake_vertex_colors(&soup, frames, &loader, &config, &control)?;
                (BakeOutput::Colors(baked.output), baked.report)
            }
        };
        pb.finish_and_clear();

        info!(path = %out.display(), "[5/5] writing results");
        match output {
            BakeOutput::Texture(texture) => {
                texture
                    .save(&out)
                    .with_context(|| format!("writing texture {}", out.display()))?;
                let uvs = texture_coordinates(&soup, &config)
                    .with_context(|| format!("{} bakes have no texture coordinates", mode.name()))?;
                let texture_name = out.file_name().and_then(|n| n.to_str()).unwrap_or("texture.png");
                let mesh_path = out.with_file_name("mesh.ply");
                let file = File::create(&mesh_path).with_context(|| format!("creating {}", mesh_path.display()))?;
                write_textured_soup(BufWriter::new(file), &soup, &uvs, texture_name)
                    .with_context(|| format!("writing textured mesh {}", mesh_path.display()))?;
            }
            BakeOutput::Colors(colors) => {
                let indices = soup_indices(&soup);
                let bytes = to_bytes(&colors);
                let view = MeshView {
                    colors: Some(&bytes),
                    ..MeshView::new(&soup.positions, &indices)
                };
                ply::save_mesh(&out, &view).with_context(|| format!("writing colored mesh {}", out.display()))?
            }
        }

        let report_path = out.with_file_name("bake_report.json");
        write_json(&report_path, &report)?;
        info!(
            painted = report.painted,
            relaxed = report.relaxed,
            fallback = report.fallback,
            defaulted = report.defaulted,
            missing = report.frames_missing,
            "bake finished"
        );
        Ok(report)
    }

    pub fn filter(&self, input: &Path, output: &Path, voxel: Option<f32>) -> Result<()> {
        info!(path = %input.display(), "[1/3] loading point cloud");
        let cloud = load_cloud(input)?;

        let voxel = voxel.unwrap_or(self.params.filter.voxel_size);
        if !(voxel > 0.0) {
            bail!("voxel size must be positive, got {voxel}");
        }
        info!(voxel, "[2/3] down-sampling");
        let reduced = downsample_cloud(&cloud, voxel);
        info!(before = cloud.len(), after = reduced.len(), "cloud down-sampled");
        match self.floor_plane(&reduced) {
            Some(floor) => println!(
                "floor plane: {} of {} points within {} m",
                floor.inlier_count,
                reduced.len(),
                self.params.ransac.inlier_threshold
            ),
            None => println!("floor plane: not found"),
        }

        info!(path = %output.display(), "[3/3] writing cloud");
        ply::save_point_cloud(output, &reduced).with_context(|| format!("writing {}", output.display()))?;
        Ok(())
    }
}
