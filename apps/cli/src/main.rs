// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RoomScan CLI - room captures to floorplans, meshes and textures.
//!
//! A capture directory holds the accumulated cloud, the pose log and the
//! frame images:
//!
//! ```text
//! capture/
//!   map.ply
//!   poses.csv
//!   frames/000001.jpg ...
//! ```
//!
//! # Commands
//!
//! - `floorplan` - floor outline of a cloud as JSON (and a preview image)
//! - `mesh` - extruded room mesh, coloured from the cloud when it has colours
//! - `bake` - mesh plus a photo texture or per-vertex colours from the frames
//! - `filter` - voxel down-sampled cloud with a floor-plane check

use anyhow::{Context, Result};

mod args;
mod config;
mod pipeline;

use args::Command;
use config::{AppConfig, PipelineParams};
use pipeline::Pipeline;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "roomscan=info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = args::parse(&args)?;
    if invocation.command == Command::Help {
        args::print_usage();
        return Ok(());
    }

    let mut app = AppConfig::from_env();
    let params = match &invocation.params {
        Some(path) => PipelineParams::load(path)?,
        None => PipelineParams::default(),
    };

    tracing::info!(
        worker_threads = app.worker_threads,
        params = ?invocation.params,
        "Starting RoomScan"
    );

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(app.worker_threads)
        .build_global()
        .context("failed to initialize rayon thread pool")?;

    // Flags override the environment
    match invocation.command {
        Command::Floorplan { cloud, out, preview } => {
            Pipeline { app, params }.floorplan(&cloud, out.as_deref(), preview.as_deref())
        }
        Command::Mesh {
            cloud,
            out,
            height,
            wall_step,
        } => {
            app.wall_height = height.or(app.wall_height);
            app.wall_step = wall_step.or(app.wall_step);
            Pipeline { app, params }.mesh(&cloud, &out)
        }
        Command::Bake {
            capture,
            cloud,
            mode,
            out,
        } => {
            let mode = mode.unwrap_or_else(|| params.bake_mode(&app));
            let report = Pipeline { app, params }.bake(&capture, cloud.as_deref(), mode, out.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Filter { input, output, voxel } => Pipeline { app, params }.filter(&input, &output, voxel),
        Command::Help => Ok(()),
    }
}
