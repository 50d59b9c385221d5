// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line parsing

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use roomscan_texture::BakeMode;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Floorplan {
        cloud: PathBuf,
        out: Option<PathBuf>,
        preview: Option<PathBuf>,
    },
    Mesh {
        cloud: PathBuf,
        out: PathBuf,
        height: Option<f64>,
        wall_step: Option<f64>,
    },
    Bake {
        capture: PathBuf,
        cloud: Option<PathBuf>,
        mode: Option<BakeMode>,
        out: Option<PathBuf>,
    },
    Filter {
        input: PathBuf,
        output: PathBuf,
        voxel: Option<f32>,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    pub params: Option<PathBuf>,
}

pub fn print_usage() {
    println!(
        r#"roomscan - room capture to floorplan, mesh and texture

Usage:
  roomscan <command> [options]

Commands:
  floorplan <cloud.ply> [--out plan.json] [--preview plan.png]
      Extract the floor outline of a point cloud
  mesh <cloud.ply> --out mesh.ply [--height H] [--wall-step S]
      Extract, simplify and extrude the room into a mesh
  bake <capture_dir> [--cloud map.ply] [--mode MODE] [--out texture.png]
      Full pipeline over <capture_dir>/frames and <capture_dir>/poses.csv
      MODE: best-frame, gouraud, atlas, triangles, vertex-colors
  filter <in.ply> <out.ply> [--voxel SIZE]
      Voxel down-sample a cloud and look for the floor plane

Options:
  --params FILE    JSON file with pipeline parameters
  -h, --help       Show this message

Environment:
  ROOMSCAN_WALL_HEIGHT, ROOMSCAN_WALL_STEP, ROOMSCAN_TEXTURE_WIDTH,
  ROOMSCAN_TEXTURE_HEIGHT, ROOMSCAN_MAX_FRAMES, ROOMSCAN_DOWNSCALE_MAX_W,
  ROOMSCAN_BAKE_MODE, ROOMSCAN_WORKER_THREADS, RUST_LOG
"#
    );
}

/// Parse the arguments following the program name
pub fn parse(args: &[String]) -> Result<Invocation> {
    let mut positional: Vec<&str> = Vec::new();
    let mut params = None;
    let mut out = None;
    let mut preview = None;
    let mut cloud = None;
    let mut mode = None;
    let mut height = None;
    let mut wall_step = None;
    let mut voxel = None;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .map(String::as_str)
                .ok_or_else(|| anyhow!("missing value for {arg}"))
        };
        match arg {
            "-h" | "--help" => {
                return Ok(Invocation {
                    command: Command::Help,
                    params: None,
                })
            }
            "--params" => params = Some(PathBuf::from(value()?)),
            "--out" | "-o" => out = Some(PathBuf::from(value()?)),
            "--preview" => preview = Some(PathBuf::from(value()?)),
            "--cloud" => cloud = Some(PathBuf::from(value()?)),
            "--mode" => mode = Some(value()?.parse::<BakeMode>()?),
            "--height" => {
                let v = value()?;
                height = Some(v.parse::<f64>().with_context(|| format!("invalid height {v:?}"))?);
            }
            "--wall-step" => {
                let v = value()?;
                wall_step = Some(v.parse::<f64>().with_context(|| format!("invalid wall step {v:?}"))?);
            }
            "--voxel" => {
                let v = value()?;
                voxel = Some(v.parse::<f32>().with_context(|| format!("invalid voxel size {v:?}"))?);
            }
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            other => positional.push(other),
        }
        i += 1;
    }

    let Some((&name, rest)) = positional.split_first() else {
        return Ok(Invocation {
            command: Command::Help,
            params,
        });
    };
    let arity = |n: usize| -> Result<()> {
        if rest.len() != n {
            bail!("{name} expects {n} path argument(s), got {}", rest.len());
        }
        Ok(())
    };

    let command = match name {
        "floorplan" => {
            arity(1)?;
            Command::Floorplan {
                cloud: rest[0].into(),
                out,
                preview,
            }
        }
        "mesh" => {
            arity(1)?;
            Command::Mesh {
                cloud: rest[0].into(),
                out: out.ok_or_else(|| anyhow!("mesh requires --out"))?,
                height,
                wall_step,
            }
        }
        "bake" => {
            arity(1)?;
            Command::Bake {
                capture: rest[0].into(),
                cloud,
                mode,
                out,
            }
        }
        "filter" => {
            arity(2)?;
            Command::Filter {
                input: rest[0].into(),
                output: rest[1].into(),
                voxel,
            }
        }
        other => bail!("unknown command: {other}"),
    };
    Ok(Invocation { command, params })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_bake() {
        let inv = parse(&args("bake cap --mode gouraud --out tex.png --params p.json")).unwrap();
        assert_eq!(inv.params, Some(PathBuf::from("p.json")));
        assert_eq!(
            inv.command,
            Command::Bake {
                capture: "cap".into(),
                cloud: None,
                mode: Some(BakeMode::Gouraud),
                out: Some("tex.png".into()),
            }
        );
    }

    #[test]
    fn test_parse_mesh_needs_out() {
        assert!(parse(&args("mesh cloud.ply")).is_err());
        let inv = parse(&args("mesh cloud.ply --out m.ply --height 2.5")).unwrap();
        match inv.command {
            Command::Mesh { height, wall_step, .. } => {
                assert_eq!(height, Some(2.5));
                assert_eq!(wall_step, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_filter_takes_two_paths() {
        assert!(parse(&args("filter in.ply")).is_err());
        let inv = parse(&args("filter in.ply out.ply --voxel 0.05")).unwrap();
        assert_eq!(
            inv.command,
            Command::Filter {
                input: "in.ply".into(),
                output: "out.ply".into(),
                voxel: Some(0.05),
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&args("bake cap --mode sepia")).is_err());
        assert!(parse(&args("bake cap --out")).is_err());
        assert!(parse(&args("floorplan a.ply --frobnicate")).is_err());
        assert!(parse(&args("paint a.ply")).is_err());
    }

    #[test]
    fn test_no_command_is_help() {
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
        assert_eq!(parse(&args("bake -h")).unwrap().command, Command::Help);
    }
}
