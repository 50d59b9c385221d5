// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Keyframe trajectory CSV

use crate::error::{Error, Result};
use crate::fast_parse::parse_f32;
use crate::types::TrajectorySample;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

pub const TRAJECTORY_CSV_HEADER: &str = "t,tx,ty,tz,qx,qy,qz,qw";

pub fn write_trajectory<W: Write>(mut writer: W, samples: &[TrajectorySample]) -> Result<()> {
    writeln!(writer, "{TRAJECTORY_CSV_HEADER}")?;
    for s in samples {
        let [tx, ty, tz] = s.position;
        let [qx, qy, qz, qw] = s.orientation;
        writeln!(writer, "{},{tx},{ty},{tz},{qx},{qy},{qz},{qw}", s.timestamp)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_trajectory(path: impl AsRef<Path>, samples: &[TrajectorySample]) -> Result<()> {
    write_trajectory(BufWriter::new(File::create(path)?), samples)
}

/// Read a trajectory written by [`write_trajectory`]
pub fn read_trajectory<R: BufRead>(reader: R) -> Result<Vec<TrajectorySample>> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = i + 1;
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 8 {
            return Err(Error::MissingColumns {
                line: line_no,
                expected: 8,
                found: fields.len(),
            });
        }
        let timestamp: f64 = fields[0]
            .trim()
            .parse()
            .map_err(|_| Error::parse(line_no, "bad timestamp"))?;
        let mut v = [0.0f32; 7];
        for (slot, field) in v.iter_mut().zip(&fields[1..8]) {
            *slot = parse_f32(field)
                .ok_or_else(|| Error::parse(line_no, format!("not a number: '{field}'")))?;
        }
        out.push(TrajectorySample {
            timestamp,
            position: [v[0], v[1], v[2]],
            orientation: [v[3], v[4], v[5], v[6]],
        });
    }
    Ok(out)
}
