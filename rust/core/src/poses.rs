// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pose log CSV (`poses.csv`)
//!
//! One header line, then one row per captured frame:
//! `file,timeNs,w,h,fx,fy,cx,cy` followed by the 16 column-major entries of
//! the camera-to-world matrix. Short or malformed rows are skipped and
//! counted rather than failing the whole log.

use crate::error::Result;
use crate::fast_parse::{parse_f32, parse_i64, parse_u32};
use crate::frame::{FrameRecord, PoseLog};
use crate::types::Pose;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

pub const POSE_CSV_HEADER: &str =
    "file,timeNs,w,h,fx,fy,cx,cy,m00,m01,m02,m03,m10,m11,m12,m13,m20,m21,m22,m23,m30,m31,m32,m33";

const POSE_CSV_COLUMNS: usize = 8 + 16;

fn parse_row(line: &str) -> Option<FrameRecord> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < POSE_CSV_COLUMNS {
        return None;
    }

    let mut matrix = [0.0f32; 16];
    for (slot, field) in matrix.iter_mut().zip(&fields[8..POSE_CSV_COLUMNS]) {
        *slot = parse_f32(field)?;
    }

    Some(FrameRecord {
        file: fields[0].trim().to_string(),
        timestamp_ns: parse_i64(fields[1])?,
        width: parse_u32(fields[2])?,
        height: parse_u32(fields[3])?,
        fx: parse_f32(fields[4])?,
        fy: parse_f32(fields[5])?,
        cx: parse_f32(fields[6])?,
        cy: parse_f32(fields[7])?,
        pose: Pose::from_column_major(matrix),
    })
}

/// Read a pose log; the first line is the header and is not validated
pub fn read_poses<R: BufRead>(reader: R) -> Result<PoseLog> {
    let mut log = PoseLog::default();
    for line in reader.lines().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(&line) {
            Some(frame) => log.frames.push(frame),
            None => log.skipped_rows += 1,
        }
    }
    Ok(log)
}

/// Load `poses.csv`; a missing file is an empty log
pub fn load_poses(path: impl AsRef<Path>) -> Result<PoseLog> {
    match File::open(path) {
        Ok(file) => read_poses(BufReader::new(file)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(PoseLog::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn write_poses<W: Write>(mut writer: W, frames: &[FrameRecord]) -> Result<()> {
    writeln!(writer, "{POSE_CSV_HEADER}")?;
    for f in frames {
        write!(
            writer,
            "{},{},{},{},{},{},{},{}",
            f.file, f.timestamp_ns, f.width, f.height, f.fx, f.fy, f.cx, f.cy
        )?;
        for m in &f.pose.matrix {
            write!(writer, ",{m}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_poses(path: impl AsRef<Path>, frames: &[FrameRecord]) -> Result<()> {
    write_poses(BufWriter::new(File::create(path)?), frames)
}
