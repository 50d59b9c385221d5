// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera forward sign detection
//!
//! Pose conventions differ on whether the camera looks down +Z or −Z of its
//! local frame. The sign is settled empirically: whichever sees more of
//! the mesh wins.

use nalgebra::Point3;
use tracing::debug;

use crate::frames::LoadedFrame;

/// Inset used when counting probe hits
const PROBE_INSET: f32 = 2.0;

/// Probe vertices seen in bounds by at least one probe frame
fn hits(
    frames: &[LoadedFrame],
    positions: &[f32],
    sign: f32,
    min_z: f32,
    max_vertices: usize,
) -> usize {
    positions
        .chunks_exact(3)
        .take(max_vertices)
        .filter(|p| {
            let p = Point3::new(p[0], p[1], p[2]);
            frames
                .iter()
                .any(|f| f.project(&p, sign, min_z, PROBE_INSET).is_some())
        })
        .count()
}

/// +1 or −1; ties favour +1, no hits under either sign gives −1
pub fn choose_z_sign(
    frames: &[LoadedFrame],
    positions: &[f32],
    min_z: f32,
    probe_frames: usize,
    probe_vertices: usize,
) -> f32 {
    if frames.is_empty() {
        return -1.0;
    }
    let probe = &frames[..probe_frames.min(frames.len())];
    let plus = hits(probe, positions, 1.0, min_z, probe_vertices);
    let minus = hits(probe, positions, -1.0, min_z, probe_vertices);
    debug!(plus, minus, "z sign probe");

    if plus == 0 && minus == 0 {
        -1.0
    } else if plus >= minus {
        1.0
    } else {
        -1.0
    }
}
