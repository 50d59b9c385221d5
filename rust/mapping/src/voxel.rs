// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sparse voxel hashing
//!
//! A world point belongs to exactly one cell: `floor(coord / size)` per axis.
//! Each axis index is biased by 1 000 000 and masked to 21 bits, and the
//! three are packed into one 63-bit key (`x << 42 | y << 21 | z`), so indices
//! within about ±1 000 000 cells never collide.

use rustc_hash::FxHashMap;

const AXIS_BIAS: i64 = 1_000_000;
const AXIS_MASK: u64 = 0x1F_FFFF;

/// Packed voxel key
pub type VoxelKey = u64;

/// Integer cell index of a coordinate
#[inline]
pub fn cell_index(coord: f32, voxel_size: f32) -> i32 {
    (coord / voxel_size).floor() as i32
}

/// Pack three cell indices into one key
#[inline]
pub fn pack(x: i32, y: i32, z: i32) -> VoxelKey {
    let to21 = |v: i32| ((v as i64 + AXIS_BIAS) as u64) & AXIS_MASK;
    (to21(x) << 42) | (to21(y) << 21) | to21(z)
}

/// Recover the cell indices of a key
#[inline]
pub fn unpack(key: VoxelKey) -> (i32, i32, i32) {
    let from21 = |v: u64| ((v & AXIS_MASK) as i64 - AXIS_BIAS) as i32;
    (from21(key >> 42), from21(key >> 21), from21(key))
}

/// Key of the cell containing a world point
#[inline]
pub fn voxel_key(p: [f32; 3], voxel_size: f32) -> VoxelKey {
    pack(
        cell_index(p[0], voxel_size),
        cell_index(p[1], voxel_size),
        cell_index(p[2], voxel_size),
    )
}

/// Running statistics of one voxel
///
/// Sums are wide (f64 / u64) so the mean does not depend on insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoxelCell {
    pub position_sum: [f64; 3],
    pub color_sum: [u64; 3],
    pub count: u32,
}

impl VoxelCell {
    #[inline]
    pub fn add(&mut self, p: [f32; 3], rgb: [u8; 3]) {
        for axis in 0..3 {
            self.position_sum[axis] += p[axis] as f64;
            self.color_sum[axis] += rgb[axis] as u64;
        }
        self.count += 1;
    }

    /// Fold another cell's statistics into this one
    pub fn merge(&mut self, other: &VoxelCell) {
        for axis in 0..3 {
            self.position_sum[axis] += other.position_sum[axis];
            self.color_sum[axis] += other.color_sum[axis];
        }
        self.count += other.count;
    }

    pub fn mean_position(&self) -> [f32; 3] {
        if self.count == 0 {
            return [0.0; 3];
        }
        let n = self.count as f64;
        [
            (self.position_sum[0] / n) as f32,
            (self.position_sum[1] / n) as f32,
            (self.position_sum[2] / n) as f32,
        ]
    }

    pub fn mean_color(&self) -> [u8; 3] {
        if self.count == 0 {
            return [0; 3];
        }
        let n = self.count as u64;
        [
            (self.color_sum[0] / n).min(255) as u8,
            (self.color_sum[1] / n).min(255) as u8,
            (self.color_sum[2] / n).min(255) as u8,
        ]
    }
}

/// Hash map of voxel cells keyed by packed index
#[derive(Debug, Clone, Default)]
pub struct VoxelGrid {
    voxel_size: f32,
    cells: FxHashMap<VoxelKey, VoxelCell>,
}

impl VoxelGrid {
    pub fn new(voxel_size: f32) -> Self {
        Self {
            voxel_size,
            cells: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Insert a point; returns `true` if it opened a new cell
    #[inline]
    pub fn insert(&mut self, p: [f32; 3], rgb: [u8; 3]) -> bool {
        let key = voxel_key(p, self.voxel_size);
        let mut created = false;
        self.cells
            .entry(key)
            .or_insert_with(|| {
                created = true;
                VoxelCell::default()
            })
            .add(p, rgb);
        created
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn get(&self, key: VoxelKey) -> Option<&VoxelCell> {
        self.cells.get(&key)
    }

    /// Cells sorted by key, for deterministic readout
    pub fn sorted_cells(&self) -> Vec<(VoxelKey, VoxelCell)> {
        let mut cells: Vec<_> = self.cells.iter().map(|(k, c)| (*k, *c)).collect();
        cells.sort_unstable_by_key(|(k, _)| *k);
        cells
    }
}
