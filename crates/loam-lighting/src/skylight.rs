//! Per-voxel skylight storage and flood-fill propagation.
//!
//! Skylight enters through the top slice of a chunk wherever that slice lies
//! above the terrain surface, then spreads with a BFS that loses one level per
//! step. Opaque voxels stop propagation. A straight-down step into a partially
//! opaque voxel (leaves) keeps the current level.

use std::collections::VecDeque;

use loam_voxel::{Chunk, ChunkDims};

/// Light level assigned to directly sky-lit voxels unless configured otherwise.
pub const DEFAULT_MAX_LIGHTING: u8 = 15;

/// One light byte per voxel, using the chunk's flat indexing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightMap {
    dims: ChunkDims,
    levels: Vec<u8>,
}

impl LightMap {
    /// Creates a fully dark light map.
    pub fn new_dark(dims: ChunkDims) -> Self {
        Self {
            dims,
            levels: vec![0; dims.volume()],
        }
    }

    /// Dimensions of the lit chunk.
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// Returns the level at `(x, y, z)`, or 0 if out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        if x >= self.dims.x || y >= self.dims.y || z >= self.dims.z {
            return 0;
        }
        self.levels[self.dims.index(x, y, z)]
    }

    /// Raw levels in flat-index order, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.levels
    }

    /// Highest level present in the map.
    pub fn max_level(&self) -> u8 {
        self.levels.iter().copied().max().unwrap_or(0)
    }
}

/// The six axis-aligned neighbour offsets.
const NEIGHBORS_6: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Computes skylight for a single chunk.
///
/// `obstruction(gx, gz)` returns the global y of the terrain surface for a
/// global column. Columns whose top slice is not above it receive no seed.
pub fn propagate_skylight<F>(chunk: &Chunk, obstruction: F, max_lighting: u8) -> LightMap
where
    F: Fn(i32, i32) -> i32,
{
    let dims = chunk.dims();
    let mut map = LightMap::new_dark(dims);
    if dims.volume() == 0 || max_lighting == 0 {
        return map;
    }

    let coord = chunk.coord();
    let origin_x = coord.x * dims.x as i32;
    let origin_z = coord.z * dims.z as i32;
    let top = dims.y - 1;
    let top_gy = coord.y * dims.y as i32 + top as i32;

    let mut queue = VecDeque::new();
    for z in 0..dims.z {
        for x in 0..dims.x {
            if top_gy <= obstruction(origin_x + x as i32, origin_z + z as i32) {
                continue;
            }
            if chunk.get_voxel(x, top, z).is_opaque() {
                continue;
            }
            map.levels[dims.index(x, top, z)] = max_lighting;
            queue.push_back((x, top, z));
        }
    }

    let size = dims.as_ivec3();
    while let Some((x, y, z)) = queue.pop_front() {
        let current = map.levels[dims.index(x, y, z)];
        for (dx, dy, dz) in NEIGHBORS_6 {
            let (nx, ny, nz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
            if !(0..size.x).contains(&nx) || !(0..size.y).contains(&ny) || !(0..size.z).contains(&nz) {
                continue;
            }
            let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
            let voxel = chunk.get_voxel(nx, ny, nz);
            if voxel.is_opaque() {
                continue;
            }
            let cost = if dy == -1 && voxel.is_partially_opaque() { 0 } else { 1 };
            let level = current.saturating_sub(cost);
            let slot = &mut map.levels[dims.index(nx, ny, nz)];
            if level > *slot {
                *slot = level;
                queue.push_back((nx, ny, nz));
            }
        }
    }

    map
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
