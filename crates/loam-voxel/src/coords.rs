//! Chunk-grid and column coordinates, chunk dimensions, and global/local conversion.

use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Identifies a chunk's position in the chunk grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Y coordinate.
    pub y: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkCoord {
    /// The six orthogonal neighbor offsets, in `+X, -X, +Y, -Y, +Z, -Z` order.
    pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 6] = [
        (1, 0, 0),
        (-1, 0, 0),
        (0, 1, 0),
        (0, -1, 0),
        (0, 0, 1),
        (0, 0, -1),
    ];

    /// Creates a new chunk coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate offset by `(dx, dy, dz)`.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// The six face-adjacent coordinates, in [`Self::NEIGHBOR_OFFSETS`] order.
    pub fn neighbors(self) -> [ChunkCoord; 6] {
        Self::NEIGHBOR_OFFSETS.map(|(dx, dy, dz)| self.offset(dx, dy, dz))
    }

    /// The column this chunk belongs to.
    pub fn column(self) -> ColumnCoord {
        ColumnCoord::new(self.x, self.z)
    }

    /// Squared Euclidean distance in chunk units.
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }
}

/// A 2D column (x/z) coordinate, used for chunk columns and terrain metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnCoord {
    /// Column X coordinate.
    pub x: i32,
    /// Column Z coordinate.
    pub z: i32,
}

impl ColumnCoord {
    /// Creates a new column coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Squared Euclidean distance in column units.
    pub fn distance_sq(self, other: ColumnCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }
}

/// Chunk side lengths in voxels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkDims {
    /// Voxels along X.
    pub x: usize,
    /// Voxels along Y.
    pub y: usize,
    /// Voxels along Z.
    pub z: usize,
}

impl ChunkDims {
    /// 32×32×32.
    pub const DEFAULT: Self = Self::cubic(32);

    /// Creates dimensions with equal side lengths.
    pub const fn cubic(size: usize) -> Self {
        Self {
            x: size,
            y: size,
            z: size,
        }
    }

    /// Creates dimensions from explicit side lengths.
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Number of voxels in a chunk.
    pub const fn volume(self) -> usize {
        self.x * self.y * self.z
    }

    /// Flat index of `(x, y, z)`: `x + sz_x * (y + sz_y * z)`.
    #[inline]
    pub fn index(self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.x && y < self.y && z < self.z);
        x + self.x * (y + self.y * z)
    }

    /// Returns `true` if the local coordinate lies inside the chunk.
    #[inline]
    pub fn contains(self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.x
            && (y as usize) < self.y
            && (z as usize) < self.z
    }

    /// Side lengths as a signed vector.
    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x as i32, self.y as i32, self.z as i32)
    }
}

impl Default for ChunkDims {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Chunk containing a global voxel coordinate (floor division per axis).
pub fn chunk_coord_of(global: IVec3, dims: ChunkDims) -> ChunkCoord {
    let size = dims.as_ivec3();
    ChunkCoord::new(
        global.x.div_euclid(size.x),
        global.y.div_euclid(size.y),
        global.z.div_euclid(size.z),
    )
}

/// Position of a global voxel coordinate inside its chunk, each component in `0..size`.
pub fn local_of(global: IVec3, dims: ChunkDims) -> IVec3 {
    let size = dims.as_ivec3();
    IVec3::new(
        global.x.rem_euclid(size.x),
        global.y.rem_euclid(size.y),
        global.z.rem_euclid(size.z),
    )
}

/// Global coordinate of a chunk-local position.
pub fn global_of(chunk: ChunkCoord, local: IVec3, dims: ChunkDims) -> IVec3 {
    let size = dims.as_ivec3();
    IVec3::new(chunk.x, chunk.y, chunk.z) * size + local
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
