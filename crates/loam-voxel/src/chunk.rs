//! Dense chunk storage with lifecycle flags.
//!
//! [`Chunk`] owns one [`VoxelCode`] per cell of its [`ChunkDims`] volume, laid
//! out with x varying fastest. Out-of-bounds access is handled without panics.

use crate::coords::{ChunkCoord, ChunkDims};
use crate::rle::{self, CodecError};
use crate::voxel::VoxelCode;

/// Flag bit: the chunk was evicted and awaits consumption of its deletion diff.
pub const DELETED: u8 = 0b0000_0001;
/// Flag bit: the chunk holds no voxels and is never meshed.
pub const EMPTY: u8 = 0b0000_0010;
/// Flag bit: the chunk was edited since it was last saved.
pub const MODIFIED: u8 = 0b0000_0100;

/// A fixed-size block of voxel codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    coord: ChunkCoord,
    dims: ChunkDims,
    voxels: Vec<VoxelCode>,
    flags: u8,
}

impl Chunk {
    /// Creates a chunk filled with air. It is flagged [`EMPTY`].
    pub fn new(coord: ChunkCoord, dims: ChunkDims) -> Self {
        Self {
            coord,
            dims,
            voxels: vec![VoxelCode::Empty; dims.volume()],
            flags: EMPTY,
        }
    }

    /// Creates a chunk filled with a single code.
    pub fn new_filled(coord: ChunkCoord, dims: ChunkDims, voxel: VoxelCode) -> Self {
        debug_assert!(!voxel.is_sentinel());
        let flags = if voxel.is_empty() { EMPTY } else { 0 };
        Self {
            coord,
            dims,
            voxels: vec![voxel; dims.volume()],
            flags,
        }
    }

    /// Decodes a persisted blob produced by [`Chunk::to_bytes`].
    pub fn from_bytes(coord: ChunkCoord, dims: ChunkDims, bytes: &[u8]) -> Result<Self, CodecError> {
        let voxels = rle::decode_chunk(bytes, dims)?;
        let mut chunk = Self {
            coord,
            dims,
            voxels,
            flags: 0,
        };
        chunk.refresh_empty();
        Ok(chunk)
    }

    /// Encodes the chunk into its persisted blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        rle::encode_chunk(self)
    }

    /// The chunk's grid coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// The chunk's dimensions.
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// Returns the code at `(x, y, z)`, or air if out of bounds.
    pub fn get_voxel(&self, x: usize, y: usize, z: usize) -> VoxelCode {
        if x >= self.dims.x || y >= self.dims.y || z >= self.dims.z {
            tracing::warn!("Chunk::get_voxel out of bounds: ({}, {}, {})", x, y, z);
            return VoxelCode::Empty;
        }
        self.voxels[self.dims.index(x, y, z)]
    }

    /// Returns the code at a flat index, or air if out of range.
    pub fn get_index(&self, index: usize) -> VoxelCode {
        self.voxels.get(index).copied().unwrap_or_default()
    }

    /// Sets the code at `(x, y, z)`.
    ///
    /// Returns `false` without writing if the position is out of bounds or the
    /// code is a sentinel.
    pub fn set_voxel(&mut self, x: usize, y: usize, z: usize, voxel: VoxelCode) -> bool {
        if x >= self.dims.x || y >= self.dims.y || z >= self.dims.z {
            tracing::warn!("Chunk::set_voxel out of bounds: ({}, {}, {})", x, y, z);
            return false;
        }
        let index = self.dims.index(x, y, z);
        self.set_index(index, voxel)
    }

    /// Sets the code at a flat index. Same rejection rules as [`Chunk::set_voxel`].
    pub fn set_index(&mut self, index: usize, voxel: VoxelCode) -> bool {
        if voxel.is_sentinel() {
            tracing::warn!("refusing to store sentinel {:?}", voxel);
            return false;
        }
        let Some(slot) = self.voxels.get_mut(index) else {
            return false;
        };
        *slot = voxel;
        true
    }

    /// All voxels in flat-index order.
    pub fn voxels(&self) -> &[VoxelCode] {
        &self.voxels
    }

    /// Number of non-air voxels.
    pub fn count_non_empty(&self) -> usize {
        self.voxels.iter().filter(|v| !v.is_empty()).count()
    }

    /// Sets or clears [`EMPTY`] according to the current contents.
    pub fn refresh_empty(&mut self) {
        if self.voxels.iter().all(|v| v.is_empty()) {
            self.flags |= EMPTY;
        } else {
            self.flags &= !EMPTY;
        }
    }

    /// Returns the current flag bits.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns `true` if every bit of `flag` is set.
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag == flag
    }

    /// Sets flag bits.
    pub fn set_flag(&mut self, flag: u8) {
        self.flags |= flag;
    }

    /// Clears flag bits.
    pub fn clear_flag(&mut self, flag: u8) {
        self.flags &= !flag;
    }

    /// Shorthand for `has_flag(DELETED)`.
    pub fn is_deleted(&self) -> bool {
        self.has_flag(DELETED)
    }

    /// Shorthand for `has_flag(EMPTY)`.
    pub fn is_empty(&self) -> bool {
        self.has_flag(EMPTY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> ChunkCoord {
        ChunkCoord::new(0, 0, 0)
    }

    #[test]
    fn test_new_chunk_is_empty_air() {
        let chunk = Chunk::new(origin(), ChunkDims::cubic(4));
        assert!(chunk.is_empty());
        assert_eq!(chunk.count_non_empty(), 0);
        assert_eq!(chunk.voxels().len(), 64);
    }

    #[test]
    fn test_set_then_get_uses_flat_index() {
        let dims = ChunkDims::new(4, 3, 2);
        let mut chunk = Chunk::new(origin(), dims);
        assert!(chunk.set_voxel(3, 2, 1, VoxelCode::Stone));
        assert_eq!(chunk.get_voxel(3, 2, 1), VoxelCode::Stone);
        assert_eq!(chunk.get_index(3 + 4 * (2 + 3)), VoxelCode::Stone);
    }

    #[test]
    fn test_out_of_bounds_access_is_harmless() {
        let mut chunk = Chunk::new(origin(), ChunkDims::cubic(4));
        assert!(!chunk.set_voxel(4, 0, 0, VoxelCode::Dirt));
        assert_eq!(chunk.get_voxel(0, 9, 0), VoxelCode::Empty);
        assert_eq!(chunk.get_index(1_000), VoxelCode::Empty);
    }

    #[test]
    fn test_sentinels_are_rejected() {
        let mut chunk = Chunk::new(origin(), ChunkDims::cubic(4));
        assert!(!chunk.set_voxel(0, 0, 0, VoxelCode::OpaqueLower));
        assert_eq!(chunk.get_voxel(0, 0, 0), VoxelCode::Empty);
    }

    #[test]
    fn test_refresh_empty_tracks_contents() {
        let mut chunk = Chunk::new(origin(), ChunkDims::cubic(4));
        chunk.set_voxel(1, 1, 1, VoxelCode::Sand);
        chunk.refresh_empty();
        assert!(!chunk.is_empty());
        chunk.set_voxel(1, 1, 1, VoxelCode::Empty);
        chunk.refresh_empty();
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_flags_set_and_clear_independently() {
        let mut chunk = Chunk::new_filled(origin(), ChunkDims::cubic(2), VoxelCode::Dirt);
        assert_eq!(chunk.flags(), 0);
        chunk.set_flag(DELETED | MODIFIED);
        assert!(chunk.is_deleted());
        assert!(chunk.has_flag(MODIFIED));
        chunk.clear_flag(MODIFIED);
        assert!(chunk.is_deleted());
        assert!(!chunk.has_flag(MODIFIED));
    }
}
