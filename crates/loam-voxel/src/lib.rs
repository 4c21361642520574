//! Voxel codes, chunk coordinates, dense chunk storage, and the run-length chunk codec.

pub mod chunk;
pub mod coords;
pub mod mix;
pub mod rle;
pub mod voxel;

pub use chunk::{Chunk, DELETED, EMPTY, MODIFIED};
pub use coords::{ChunkCoord, ChunkDims, ColumnCoord, chunk_coord_of, global_of, local_of};
pub use rle::{CodecError, RunRecord, decode_chunk, encode_chunk};
pub use voxel::VoxelCode;
