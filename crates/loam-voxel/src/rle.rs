//! Run-length chunk codec.
//!
//! A persisted chunk is a sequence of 4-byte little-endian records, each
//! `(voxel_code << 16) | run_length`. Voxels are visited y-outer, x-middle,
//! z-inner. Encoding and decoding share [`codec_position`] so both sides walk
//! the volume in exactly the same order.

use crate::chunk::Chunk;
use crate::coords::ChunkDims;
use crate::voxel::VoxelCode;

/// Size of one persisted record in bytes.
pub const RECORD_BYTES: usize = 4;

/// A single run: `run` consecutive voxels of `voxel` in codec order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRecord {
    /// The voxel code repeated by this run.
    pub voxel: VoxelCode,
    /// Number of consecutive voxels (1..=65535).
    pub run: u16,
}

impl RunRecord {
    /// Packs the record into its `u32` wire form.
    pub fn pack(self) -> u32 {
        ((self.voxel.raw() as u32) << 16) | self.run as u32
    }
}

/// Errors that can occur while decoding a persisted chunk.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// The runs do not add up to the chunk volume.
    #[error("corrupt chunk data: runs cover {actual} voxels, chunk holds {expected}")]
    CorruptChunkData {
        /// Chunk volume.
        expected: usize,
        /// Sum of decoded run lengths.
        actual: usize,
    },
    /// The blob length is not a whole number of records.
    #[error("truncated record: blob is {0} bytes, not a multiple of 4")]
    TruncatedRecord(usize),
    /// A record names a code that cannot be stored in a chunk.
    #[error("unknown voxel code {0}")]
    UnknownVoxelCode(u16),
}

/// Maps the `n`-th voxel of codec order to chunk-local `(x, y, z)`.
///
/// Codec order is y-outer, x-middle, z-inner.
#[inline]
pub fn codec_position(n: usize, dims: ChunkDims) -> (usize, usize, usize) {
    let z = n % dims.z;
    let x = (n / dims.z) % dims.x;
    let y = n / (dims.z * dims.x);
    (x, y, z)
}

/// Collects the runs of a chunk in codec order. Runs are capped at `u16::MAX`.
pub fn encode_runs(chunk: &Chunk) -> Vec<RunRecord> {
    let dims = chunk.dims();
    let mut runs: Vec<RunRecord> = Vec::new();
    for n in 0..dims.volume() {
        let (x, y, z) = codec_position(n, dims);
        let voxel = chunk.voxels()[dims.index(x, y, z)];
        match runs.last_mut() {
            Some(last) if last.voxel == voxel && last.run < u16::MAX => last.run += 1,
            _ => runs.push(RunRecord { voxel, run: 1 }),
        }
    }
    runs
}

/// Encodes a chunk into its persisted blob.
pub fn encode_chunk(chunk: &Chunk) -> Vec<u8> {
    let runs = encode_runs(chunk);
    let mut buf = Vec::with_capacity(runs.len() * RECORD_BYTES);
    for run in runs {
        buf.extend_from_slice(&run.pack().to_le_bytes());
    }
    buf
}

/// Parses the records of a blob without checking them against a volume.
pub fn records_from_bytes(data: &[u8]) -> Result<Vec<RunRecord>, CodecError> {
    if data.len() % RECORD_BYTES != 0 {
        return Err(CodecError::TruncatedRecord(data.len()));
    }
    data.chunks_exact(RECORD_BYTES)
        .map(|bytes| {
            let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let raw = (word >> 16) as u16;
            let voxel = VoxelCode::try_from(raw)
                .ok()
                .filter(|v| !v.is_sentinel())
                .ok_or(CodecError::UnknownVoxelCode(raw))?;
            Ok(RunRecord {
                voxel,
                run: (word & 0xFFFF) as u16,
            })
        })
        .collect()
}

/// Decodes a persisted blob into flat-indexed voxels for a chunk of `dims`.
///
/// The run total is validated against the volume before anything is written.
pub fn decode_chunk(data: &[u8], dims: ChunkDims) -> Result<Vec<VoxelCode>, CodecError> {
    let runs = records_from_bytes(data)?;
    let expected = dims.volume();
    let actual: usize = runs.iter().map(|r| r.run as usize).sum();
    if actual != expected {
        return Err(CodecError::CorruptChunkData { expected, actual });
    }

    let mut voxels = vec![VoxelCode::Empty; expected];
    let mut n = 0;
    for run in runs {
        for _ in 0..run.run {
            let (x, y, z) = codec_position(n, dims);
            voxels[dims.index(x, y, z)] = run.voxel;
            n += 1;
        }
    }
    Ok(voxels)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ChunkCoord;

    fn toy_chunk(voxel: VoxelCode) -> Chunk {
        Chunk::new_filled(ChunkCoord::new(0, 0, 0), ChunkDims::cubic(4), voxel)
    }

    #[test]
    fn test_uniform_chunk_is_single_record() {
        let chunk = toy_chunk(VoxelCode::Dirt);
        let bytes = chunk.to_bytes();
        assert_eq!(bytes.len(), 4);
        let runs = records_from_bytes(&bytes).expect("valid blob");
        assert_eq!(
            runs,
            vec![RunRecord {
                voxel: VoxelCode::Dirt,
                run: 64
            }]
        );
        let decoded = Chunk::from_bytes(chunk.coord(), chunk.dims(), &bytes).expect("decode");
        assert!(decoded.voxels().iter().all(|&v| v == VoxelCode::Dirt));
    }

    #[test]
    fn test_single_edit_splits_first_run() {
        let mut chunk = toy_chunk(VoxelCode::Dirt);
        chunk.set_voxel(0, 0, 0, VoxelCode::Empty);
        let runs = records_from_bytes(&chunk.to_bytes()).expect("valid blob");
        assert_eq!(
            runs,
            vec![
                RunRecord {
                    voxel: VoxelCode::Empty,
                    run: 1
                },
                RunRecord {
                    voxel: VoxelCode::Dirt,
                    run: 63
                },
            ]
        );
    }

    #[test]
    fn test_record_wire_layout_is_code_high_run_low_le() {
        let chunk = toy_chunk(VoxelCode::Dirt);
        let bytes = chunk.to_bytes();
        let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(word >> 16, VoxelCode::Dirt.raw() as u32);
        assert_eq!(word & 0xFFFF, 64);
    }

    #[test]
    fn test_traversal_is_y_outer_x_middle_z_inner() {
        let dims = ChunkDims::new(2, 2, 3);
        assert_eq!(codec_position(0, dims), (0, 0, 0));
        assert_eq!(codec_position(1, dims), (0, 0, 1));
        assert_eq!(codec_position(3, dims), (1, 0, 0));
        assert_eq!(codec_position(6, dims), (0, 1, 0));

        // A z-column of stone at x=0,y=0 encodes as one leading run.
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0), dims);
        for z in 0..3 {
            chunk.set_voxel(0, 0, z, VoxelCode::Stone);
        }
        let runs = encode_runs(&chunk);
        assert_eq!(runs[0], RunRecord { voxel: VoxelCode::Stone, run: 3 });
        assert_eq!(runs[1], RunRecord { voxel: VoxelCode::Empty, run: 9 });
    }

    #[test]
    fn test_round_trip_non_cubic_mixed_content() {
        let dims = ChunkDims::new(5, 3, 7);
        let mut chunk = Chunk::new(ChunkCoord::new(-2, 1, 3), dims);
        let palette = VoxelCode::REAL;
        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let pick = (x * 7 + y * 3 + z * z) % palette.len();
                    chunk.set_voxel(x, y, z, palette[pick]);
                }
            }
        }
        chunk.refresh_empty();
        let decoded = Chunk::from_bytes(chunk.coord(), dims, &chunk.to_bytes()).expect("decode");
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn test_long_runs_are_capped() {
        let chunk = Chunk::new_filled(ChunkCoord::new(0, 0, 0), ChunkDims::new(64, 32, 64), VoxelCode::Stone);
        let runs = encode_runs(&chunk);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].run, u16::MAX);
        let total: usize = runs.iter().map(|r| r.run as usize).sum();
        assert_eq!(total, chunk.dims().volume());
        let decoded = Chunk::from_bytes(chunk.coord(), chunk.dims(), &chunk.to_bytes()).expect("decode");
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn test_short_total_is_corrupt() {
        let record = RunRecord { voxel: VoxelCode::Dirt, run: 10 };
        let result = decode_chunk(&record.pack().to_le_bytes(), ChunkDims::cubic(4));
        assert_eq!(
            result,
            Err(CodecError::CorruptChunkData {
                expected: 64,
                actual: 10
            })
        );
    }

    #[test]
    fn test_overlong_total_is_corrupt_not_out_of_bounds() {
        let mut bytes = Vec::new();
        for _ in 0..2 {
            bytes.extend_from_slice(&RunRecord { voxel: VoxelCode::Dirt, run: 60 }.pack().to_le_bytes());
        }
        assert!(matches!(
            decode_chunk(&bytes, ChunkDims::cubic(4)),
            Err(CodecError::CorruptChunkData { expected: 64, actual: 120 })
        ));
    }

    #[test]
    fn test_truncated_and_unknown_records() {
        assert_eq!(
            decode_chunk(&[1, 2, 3], ChunkDims::cubic(4)),
            Err(CodecError::TruncatedRecord(3))
        );
        let sentinel = ((VoxelCode::CubeLower.raw() as u32) << 16) | 64;
        assert_eq!(
            decode_chunk(&sentinel.to_le_bytes(), ChunkDims::cubic(4)),
            Err(CodecError::UnknownVoxelCode(VoxelCode::CubeLower.raw()))
        );
        let bogus = (4_000u32 << 16) | 64;
        assert_eq!(
            decode_chunk(&bogus.to_le_bytes(), ChunkDims::cubic(4)),
            Err(CodecError::UnknownVoxelCode(4_000))
        );
    }
}
