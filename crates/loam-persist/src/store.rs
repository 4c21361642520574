//! Chunk blobs on disk.
//!
//! Chunks live under `base/y_{y}/chunk_{x}_{y}_{z}.lrc`, grouped by height so
//! no single directory collects every chunk of a world. Each file is exactly
//! the codec blob of [`Chunk::to_bytes`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use loam_voxel::{Chunk, ChunkCoord, ChunkDims};

use crate::error::StoreError;

/// File extension of persisted chunks.
pub const CHUNK_EXTENSION: &str = "lrc";

/// Path of a chunk's blob below `base`.
pub fn chunk_path(base: &Path, coord: ChunkCoord) -> PathBuf {
    base.join(format!("y_{}", coord.y))
        .join(format!("chunk_{}_{}_{}.{}", coord.x, coord.y, coord.z, CHUNK_EXTENSION))
}

/// A directory of persisted chunks.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    base: PathBuf,
}

impl ChunkStore {
    /// Opens the store at `base`, creating the directory if needed.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base = base.into();
        fs::create_dir_all(&base).map_err(|e| StoreError::io(&base, e))?;
        tracing::info!("chunk store opened at {}", base.display());
        Ok(Self { base })
    }

    /// Root directory of the store.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Writes a chunk, replacing any previous blob.
    ///
    /// The blob goes to a temporary sibling first and is renamed into place,
    /// so a crash never leaves a half-written chunk behind.
    pub fn save_chunk(&self, chunk: &Chunk) -> Result<(), StoreError> {
        let path = chunk_path(&self.base, chunk.coord());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let tmp = path.with_extension(format!("{CHUNK_EXTENSION}.tmp"));
        fs::write(&tmp, chunk.to_bytes()).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;
        tracing::debug!("saved chunk {:?}", chunk.coord());
        Ok(())
    }

    /// Loads a chunk if a blob exists for it.
    pub fn load_chunk_if_exists(&self, coord: ChunkCoord, dims: ChunkDims) -> Result<Option<Chunk>, StoreError> {
        let path = chunk_path(&self.base, coord);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        match Chunk::from_bytes(coord, dims, &bytes) {
            Ok(chunk) => {
                tracing::debug!("loaded chunk {:?}", coord);
                Ok(Some(chunk))
            }
            Err(source) => {
                tracing::warn!("chunk {:?} at {} is corrupt: {}", coord, path.display(), source);
                Err(StoreError::Corrupt { coord, source })
            }
        }
    }

    /// Removes a chunk's blob. Missing blobs are not an error.
    pub fn delete_chunk(&self, coord: ChunkCoord) -> Result<(), StoreError> {
        let path = chunk_path(&self.base, coord);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Returns `true` if a blob exists for the chunk.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        chunk_path(&self.base, coord).is_file()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use loam_voxel::{CodecError, VoxelCode};

    const DIMS: ChunkDims = ChunkDims::cubic(8);

    #[test]
    fn test_path_layout() {
        let path = chunk_path(Path::new("/w"), ChunkCoord::new(-1, 2, 30));
        assert_eq!(path, PathBuf::from("/w/y_2/chunk_-1_2_30.lrc"));
    }

    #[test]
    fn test_missing_chunk_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        let loaded = store.load_chunk_if_exists(ChunkCoord::new(0, 0, 0), DIMS).unwrap();
        assert!(loaded.is_none());
        assert!(!store.contains(ChunkCoord::new(0, 0, 0)));
    }

    #[test]
    fn test_save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path().join("world")).unwrap();
        let coord = ChunkCoord::new(3, -2, 7);
        let mut chunk = Chunk::new_filled(coord, DIMS, VoxelCode::Stone);
        chunk.set_voxel(1, 2, 3, VoxelCode::Water);

        store.save_chunk(&chunk).unwrap();
        assert!(store.contains(coord));
        let loaded = store.load_chunk_if_exists(coord, DIMS).unwrap().unwrap();
        assert_eq!(loaded.voxels(), chunk.voxels());
        assert_eq!(loaded.get_voxel(1, 2, 3), VoxelCode::Water);

        store.delete_chunk(coord).unwrap();
        assert!(!store.contains(coord));
        store.delete_chunk(coord).unwrap();
    }

    #[test]
    fn test_corrupt_blob_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        let coord = ChunkCoord::new(0, 0, 0);
        let path = chunk_path(dir.path(), coord);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        // One Dirt run of 10 voxels for a 512-voxel chunk.
        let record = ((VoxelCode::Dirt.raw() as u32) << 16) | 10;
        fs::write(&path, record.to_le_bytes()).unwrap();

        match store.load_chunk_if_exists(coord, DIMS) {
            Err(StoreError::Corrupt { coord: c, source }) => {
                assert_eq!(c, coord);
                assert_eq!(
                    source,
                    CodecError::CorruptChunkData {
                        expected: 512,
                        actual: 10
                    }
                );
            }
            other => panic!("expected corrupt chunk, got {other:?}"),
        }
    }

    #[test]
    fn test_open_fails_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(ChunkStore::open(&file), Err(StoreError::Io { .. })));
    }
}
