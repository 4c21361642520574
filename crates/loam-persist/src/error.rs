use std::path::PathBuf;

use loam_voxel::{ChunkCoord, CodecError};
use thiserror::Error;

/// Errors from the chunk store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A chunk file or directory could not be read, written or removed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The chunk file exists but does not decode to a chunk of the
    /// requested dimensions.
    #[error("corrupt chunk {coord:?}: {source}")]
    Corrupt {
        coord: ChunkCoord,
        #[source]
        source: CodecError,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
