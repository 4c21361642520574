//! File-per-chunk persistence over the run-length codec.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{CHUNK_EXTENSION, ChunkStore, chunk_path};
