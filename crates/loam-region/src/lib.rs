//! Chunk residency, adjacency tracking, visibility diffs, eviction, and voxel raycasts.

pub mod raycast;
pub mod region;

pub use raycast::raycast;
pub use region::{Diff, DiffKind, RegionConfig, RegionStore};
