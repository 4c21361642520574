//! Skylight propagation over chunk voxels.

pub mod skylight;

pub use skylight::{DEFAULT_MAX_LIGHTING, LightMap, propagate_skylight};
