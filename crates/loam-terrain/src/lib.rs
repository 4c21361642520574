//! Procedural terrain: landcover/elevation sections, elevation smoothing,
//! noise decoration, Poisson-disk feature placement, and trees.

mod heightmap;

pub mod feature;
pub mod generator;
pub mod section;
pub mod seed;
pub mod service;
pub mod tree;

pub use feature::{Elimination, FeatureVoxel, poisson_disk_elimination};
pub use generator::{DecorationParams, TerrainError, TerrainGenerator, TerrainParams};
pub use heightmap::{HeightmapParams, HeightmapSampler};
pub use section::{Landcover, Section, SectionMap};
pub use service::{NoiseSectionService, SectionService};
pub use tree::{build_tree, plant_tree};
