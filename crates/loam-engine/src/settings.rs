//! Runtime settings derived from [`Config`].

use std::path::PathBuf;

use loam_config::Config;
use loam_lighting::DEFAULT_MAX_LIGHTING;
use loam_mesh::MeshParams;
use loam_region::RegionConfig;
use loam_terrain::{DecorationParams, HeightmapParams, TerrainParams};
use loam_voxel::ChunkDims;

/// Reach of player edits, in voxels traversed.
pub const DEFAULT_REACH: usize = 8;

/// How far and how fast chunks stream in around the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamingSettings {
    /// Horizontal radius in chunks.
    pub view_radius: u32,
    /// Vertical radius in chunks.
    pub vertical_radius: u32,
    /// Chunks loaded or generated per step.
    pub max_chunks_per_step: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            view_radius: 6,
            vertical_radius: 2,
            max_chunks_per_step: 8,
        }
    }
}

/// Everything a [`World`](crate::World) needs to run.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    /// Chunk dimensions and the visible/resident bounds.
    pub region: RegionConfig,
    /// Terrain generation. Its `chunk_dims` follow `region.dims`.
    pub terrain: TerrainParams,
    pub mesh: MeshParams,
    /// Skylight level of open sky.
    pub max_lighting: u8,
    pub streaming: StreamingSettings,
    /// Voxels a place/remove ray may traverse.
    pub reach: usize,
    /// Directory of persisted chunks.
    pub save_dir: PathBuf,
    /// Steps between statistics log lines (0 = never).
    pub stats_interval: u64,
}

impl EngineSettings {
    /// Settings with defaults everywhere except the save directory.
    pub fn with_save_dir(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            region: RegionConfig::default(),
            terrain: TerrainParams::default(),
            mesh: MeshParams::default(),
            max_lighting: DEFAULT_MAX_LIGHTING,
            streaming: StreamingSettings::default(),
            reach: DEFAULT_REACH,
            save_dir: save_dir.into(),
            stats_interval: 0,
        }
    }

    /// Uses `dims` for both the region and terrain generation.
    pub fn set_chunk_dims(&mut self, dims: ChunkDims) {
        self.region.dims = dims;
        self.terrain.chunk_dims = dims;
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        let world = &config.world;
        let t = &config.terrain;
        let [x, y, z] = world.chunk_size;
        let dims = ChunkDims::new(x, y, z);

        let terrain = TerrainParams {
            seed: world.seed,
            chunk_dims: dims,
            section_size: t.section_size,
            smoothing_radius: t.smoothing_radius,
            sea_level: t.sea_level,
            snow_line: t.snow_line,
            ground_offset: t.ground_offset,
            elevation: HeightmapParams {
                seed: 0,
                octaves: t.elevation_octaves,
                lacunarity: t.elevation_lacunarity,
                persistence: t.elevation_persistence,
                base_frequency: t.elevation_frequency,
                amplitude: t.elevation_amplitude,
            },
            moisture_frequency: t.moisture_frequency,
            forest_threshold: t.forest_threshold,
            decoration: DecorationParams {
                sunflower_frequency: t.sunflower_frequency,
                sunflower_threshold: t.sunflower_threshold,
                roses_frequency: t.roses_frequency,
                roses_threshold: t.roses_threshold,
                tall_grass_frequency: t.tall_grass_frequency,
                tall_grass_threshold: t.tall_grass_threshold,
                scatter_grass_threshold: t.scatter_grass_threshold,
                scatter_roses_threshold: t.scatter_roses_threshold,
            },
            forest_tree_density: t.forest_tree_density,
            grassland_tree_density: t.grassland_tree_density,
        };

        Self {
            region: RegionConfig {
                dims,
                max_visible: world.max_visible,
                max_resident: world.max_resident,
            },
            terrain,
            mesh: MeshParams {
                water_delta: config.mesh.water_delta,
                billboard_jitter: config.mesh.billboard_jitter,
            },
            max_lighting: config.lighting.max_lighting,
            streaming: StreamingSettings {
                view_radius: world.view_radius,
                vertical_radius: world.vertical_radius,
                max_chunks_per_step: world.max_chunks_per_step,
            },
            reach: DEFAULT_REACH,
            save_dir: world.resolved_save_dir(),
            stats_interval: config.debug.stats_interval,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
