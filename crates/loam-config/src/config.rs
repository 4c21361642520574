//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration.
pub const CONFIG_FILE: &str = "config.ron";

/// Largest chunk side the packed vertex format can address.
const MAX_CHUNK_SIDE: usize = 63;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World streaming and residency.
    pub world: WorldConfig,
    /// Terrain generation.
    pub terrain: TerrainConfig,
    /// Mesh building.
    pub mesh: MeshConfig,
    /// Light propagation.
    pub lighting: LightingConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u64,
    /// Chunk dimensions in voxels, `[x, y, z]`.
    pub chunk_size: [usize; 3],
    /// Upper bound on visible (meshed) chunks.
    pub max_visible: usize,
    /// Upper bound on resident chunks.
    pub max_resident: usize,
    /// Chunks streamed in per simulation step.
    pub max_chunks_per_step: usize,
    /// Horizontal streaming radius in chunks.
    pub view_radius: u32,
    /// Vertical streaming radius in chunks.
    pub vertical_radius: u32,
    /// Directory for persisted chunks. Defaults to the platform data directory.
    pub save_dir: Option<PathBuf>,
}

/// Terrain configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Section side length in columns.
    pub section_size: usize,
    /// Half-width of the elevation smoothing filter.
    pub smoothing_radius: usize,
    /// Water fills columns up to this height.
    pub sea_level: i32,
    /// Columns above this height are bare rock.
    pub snow_line: i32,
    /// Constant added to the elevation noise.
    pub ground_offset: i32,
    /// Elevation noise octaves.
    pub elevation_octaves: u32,
    /// Elevation noise lacunarity.
    pub elevation_lacunarity: f64,
    /// Elevation noise persistence.
    pub elevation_persistence: f64,
    /// Elevation noise base frequency.
    pub elevation_frequency: f64,
    /// Elevation noise amplitude in voxels.
    pub elevation_amplitude: f64,
    /// Frequency of the moisture field.
    pub moisture_frequency: f64,
    /// Moisture above which vegetated land is forest.
    pub forest_threshold: f64,
    /// Frequency of the sunflower patch field.
    pub sunflower_frequency: f64,
    /// Field value above which grassland grows a sunflower.
    pub sunflower_threshold: f64,
    /// Frequency of the rose patch field.
    pub roses_frequency: f64,
    /// Field value above which grassland grows roses.
    pub roses_threshold: f64,
    /// Frequency of the tall grass field.
    pub tall_grass_frequency: f64,
    /// Field value above which grassland grows tall grass.
    pub tall_grass_threshold: f64,
    /// Scatter field value above which a culled tree point becomes tall grass.
    pub scatter_grass_threshold: f64,
    /// Scatter field value above which a culled tree point becomes roses.
    pub scatter_roses_threshold: f64,
    /// Expected trees per forest column.
    pub forest_tree_density: f64,
    /// Expected trees per grassland column.
    pub grassland_tree_density: f64,
}

/// Mesh configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshConfig {
    /// Depth of a water surface below its voxel top.
    pub water_delta: f32,
    /// Maximum billboard displacement in voxels.
    pub billboard_jitter: f32,
}

/// Lighting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    /// Skylight level of open sky.
    pub max_lighting: u8,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Steps between session statistics log lines (0 = never).
    pub stats_interval: u64,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            chunk_size: [32, 32, 32],
            max_visible: 1024,
            max_resident: 4096,
            max_chunks_per_step: 8,
            view_radius: 6,
            vertical_radius: 2,
            save_dir: None,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            section_size: 64,
            smoothing_radius: 2,
            sea_level: 0,
            snow_line: 40,
            ground_offset: 6,
            elevation_octaves: 5,
            elevation_lacunarity: 2.0,
            elevation_persistence: 0.5,
            elevation_frequency: 0.004,
            elevation_amplitude: 24.0,
            moisture_frequency: 0.003,
            forest_threshold: 0.15,
            sunflower_frequency: 0.09,
            sunflower_threshold: 0.55,
            roses_frequency: 0.07,
            roses_threshold: 0.5,
            tall_grass_frequency: 0.05,
            tall_grass_threshold: 0.25,
            scatter_grass_threshold: -0.2,
            scatter_roses_threshold: 0.4,
            forest_tree_density: 0.02,
            grassland_tree_density: 0.002,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            water_delta: 0.06,
            billboard_jitter: 0.15,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self { max_lighting: 15 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 60,
        }
    }
}

impl WorldConfig {
    /// Save directory, falling back to `<data dir>/loam/world`.
    pub fn resolved_save_dir(&self) -> PathBuf {
        match &self.save_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("loam")
                .join("world"),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Default config directory: `<config dir>/loam`.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("loam")
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read_file(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let new_config = Self::read_file(&config_path)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.chunk_size.iter().any(|&s| s == 0 || s > MAX_CHUNK_SIDE) {
            return Err(ConfigError::Invalid(format!(
                "chunk_size {:?} must lie in 1..={MAX_CHUNK_SIDE} per axis",
                world.chunk_size
            )));
        }
        if world.max_visible == 0 || world.max_resident < world.max_visible {
            return Err(ConfigError::Invalid(format!(
                "max_resident ({}) must be at least max_visible ({}), which must be positive",
                world.max_resident, world.max_visible
            )));
        }
        if world.max_chunks_per_step == 0 {
            return Err(ConfigError::Invalid("max_chunks_per_step must be positive".to_string()));
        }
        if self.terrain.section_size == 0 {
            return Err(ConfigError::Invalid("section_size must be positive".to_string()));
        }
        if self.terrain.smoothing_radius > self.terrain.section_size {
            return Err(ConfigError::Invalid(format!(
                "smoothing_radius ({}) must not exceed section_size ({})",
                self.terrain.smoothing_radius, self.terrain.section_size
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
