use loam_config::ConfigError;
use loam_persist::StoreError;
use loam_terrain::TerrainError;

/// Errors surfaced by the simulation loop.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Persisting or loading a chunk failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A chunk was filled before its sections were resident.
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    /// Settings came from an unusable config.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
