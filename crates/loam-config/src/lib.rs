//! Configuration for Loam.
//!
//! Settings persist to disk as a RON file. Every section uses
//! `#[serde(default)]`, so older files keep loading as fields are added, and
//! CLI arguments override whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE, Config, DebugConfig, LightingConfig, MeshConfig, TerrainConfig, WorldConfig};
pub use error::ConfigError;
