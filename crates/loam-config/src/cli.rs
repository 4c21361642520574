//! Command-line argument parsing for the `loam` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Loam command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "loam", about = "Headless Loam world session")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Horizontal streaming radius in chunks.
    #[arg(long)]
    pub view_radius: Option<u32>,

    /// Directory for persisted chunks.
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Number of simulation steps to run.
    #[arg(long, default_value_t = 600)]
    pub steps: u64,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Config directory from `--config`, else the platform default.
    pub fn config_dir(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_dir)
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(radius) = args.view_radius {
            self.world.view_radius = radius;
        }
        if let Some(ref dir) = args.save_dir {
            self.world.save_dir = Some(dir.clone());
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
