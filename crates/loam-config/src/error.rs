//! Errors of the `config.ron` round trip.

use std::path::PathBuf;

/// Why a config file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `config.ron` or its directory could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `config.ron` or its directory could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid RON `Config`. The span points into the file.
    #[error("{}:{source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("cannot encode config as RON: {0}")]
    Serialize(#[source] ron::Error),

    /// A setting the world cannot run with, e.g. a chunk side of 64.
    #[error("invalid config: {0}")]
    Invalid(String),
}
