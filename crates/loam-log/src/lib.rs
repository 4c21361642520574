//! Structured logging for Loam.
//!
//! Console output with uptime timestamps and thread names, plus JSON file
//! logging in debug builds. The level comes from `RUST_LOG` when set, else
//! from the config's `debug.log_level`.

use std::path::Path;

use loam_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info";

/// File name of the JSON log inside `log_dir`.
pub const LOG_FILE: &str = "loam.log";

/// Filter directives for a config, falling back to [`DEFAULT_FILTER`].
pub fn filter_directives(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - Optional directory for the JSON log file (debug builds only)
/// * `debug_build` - Whether this is a debug build (enables file logging)
/// * `config` - Optional configuration supplying the log level
///
/// A second call leaves the first subscriber in place.
///
/// ```no_run
/// use loam_config::Config;
/// use loam_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), cfg!(debug_assertions), Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directives(config);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true) // sim and render threads are named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry().with(env_filter).with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        if subscriber.with(file_layer).try_init().is_err() {
            tracing::warn!("tracing subscriber already installed");
        }
        return;
    }

    if subscriber.try_init().is_err() {
        tracing::warn!("tracing subscriber already installed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_without_config() {
        assert_eq!(filter_directives(None), "info");
    }

    #[test]
    fn test_config_level_is_used() {
        let mut config = Config::default();
        config.debug.log_level = "debug,loam_region=trace".to_string();
        assert_eq!(filter_directives(Some(&config)), "debug,loam_region=trace");

        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        for filter_str in ["info", "debug,loam_terrain=trace", "warn,loam_engine=debug", "error"] {
            assert!(EnvFilter::try_from(filter_str).is_ok(), "failed to parse {filter_str}");
        }
    }

    #[test]
    fn test_init_writes_log_file_in_debug_builds() {
        let dir = tempfile::tempdir().unwrap();
        init_logging(Some(dir.path()), true, None);
        tracing::info!("hello");
        assert!(dir.path().join(LOG_FILE).exists());
        // Second initialization is harmless.
        init_logging(None, false, None);
    }
}
