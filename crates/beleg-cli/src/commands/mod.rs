//! Subcommands of the beleg CLI.

pub mod batch;
pub mod config;
pub mod health;
pub mod parse;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use beleg_core::BelegConfig;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("beleg")
        .join("config.json")
}

/// Configuration file named by `--config`, or the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration and apply `OCR_LANG` / `MAX_UPLOAD_MB`.
///
/// An explicit `--config` must exist; the default location is optional.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BelegConfig> {
    let config = match config_path {
        Some(path) => BelegConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Loading config from {}", path.display());
                BelegConfig::from_file(&path)?
            } else {
                BelegConfig::default()
            }
        }
    };

    Ok(config.with_env_overrides())
}
