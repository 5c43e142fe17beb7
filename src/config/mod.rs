// Configuration module for wx-uploader
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let mut config = load_config(path)?;

    if let Ok(level) = std::env::var("WX_UPLOADER_LOG_LEVEL") {
        ConfigLoader::validate_log_level(&level).context("WX_UPLOADER_LOG_LEVEL")?;
        config.logging.level = level;
    }

    Ok(config)
}
