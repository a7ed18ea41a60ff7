//! Configuration loading
//!
//! Layers the embedded defaults and an optional user file. Only TOML is
//! read; the environment is not consulted.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, File, FileFormat};
use std::path::Path;

/// Embedded default configuration (compiled into the library)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Load the embedded defaults
pub fn load_config() -> Result<AppConfig> {
    build(None)
}

/// Load the embedded defaults overridden by a user file
pub fn load_config_from(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    build(Some(path))
}

fn build(user_file: Option<&Path>) -> Result<AppConfig> {
    let mut builder =
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
    if let Some(path) = user_file {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    }

    let config: AppConfig = builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    config.validate()?;
    Ok(config)
}
