//! Application configuration types

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use vellum_diagrams::{KrokiConfig, RenderSettings};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Discovery, markup and engine option settings
    #[serde(default)]
    pub diagrams: RenderSettings,
    /// Kroki engine settings
    #[serde(default)]
    pub kroki: KrokiConfig,
}

impl AppConfig {
    /// Check the settings before any page is touched
    pub fn validate(&self) -> Result<()> {
        self.diagrams
            .validate()
            .context("Invalid [diagrams] configuration")?;
        if self.kroki.base_url.trim().is_empty() {
            anyhow::bail!("Invalid [kroki] configuration: base_url must not be empty");
        }
        Ok(())
    }

    /// Write the configuration as TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}
