//! Render settings
//!
//! Markup contract and engine options shared by the scanner, the pipeline
//! and the watcher. Deserialized from the `[diagrams]` and `[kroki]` tables
//! of the application configuration.

use serde::{Deserialize, Serialize};

use crate::engine::SecurityLevel;
use crate::error::{Error, Result};

/// Settings for discovery and rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Code block language that marks a diagram source (`language-<x>` class)
    #[serde(default = "default_language")]
    pub language: String,
    /// Tag of the element replaced by the rendered container
    #[serde(default = "default_wrapper_tag")]
    pub wrapper_tag: String,
    /// Class of rendered containers
    #[serde(default = "default_container_class")]
    pub container_class: String,
    /// Position index attribute on rendered containers
    #[serde(default = "default_index_attribute")]
    pub index_attribute: String,
    /// Theme marker attribute on the document root
    #[serde(default = "default_theme_attribute")]
    pub theme_attribute: String,
    /// Prefix of render identifiers (`<prefix>-<epoch>-<index>`)
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// Class of the error placeholder
    #[serde(default = "default_error_class")]
    pub error_class: String,
    /// Font family passed to the engine
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Security level passed to the engine
    #[serde(default)]
    pub security_level: SecurityLevel,
}

fn default_language() -> String {
    "mermaid".to_string()
}
fn default_wrapper_tag() -> String {
    "pre".to_string()
}
fn default_container_class() -> String {
    "mermaid".to_string()
}
fn default_index_attribute() -> String {
    "data-diagram-index".to_string()
}
fn default_theme_attribute() -> String {
    "data-theme".to_string()
}
fn default_id_prefix() -> String {
    "mermaid".to_string()
}
fn default_error_class() -> String {
    "diagram-error".to_string()
}
fn default_font_family() -> String {
    "ui-sans-serif, system-ui, sans-serif".to_string()
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
            wrapper_tag: default_wrapper_tag(),
            container_class: default_container_class(),
            index_attribute: default_index_attribute(),
            theme_attribute: default_theme_attribute(),
            id_prefix: default_id_prefix(),
            error_class: default_error_class(),
            font_family: default_font_family(),
            security_level: SecurityLevel::default(),
        }
    }
}

impl RenderSettings {
    /// Class that marks a diagram source element
    #[must_use]
    pub fn source_class(&self) -> String {
        format!("language-{}", self.language)
    }

    /// Reject settings that would break the markup contract
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("language", &self.language),
            ("wrapper_tag", &self.wrapper_tag),
            ("container_class", &self.container_class),
            ("index_attribute", &self.index_attribute),
            ("theme_attribute", &self.theme_attribute),
            ("id_prefix", &self.id_prefix),
            ("error_class", &self.error_class),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{field} must not be empty")));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(Error::config(format!("{field} must not contain whitespace")));
            }
        }
        // render ids double as element ids
        if !self.id_prefix.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(Error::config("id_prefix must start with an ASCII letter"));
        }
        Ok(())
    }
}

/// Kroki engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KrokiConfig {
    /// Kroki server URL
    #[serde(default = "default_kroki_url")]
    pub base_url: String,
    /// Kroki diagram type endpoint
    #[serde(default = "default_language")]
    pub diagram_type: String,
    /// Request timeout in seconds (0 = no limit)
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_kroki_url() -> String {
    "https://kroki.io".to_string()
}

impl Default for KrokiConfig {
    fn default() -> Self {
        Self {
            base_url: default_kroki_url(),
            diagram_type: default_language(),
            timeout_secs: 0,
        }
    }
}
