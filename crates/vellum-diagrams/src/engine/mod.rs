//! Rendering engine interface
//!
//! The engine is an external collaborator. It is configured once per pass
//! with the resolved theme and then asked to render each diagram under a
//! unique identifier.

pub mod mock;

#[cfg(feature = "kroki")]
pub mod kroki;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::RenderError;
use crate::settings::RenderSettings;
use crate::theme::Theme;

pub use mock::{MockEngine, RenderCall};

#[cfg(feature = "kroki")]
pub use kroki::KrokiEngine;

/// How much the engine trusts diagram sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    /// Encode HTML in labels and disable click handlers
    #[default]
    Strict,
    /// Allow HTML labels and click handlers
    Loose,
    /// Allow HTML labels but strip script content
    Antiscript,
    /// Render inside a sandboxed frame
    Sandbox,
}

impl SecurityLevel {
    /// Option value understood by the engine
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Loose => "loose",
            Self::Antiscript => "antiscript",
            Self::Sandbox => "sandbox",
        }
    }
}

/// Options applied by [`RenderEngine::initialize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    /// Resolved page theme
    #[serde(serialize_with = "serialize_engine_theme")]
    pub theme: Theme,
    /// Font family for diagram text
    pub font_family: String,
    /// Security level
    pub security_level: SecurityLevel,
}

fn serialize_engine_theme<S: Serializer>(theme: &Theme, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(theme.engine_theme())
}

impl EngineOptions {
    /// Build engine options for a theme from render settings
    #[must_use]
    pub fn from_settings(theme: Theme, settings: &RenderSettings) -> Self {
        Self {
            theme,
            font_family: settings.font_family.clone(),
            security_level: settings.security_level,
        }
    }
}

/// Markup produced for one diagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// Rendered markup (typically an `<svg>` element)
    pub markup: String,
}

impl RenderOutput {
    /// Wrap rendered markup
    #[must_use]
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }
}

/// Diagram rendering engine.
///
/// `initialize` replaces the global configuration used by every later
/// `render` call, so callers must not interleave configuration from two
/// passes.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RenderEngine: Send + Sync {
    /// Apply options to all subsequent renders
    fn initialize(&self, options: &EngineOptions);

    /// Render one diagram under a unique identifier
    async fn render(&self, id: &str, source: &str) -> Result<RenderOutput, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_serialize_with_engine_names() {
        let options = EngineOptions::from_settings(Theme::Light, &RenderSettings::default());
        let value = serde_json::to_value(&options).unwrap();

        assert_eq!(value["theme"], "default");
        assert_eq!(value["fontFamily"], "ui-sans-serif, system-ui, sans-serif");
        assert_eq!(value["securityLevel"], "strict");
    }

    #[test]
    fn test_security_level_names() {
        for level in [
            SecurityLevel::Strict,
            SecurityLevel::Loose,
            SecurityLevel::Antiscript,
            SecurityLevel::Sandbox,
        ] {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.as_str()));
        }
    }

    #[tokio::test]
    async fn test_engine_is_object_safe() {
        let engine: Box<dyn RenderEngine> = Box::new(MockEngine::new());
        engine.initialize(&EngineOptions::from_settings(
            Theme::Dark,
            &RenderSettings::default(),
        ));
        let output = engine.render("mermaid-0-0", "graph TD; A-->B;").await.unwrap();
        assert!(output.markup.starts_with("<svg id=\"mermaid-0-0\""));
    }
}
