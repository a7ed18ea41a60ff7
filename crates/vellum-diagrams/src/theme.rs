//! Theme resolution
//!
//! The active theme is derived on demand: an explicit value on the document
//! root wins, otherwise the host's dark-mode preference decides.

use serde::{Deserialize, Serialize};
use std::fmt;
use vellum_page::Page;

use crate::settings::RenderSettings;

/// Visual theme of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
}

impl Theme {
    /// Parse an explicit theme marker (`"dark"` / `"light"`)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("dark") {
            Some(Self::Dark)
        } else if value.eq_ignore_ascii_case("light") {
            Some(Self::Light)
        } else {
            None
        }
    }

    /// Theme name understood by the rendering engine
    #[must_use]
    pub fn engine_theme(self) -> &'static str {
        match self {
            Self::Light => "default",
            Self::Dark => "dark",
        }
    }

    /// Marker value for this theme
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the active theme from an explicit marker and the ambient preference.
///
/// Absent or unrecognised markers fall back to the preference.
#[must_use]
pub fn resolve_theme(explicit: Option<&str>, prefers_dark: bool) -> Theme {
    match explicit.and_then(Theme::parse) {
        Some(theme) => theme,
        None if prefers_dark => Theme::Dark,
        None => Theme::Light,
    }
}

/// Reads the theme marker attribute from a page root
#[derive(Debug, Clone)]
pub struct ThemeResolver {
    attribute: String,
}

impl ThemeResolver {
    /// Create a resolver for the given root attribute
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    /// Create a resolver from render settings
    #[must_use]
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(settings.theme_attribute.clone())
    }

    /// Attribute this resolver reads
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Resolve the theme of a page
    #[must_use]
    pub fn resolve(&self, page: &Page) -> Theme {
        let explicit = page
            .get_attribute(page.root(), &self.attribute)
            .ok()
            .flatten();
        resolve_theme(explicit, page.prefers_dark_scheme())
    }
}

impl Default for ThemeResolver {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}
