//! Error types for vellum-diagrams
//!
//! Failures are contained at single-diagram granularity: discovery problems
//! are skipped, render failures become a placeholder in their container and
//! stale results are dropped. Setup operations (settings validation, engine
//! construction) and page edits return the crate-level [`Error`].

use thiserror::Error;
use vellum_page::NodeId;

/// Diagram crate error type
#[derive(Debug, Error)]
pub enum Error {
    /// Page operation failed
    #[error("page error: {0}")]
    Page(#[from] vellum_page::Error),

    /// Invalid settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Engine could not be set up
    #[error("engine error: {0}")]
    Engine(String),
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get error code for log fields
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Page(_) => "page_error",
            Self::Config(_) => "config_error",
            Self::Engine(_) => "engine_error",
        }
    }
}

/// Result type alias for diagram operations
pub type Result<T> = std::result::Result<T, Error>;

/// A source block that cannot become a registered diagram.
///
/// Never surfaced to the page; the scanner logs and skips the block.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    /// No replaceable wrapper around the source element
    #[error("diagram source {0} has no wrapper element")]
    MissingWrapper(NodeId),

    /// Source text is empty
    #[error("diagram source is empty")]
    EmptySource,
}

/// The rendering engine rejected a diagram.
///
/// The message is shown in the diagram's container as is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// Parse or render error reported by the engine
    #[error("{0}")]
    Engine(String),

    /// The engine could not be reached
    #[error("transport error: {0}")]
    Transport(String),
}

impl RenderError {
    /// Create an engine error carrying the engine's message
    #[must_use]
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a transport error
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
