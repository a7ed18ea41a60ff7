//! Error types for vellum-page

use thiserror::Error;

use crate::node::NodeId;

/// Page error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Node id does not belong to this page
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Operation needs an element but got a text or HTML node
    #[error("node is not an element: {0}")]
    NotAnElement(NodeId),

    /// Operation needs a node that has a parent
    #[error("node is detached: {0}")]
    Detached(NodeId),

    /// Insertion would make a node its own ancestor
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(String),
}

impl Error {
    /// Get error code for log fields
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound(_) => "node_not_found",
            Self::NotAnElement(_) => "not_an_element",
            Self::Detached(_) => "node_detached",
            Self::HierarchyRequest(_) => "hierarchy_request",
        }
    }
}

/// Result type alias for page operations
pub type Result<T> = std::result::Result<T, Error>;
