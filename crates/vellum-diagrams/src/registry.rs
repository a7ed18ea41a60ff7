//! Diagram registry
//!
//! Owns the association between a rendered container and the original
//! source text captured at discovery. Entries are never removed; their
//! container markup is overwritten by every pass.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use vellum_page::NodeId;

use crate::error::DiscoveryError;

/// Original diagram text, immutable and never empty
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagramSource(Arc<str>);

impl DiagramSource {
    /// Capture source text; empty text is rejected
    pub fn new(text: impl Into<String>) -> Result<Self, DiscoveryError> {
        let text = text.into();
        if text.is_empty() {
            return Err(DiscoveryError::EmptySource);
        }
        Ok(Self(Arc::from(text)))
    }

    /// Source text exactly as discovered
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiagramSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for DiagramSource {
    type Error = DiscoveryError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

/// A registered diagram: container identity plus its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    /// Container element on the page
    pub container: NodeId,
    /// Original source text
    pub source: DiagramSource,
}

/// Container to source mapping in registration order
#[derive(Debug, Default, Clone)]
pub struct DiagramRegistry {
    entries: IndexMap<NodeId, DiagramSource>,
}

impl DiagramRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the entry's position.
    ///
    /// Overwriting keeps the position of the first registration.
    pub fn register(&mut self, container: NodeId, source: DiagramSource) -> usize {
        self.entries.insert_full(container, source).0
    }

    /// Source registered for a container
    #[must_use]
    pub fn lookup(&self, container: NodeId) -> Option<&DiagramSource> {
        self.entries.get(&container)
    }

    /// Registration position of a container
    #[must_use]
    pub fn position(&self, container: NodeId) -> Option<usize> {
        self.entries.get_index_of(&container)
    }

    /// Entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &DiagramSource)> + '_ {
        self.entries.iter().map(|(container, source)| (*container, source))
    }

    /// Owned copy of all entries for one pass
    #[must_use]
    pub fn snapshot(&self) -> Vec<RenderedDiagram> {
        self.entries()
            .map(|(container, source)| RenderedDiagram {
                container,
                source: source.clone(),
            })
            .collect()
    }

    /// Number of registered diagrams
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
