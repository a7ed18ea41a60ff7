//! Page node types
//!
//! Nodes live in an arena owned by [`crate::Page`] and are addressed by
//! [`NodeId`]. Ids stay valid for the lifetime of the page, including after a
//! node has been detached from the tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a node inside one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Create an id from a raw arena index
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw arena index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element payload: tag, ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in insertion order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<NodeId>,
}

impl ElementData {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check the whitespace-separated `class` attribute
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Element with attributes and children
    Element(ElementData),
    /// Literal text, escaped on output
    Text(String),
    /// Pre-rendered HTML fragment, emitted verbatim and opaque to queries
    Html(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self { parent: None, data }
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.data {
            NodeData::Element(element) => &element.children,
            NodeData::Text(_) | NodeData::Html(_) => &[],
        }
    }
}
