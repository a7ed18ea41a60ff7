//! Diagram source discovery

use tracing::debug;
use vellum_page::{NodeId, Page};

use crate::error::DiscoveryError;
use crate::registry::DiagramSource;
use crate::settings::RenderSettings;

/// A diagram source block found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBlock {
    /// Element carrying the source class (`code.language-mermaid`)
    pub source_node: NodeId,
    /// Nearest replaceable wrapper (`pre`)
    pub wrapper: NodeId,
    /// Literal source text
    pub source: DiagramSource,
}

/// Finds diagram source blocks on a page
#[derive(Debug, Clone)]
pub struct SourceScanner {
    source_class: String,
    wrapper_tag: String,
}

impl SourceScanner {
    /// Create a scanner for `language-<language>` blocks wrapped in `wrapper_tag`
    #[must_use]
    pub fn new(language: &str, wrapper_tag: impl Into<String>) -> Self {
        Self {
            source_class: format!("language-{language}"),
            wrapper_tag: wrapper_tag.into(),
        }
    }

    /// Create a scanner from render settings
    #[must_use]
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            source_class: settings.source_class(),
            wrapper_tag: settings.wrapper_tag.clone(),
        }
    }

    /// Snapshot of the diagram blocks currently on the page, in document order.
    ///
    /// Blocks without a wrapper or with empty text are skipped.
    #[must_use]
    pub fn discover(&self, page: &Page) -> Vec<DiscoveredBlock> {
        page.elements_with_class(&self.source_class)
            .into_iter()
            .filter_map(|node| match self.inspect(page, node) {
                Ok(block) => Some(block),
                Err(err) => {
                    debug!(node = %node, reason = %err, "Skipping diagram source");
                    None
                }
            })
            .collect()
    }

    fn inspect(&self, page: &Page, node: NodeId) -> Result<DiscoveredBlock, DiscoveryError> {
        let wrapper = page
            .closest(node, &self.wrapper_tag)
            .ok()
            .flatten()
            .ok_or(DiscoveryError::MissingWrapper(node))?;
        let text = page
            .text_content(node)
            .map_err(|_| DiscoveryError::MissingWrapper(node))?;
        let source = DiagramSource::new(text)?;

        Ok(DiscoveredBlock {
            source_node: node,
            wrapper,
            source,
        })
    }
}

impl Default for SourceScanner {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}
