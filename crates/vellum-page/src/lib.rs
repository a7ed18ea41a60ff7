//! Vellum Page - In-memory document model
//!
//! This crate provides the document that Vellum's diagram renderer works on:
//! - Page: element tree with DOM-like query and replace operations
//! - Markdown: builds a page from rendered markdown
//! - Mutation: attribute mutation records and their broadcast bus
//! - Serialize: HTML output for a page or a subtree
//! - Error: Error types for page operations
//!
//! ## Usage
//!
//! ```ignore
//! use vellum_page::Page;
//!
//! let mut page = Page::from_markdown("```mermaid\ngraph TD; A-->B;\n```");
//! let mut mutations = page.subscribe();
//!
//! let root = page.root();
//! page.set_attribute(root, "data-theme", "dark")?;
//! let record = mutations.recv().await?;
//! assert_eq!(record.attribute_name, "data-theme");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod markdown;
pub mod mutation;
pub mod node;
pub mod page;
pub mod serialize;

use std::sync::Arc;
use tokio::sync::RwLock;

// Re-export main types
pub use error::{Error, Result};
pub use mutation::{MutationBus, MutationRecord};
pub use node::{ElementData, NodeData, NodeId};
pub use page::Page;
pub use serialize::{escape_attribute, escape_text};

/// A page shared between the renderer, the theme watcher and the host
pub type SharedPage = Arc<RwLock<Page>>;

/// Wrap a page for sharing across tasks
#[must_use]
pub fn shared(page: Page) -> SharedPage {
    Arc::new(RwLock::new(page))
}
