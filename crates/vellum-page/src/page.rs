//! Page element tree
//!
//! A [`Page`] is an arena of nodes rooted at an `html` element with a single
//! `body` child. It offers the small set of DOM operations the diagram
//! renderer needs: class queries, `closest`, text extraction, node
//! replacement and attribute access with mutation records.

use tokio::sync::broadcast;
use tracing::trace;

use crate::error::{Error, Result};
use crate::mutation::{MutationBus, MutationRecord};
use crate::node::{ElementData, Node, NodeData, NodeId};

/// An in-memory document
#[derive(Debug)]
pub struct Page {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    prefers_dark_scheme: bool,
    mutations: MutationBus,
}

impl Page {
    /// Create an empty `<html><body></body></html>` page
    #[must_use]
    pub fn new() -> Self {
        let mut page = Self {
            nodes: Vec::new(),
            root: NodeId::new(0),
            body: NodeId::new(0),
            prefers_dark_scheme: false,
            mutations: MutationBus::default(),
        };
        page.root = page.alloc(NodeData::Element(ElementData::new("html")));
        page.body = page.alloc(NodeData::Element(ElementData::new("body")));
        page.link(page.root, page.body);
        page
    }

    /// Document root (`html`)
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Document body
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Ambient dark-mode preference of the host
    #[must_use]
    pub fn prefers_dark_scheme(&self) -> bool {
        self.prefers_dark_scheme
    }

    /// Set the ambient dark-mode preference
    pub fn set_prefers_dark_scheme(&mut self, prefers_dark: bool) {
        self.prefers_dark_scheme = prefers_dark;
    }

    /// Builder form of [`Page::set_prefers_dark_scheme`]
    #[must_use]
    pub fn with_prefers_dark_scheme(mut self, prefers_dark: bool) -> Self {
        self.prefers_dark_scheme = prefers_dark;
        self
    }

    /// Subscribe to attribute mutations
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MutationRecord> {
        self.mutations.subscribe()
    }

    /// Mutation bus of this page
    #[must_use]
    pub fn mutations(&self) -> &MutationBus {
        &self.mutations
    }

    // ---- node creation ----

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    /// Create a detached HTML fragment node
    pub fn create_html(&mut self, html: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Html(html.into()))
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId> {
        let child = self.create_element(tag);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Create a text node and append it to `parent`
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> Result<NodeId> {
        let child = self.create_text(text);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Create an HTML fragment node and append it to `parent`
    pub fn append_html(&mut self, parent: NodeId, html: impl Into<String>) -> Result<NodeId> {
        let child = self.create_html(html);
        self.append_child(parent, child)?;
        Ok(child)
    }

    // ---- tree structure ----

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.element(parent)?;
        self.node(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(Error::HierarchyRequest(format!(
                "cannot append {child} into its own subtree at {parent}"
            )));
        }
        self.detach(child);
        self.link(parent, child);
        Ok(())
    }

    /// Put `replacement` where `old` is and detach `old`
    pub fn replace_node(&mut self, old: NodeId, replacement: NodeId) -> Result<()> {
        let parent = self.parent(old)?.ok_or(Error::Detached(old))?;
        self.node(replacement)?;
        if old == replacement {
            return Ok(());
        }
        if self.is_inclusive_ancestor(replacement, parent) {
            return Err(Error::HierarchyRequest(format!(
                "cannot replace {old} with ancestor {replacement}"
            )));
        }
        self.detach(replacement);

        if let Some(slot) = self
            .children_mut(parent)
            .and_then(|siblings| siblings.iter_mut().find(|id| **id == old))
        {
            *slot = replacement;
        }
        self.nodes[replacement.index()].parent = Some(parent);
        self.nodes[old.index()].parent = None;
        Ok(())
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Children of a node (empty for text and HTML nodes)
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    /// Whether a node is reachable from the document root
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.nodes.get(node.index()).and_then(|n| n.parent);
        }
        false
    }

    /// Nearest inclusive ancestor element with the given tag
    pub fn closest(&self, id: NodeId, tag: &str) -> Result<Option<NodeId>> {
        self.node(id)?;
        let mut current = Some(id);
        while let Some(node) = current {
            if let NodeData::Element(element) = &self.nodes[node.index()].data {
                if element.tag.eq_ignore_ascii_case(tag) {
                    return Ok(Some(node));
                }
            }
            current = self.nodes[node.index()].parent;
        }
        Ok(None)
    }

    /// Connected elements carrying `class`, in document order
    #[must_use]
    pub fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            if let NodeData::Element(element) = &node.data {
                if element.has_class(class) {
                    found.push(id);
                }
                stack.extend(element.children.iter().rev().copied());
            }
        }
        found
    }

    // ---- content ----

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> Result<String> {
        self.node(id)?;
        let mut text = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match &self.nodes[current.index()].data {
                NodeData::Text(value) => text.push_str(value),
                NodeData::Element(element) => {
                    stack.extend(element.children.iter().rev().copied());
                }
                NodeData::Html(_) => {}
            }
        }
        Ok(text)
    }

    /// Replace all children of an element with one text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        self.element(id)?;
        self.clear_children(id);
        let child = self.create_text(text);
        self.link(id, child);
        Ok(())
    }

    /// Replace all children of an element with one HTML fragment
    pub fn set_inner_html(&mut self, id: NodeId, html: impl Into<String>) -> Result<()> {
        self.element(id)?;
        self.clear_children(id);
        let child = self.create_html(html);
        self.link(id, child);
        Ok(())
    }

    // ---- attributes ----

    /// Element payload of a node
    pub fn element(&self, id: NodeId) -> Result<&ElementData> {
        match &self.node(id)?.data {
            NodeData::Element(element) => Ok(element),
            NodeData::Text(_) | NodeData::Html(_) => Err(Error::NotAnElement(id)),
        }
    }

    /// Raw node payload
    pub fn data(&self, id: NodeId) -> Result<&NodeData> {
        Ok(&self.node(id)?.data)
    }

    /// Get an attribute value
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Result<Option<&str>> {
        Ok(self.element(id)?.attribute(name))
    }

    /// Check the element's class list
    pub fn has_class(&self, id: NodeId, class: &str) -> Result<bool> {
        Ok(self.element(id)?.has_class(class))
    }

    /// Set an attribute, publishing a mutation record if the element is connected
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        let value = value.into();
        let element = self.element_mut(id)?;
        let old_value = match element.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                element.attributes.push((name.to_string(), value));
                None
            }
        };
        self.record(id, name, old_value);
        Ok(())
    }

    /// Remove an attribute; returns the removed value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>> {
        let element = self.element_mut(id)?;
        let Some(pos) = element.attributes.iter().position(|(key, _)| key == name) else {
            return Ok(None);
        };
        let (_, old_value) = element.attributes.remove(pos);
        self.record(id, name, Some(old_value.clone()));
        Ok(Some(old_value))
    }

    // ---- internals ----

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(Error::NodeNotFound(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        match self.nodes.get_mut(id.index()).map(|node| &mut node.data) {
            Some(NodeData::Element(element)) => Ok(element),
            Some(_) => Err(Error::NotAnElement(id)),
            None => Err(Error::NodeNotFound(id)),
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Caller guarantees `parent` is an element and `child` is detached
    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(children) = self.children_mut(parent) {
            children.push(child);
            self.nodes[child.index()].parent = Some(parent);
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            if let Some(siblings) = self.children_mut(parent) {
                siblings.retain(|c| *c != id);
            }
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        let children = self.children_mut(id).map(std::mem::take).unwrap_or_default();
        for child in children {
            self.nodes[child.index()].parent = None;
        }
    }

    fn children_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match &mut self.nodes.get_mut(id.index())?.data {
            NodeData::Element(element) => Some(&mut element.children),
            NodeData::Text(_) | NodeData::Html(_) => None,
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node.index()].parent;
        }
        false
    }

    fn record(&self, target: NodeId, name: &str, old_value: Option<String>) {
        if !self.is_connected(target) {
            return;
        }
        trace!(target = %target, attribute = name, "Attribute mutated");
        self.mutations.publish(MutationRecord {
            target,
            attribute_name: name.to_string(),
            old_value,
        });
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_code_block() -> (Page, NodeId, NodeId) {
        let mut page = Page::new();
        let body = page.body();
        let pre = page.append_element(body, "pre").unwrap();
        let code = page.append_element(pre, "code").unwrap();
        page.set_attribute(code, "class", "language-mermaid").unwrap();
        page.append_text(code, "graph TD; A-->B;").unwrap();
        (page, pre, code)
    }

    #[test]
    fn test_new_page_structure() {
        let page = Page::new();
        assert_eq!(page.element(page.root()).unwrap().tag, "html");
        assert_eq!(page.children(page.root()).unwrap(), &[page.body()]);
        assert!(page.is_connected(page.body()));
    }

    #[test]
    fn test_elements_with_class_document_order() {
        let mut page = Page::new();
        let body = page.body();
        let first = page.append_element(body, "div").unwrap();
        let nested = page.append_element(first, "span").unwrap();
        let second = page.append_element(body, "div").unwrap();
        for id in [second, nested, first] {
            page.set_attribute(id, "class", "marked").unwrap();
        }

        assert_eq!(page.elements_with_class("marked"), vec![first, nested, second]);
    }

    #[test]
    fn test_detached_elements_are_not_queried() {
        let mut page = Page::new();
        let orphan = page.create_element("div");
        page.set_attribute(orphan, "class", "marked").unwrap();
        assert!(page.elements_with_class("marked").is_empty());
    }

    #[test]
    fn test_closest_includes_self() {
        let (page, pre, code) = page_with_code_block();
        assert_eq!(page.closest(code, "pre").unwrap(), Some(pre));
        assert_eq!(page.closest(pre, "PRE").unwrap(), Some(pre));
        assert_eq!(page.closest(code, "table").unwrap(), None);
    }

    #[test]
    fn test_text_content() {
        let (page, pre, _) = page_with_code_block();
        assert_eq!(page.text_content(pre).unwrap(), "graph TD; A-->B;");
    }

    #[test]
    fn test_replace_node() {
        let (mut page, pre, code) = page_with_code_block();
        let container = page.create_element("div");
        page.replace_node(pre, container).unwrap();

        assert_eq!(page.children(page.body()).unwrap(), &[container]);
        assert_eq!(page.parent(pre).unwrap(), None);
        assert!(!page.is_connected(code));
        // detached subtree keeps its content
        assert_eq!(page.text_content(pre).unwrap(), "graph TD; A-->B;");
    }

    #[test]
    fn test_replace_detached_node_fails() {
        let mut page = Page::new();
        let orphan = page.create_element("pre");
        let other = page.create_element("div");
        assert_eq!(
            page.replace_node(orphan, other),
            Err(Error::Detached(orphan))
        );
    }

    #[test]
    fn test_append_into_own_subtree_fails() {
        let (mut page, pre, code) = page_with_code_block();
        let result = page.append_child(code, pre);
        assert!(matches!(result, Err(Error::HierarchyRequest(_))));
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let (mut page, pre, code) = page_with_code_block();
        page.set_inner_html(pre, "<svg></svg>").unwrap();

        let children = page.children(pre).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(
            page.data(children[0]).unwrap(),
            &NodeData::Html("<svg></svg>".to_string())
        );
        assert_eq!(page.parent(code).unwrap(), None);
    }

    #[test]
    fn test_text_node_is_not_an_element() {
        let mut page = Page::new();
        let body = page.body();
        let text = page.append_text(body, "hello").unwrap();
        assert_eq!(
            page.set_attribute(text, "class", "x"),
            Err(Error::NotAnElement(text))
        );
        let missing = NodeId::new(999);
        assert_eq!(
            page.get_attribute(missing, "class"),
            Err(Error::NodeNotFound(missing))
        );
    }

    #[tokio::test]
    async fn test_set_attribute_publishes_record() {
        let mut page = Page::new();
        let mut rx = page.subscribe();
        let root = page.root();

        page.set_attribute(root, "data-theme", "dark").unwrap();
        page.set_attribute(root, "data-theme", "light").unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.target, root);
        assert_eq!(first.old_value, None);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.old_value.as_deref(), Some("dark"));
        assert_eq!(page.get_attribute(root, "data-theme").unwrap(), Some("light"));
    }

    #[tokio::test]
    async fn test_remove_attribute_publishes_record() {
        let mut page = Page::new();
        let root = page.root();
        page.set_attribute(root, "data-theme", "dark").unwrap();
        let mut rx = page.subscribe();

        assert_eq!(
            page.remove_attribute(root, "data-theme").unwrap().as_deref(),
            Some("dark")
        );
        assert_eq!(page.remove_attribute(root, "data-theme").unwrap(), None);

        let record = rx.recv().await.unwrap();
        assert_eq!(record.old_value.as_deref(), Some("dark"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_detached_mutations_are_silent() {
        let mut page = Page::new();
        let mut rx = page.subscribe();
        let orphan = page.create_element("div");
        page.set_attribute(orphan, "class", "mermaid").unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_prefers_dark_scheme() {
        let mut page = Page::new().with_prefers_dark_scheme(true);
        assert!(page.prefers_dark_scheme());
        page.set_prefers_dark_scheme(false);
        assert!(!page.prefers_dark_scheme());
    }
}
