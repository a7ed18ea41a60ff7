//! HTML serialization

use crate::error::Result;
use crate::node::{NodeData, NodeId};
use crate::page::Page;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Escape text content
#[must_use]
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value (double-quoted)
#[must_use]
pub fn escape_attribute(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

impl Page {
    /// Serialize the whole document
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root(), &mut out);
        out
    }

    /// Serialize a node including its own tag
    pub fn outer_html(&self, id: NodeId) -> Result<String> {
        self.node(id)?;
        let mut out = String::new();
        self.write_node(id, &mut out);
        Ok(out)
    }

    /// Serialize the children of a node
    pub fn inner_html(&self, id: NodeId) -> Result<String> {
        let mut out = String::new();
        for child in self.children(id)? {
            self.write_node(*child, &mut out);
        }
        Ok(out)
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Ok(data) = self.data(id) else {
            return;
        };
        match data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Html(html) => out.push_str(html),
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    return;
                }
                for child in &element.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}
