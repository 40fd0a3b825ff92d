//! Serialize a document back into the text Jenkins accepts on `config.xml`.
//!
//! The output always starts with a single-quoted declaration, whatever the
//! parsed document carried. Elements are indented two spaces per level.
//! An element whose only child is text closes on the same line so no
//! whitespace leaks into its value. Carriage returns are written as
//! character references so the server's line-end handling cannot fold them,
//! and attribute values also encode newlines and tabs.

use quick_xml::escape::escape;

use crate::xml::{Document, NodeId, NodeKind};

/// Declaration written ahead of every serialized document.
pub const DECLARATION: &str = "<?xml version='1.0' encoding='utf-8' ?>";

impl Document {
    /// Serialize the whole document.
    pub fn to_xml(&self) -> String {
        self.serialize(self.root())
    }

    /// Serialize the children of `node` under a fresh declaration.
    pub fn serialize(&self, node: NodeId) -> String {
        let mut out = String::from(DECLARATION);
        for child in self.children(node) {
            self.write_node(&mut out, child, 0);
        }
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId, level: usize) {
        let node = &self[id];
        let element = match &node.kind {
            NodeKind::Text(text) => {
                out.push_str(&escape_text(text.trim()));
                return;
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(&comment_body(text.trim()));
                out.push_str("-->");
                return;
            }
            NodeKind::Document | NodeKind::Declaration(_) => return,
            NodeKind::Element(element) => element,
        };

        let tag = element.tag();
        out.push('\n');
        indent(out, level);
        out.push('<');
        out.push_str(&tag);
        for attr in &element.attrs {
            out.push(' ');
            out.push_str(&attr.name.to_string());
            out.push_str("=\"");
            out.push_str(&escape_attr(&attr.value));
            out.push('"');
        }

        let Some(first) = node.first_child else {
            out.push_str("/>");
            return;
        };

        out.push('>');
        for child in self.children(id) {
            self.write_node(out, child, level + 1);
        }

        if node.last_child == Some(first) && self[first].is_text() {
            out.push_str("</");
        } else {
            out.push('\n');
            indent(out, level);
            out.push_str("</");
        }
        out.push_str(&tag);
        out.push('>');
    }
}

fn escape_text(text: &str) -> String {
    escape(text).replace('\r', "&#xD;")
}

fn escape_attr(value: &str) -> String {
    escape(value)
        .replace('\r', "&#xD;")
        .replace('\n', "&#xA;")
        .replace('\t', "&#x9;")
}

/// Comment content with every `--` broken up and a trailing `-` padded,
/// since neither may appear inside `<!-- -->`.
fn comment_body(text: &str) -> String {
    let mut body = String::with_capacity(text.len() + 1);
    for c in text.chars() {
        if c == '-' && body.ends_with('-') {
            body.push(' ');
        }
        body.push(c);
    }
    if body.ends_with('-') {
        body.push(' ');
    }
    body
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}
