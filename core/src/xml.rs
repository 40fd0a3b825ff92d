//! Arena-backed XML document tree.
//!
//! # Design
//! Nodes live in a single `Vec<Node>` and refer to each other through
//! `NodeId` indices: parent, first/last child and previous/next sibling.
//! Appending a child or rewriting a text node is an index update, and the
//! tree can be edited in place without shared ownership. Detached nodes
//! stay in the arena as orphans; a document is short-lived (fetched,
//! patched, serialized, dropped) so nothing reclaims them.
//!
//! Node 0 is always the document root. The parser places an optional
//! declaration, comments and the root element under it.

use std::fmt;
use std::ops::{Index, IndexMut};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::XmlError;

/// Stable handle to a node inside one `Document`.
///
/// Handles are only meaningful for the document that issued them; indexing
/// another document with them panics or returns an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A possibly prefixed name such as `xsi:type` or `plugin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub space: Option<String>,
    pub local: String,
}

impl QualifiedName {
    /// Split on the first colon. A leading colon does not start a prefix.
    pub fn parse(name: &str) -> Self {
        match name.find(':') {
            Some(i) if i > 0 => Self {
                space: Some(name[..i].to_string()),
                local: name[i + 1..].to_string(),
            },
            _ => Self {
                space: None,
                local: name.to_string(),
            },
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.space {
            Some(space) => write!(f, "{space}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualifiedName::parse(name),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub prefix: Option<String>,
    pub name: String,
    pub attrs: Vec<Attribute>,
}

impl Element {
    /// Create an element with no attributes; `tag` may carry a prefix.
    pub fn new(tag: &str) -> Self {
        let QualifiedName { space, local } = QualifiedName::parse(tag);
        Self {
            prefix: space,
            name: local,
            attrs: Vec::new(),
        }
    }

    /// Tag as written in the document, prefix included.
    pub fn tag(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Whether this element's tag equals `tag` (prefix included).
    pub fn is(&self, tag: &str) -> bool {
        match &self.prefix {
            Some(prefix) => tag
                .split_once(':')
                .is_some_and(|(p, local)| p == prefix && local == self.name),
            None => tag == self.name,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        let wanted = QualifiedName::parse(name);
        self.attrs
            .iter()
            .find(|attr| attr.name == wanted)
            .map(|attr| attr.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    /// `<?xml version=".." ...?>` prolog, attributes in source order.
    Declaration(Vec<Attribute>),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    pub fn element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    /// Documents and elements can hold children; everything else is a leaf.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element(_))
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
        }
    }

    /// Parse `input` into a fresh document.
    ///
    /// Text is trimmed and whitespace-only runs are dropped, so the first
    /// child of the root is the declaration (if any) or the root element.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut doc = Self::new();
        let mut open = vec![doc.root()];

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    return Err(XmlError::Malformed(format!(
                        "{err} at byte {}",
                        reader.error_position()
                    )))
                }
            };
            let parent = open.last().copied().unwrap_or(doc.root());

            match event {
                Event::Decl(decl) => {
                    let mut attrs = vec![Attribute::new("version", lossy(&decl.version().map_err(malformed)?))];
                    if let Some(encoding) = decl.encoding() {
                        attrs.push(Attribute::new("encoding", lossy(&encoding.map_err(malformed)?)));
                    }
                    if let Some(standalone) = decl.standalone() {
                        attrs.push(Attribute::new("standalone", lossy(&standalone.map_err(malformed)?)));
                    }
                    doc.append(parent, NodeKind::Declaration(attrs));
                }
                Event::Start(start) => {
                    let id = doc.append(parent, NodeKind::Element(element_from(&start)?));
                    open.push(id);
                }
                Event::Empty(start) => {
                    doc.append(parent, NodeKind::Element(element_from(&start)?));
                }
                Event::End(_) => {
                    if open.len() > 1 {
                        open.pop();
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(malformed)?;
                    if !text.is_empty() {
                        doc.append(parent, NodeKind::Text(text.into_owned()));
                    }
                }
                Event::CData(cdata) => {
                    doc.append(parent, NodeKind::Text(lossy(&cdata.into_inner())));
                }
                Event::Comment(comment) => {
                    doc.append(parent, NodeKind::Comment(lossy(&comment.into_inner())));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if open.len() > 1 {
            let tag = open
                .last()
                .and_then(|&id| doc[id].element())
                .map(Element::tag)
                .unwrap_or_default();
            return Err(XmlError::Unclosed(tag));
        }

        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].first_child.is_none()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Direct children of `id` in document order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self[id].first_child,
        }
    }

    /// Direct element children of `id` whose tag is `tag`.
    pub fn child_elements<'a>(&'a self, id: NodeId, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .filter(move |&child| self[child].element().is_some_and(|e| e.is(tag)))
    }

    /// First element directly under the document root.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root()).find(|&id| self[id].is_element())
    }

    /// Attribute value by qualified name, for elements and declarations.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self[id].kind {
            NodeKind::Element(element) => element.attr(name),
            NodeKind::Declaration(attrs) => {
                let wanted = QualifiedName::parse(name);
                attrs
                    .iter()
                    .find(|attr| attr.name == wanted)
                    .map(|attr| attr.value.as_str())
            }
            _ => None,
        }
    }

    /// Concatenated text of every descendant text node, in document order.
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut text = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let NodeKind::Text(data) = &self[current].kind {
                text.push_str(data);
            }
            let children: Vec<NodeId> = self.children(current).collect();
            stack.extend(children.into_iter().rev());
        }
        text
    }

    /// Append a new node as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(kind);
        node.parent = Some(parent);
        node.prev_sibling = self[parent].last_child;
        self.nodes.push(node);

        match self[parent].last_child {
            Some(last) => self[last].next_sibling = Some(id),
            None => self[parent].first_child = Some(id),
        }
        self[parent].last_child = Some(id);
        id
    }

    /// Unlink `id` from its parent and siblings. The node and its subtree
    /// stay in the arena but are no longer reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self[id];
            (node.parent, node.prev_sibling, node.next_sibling)
        };

        match prev {
            Some(prev) => self[prev].next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self[parent].first_child = next;
                }
            }
        }
        match next {
            Some(next) => self[next].prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self[parent].last_child = prev;
                }
            }
        }

        let node = &mut self[id];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Remove a leading `<?xml ...?>` node. Returns whether one was found.
    pub fn strip_declaration(&mut self) -> bool {
        match self[self.root()].first_child {
            Some(first) if matches!(self[first].kind, NodeKind::Declaration(_)) => {
                self.detach(first);
                true
            }
            _ => false,
        }
    }
}

impl Index<NodeId> for Document {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Document {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

/// Iterator over the sibling chain starting at a node's first child.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc[current].next_sibling;
        Some(current)
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = start.name();
    let mut element = Element {
        prefix: name.prefix().map(|prefix| lossy(prefix.as_ref())),
        name: lossy(name.local_name().as_ref()),
        attrs: Vec::new(),
    };
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let value = attr.unescape_value().map_err(malformed)?;
        element.attrs.push(Attribute {
            name: QualifiedName::parse(&lossy(attr.key.as_ref())),
            value: value.into_owned(),
        });
    }
    Ok(element)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn malformed(err: impl fmt::Display) -> XmlError {
    XmlError::Malformed(err.to_string())
}
