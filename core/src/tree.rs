//! In-place edits for job configuration documents.
//!
//! These helpers cover exactly what patching a `config.xml` needs: merge an
//! attribute, set the text of a named child, append an element. They keep
//! the sibling links consistent so the result serializes back cleanly.

use crate::error::XmlError;
use crate::xml::{Attribute, Document, Element, NodeId, NodeKind, QualifiedName};

impl Document {
    /// Set attribute `name` (optionally `prefix:local`) on `node`.
    ///
    /// An existing attribute with the same prefix and local name is
    /// overwritten in place, so a key never appears twice.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), XmlError> {
        let attrs = match &mut self[node].kind {
            NodeKind::Element(element) => &mut element.attrs,
            NodeKind::Declaration(attrs) => attrs,
            _ => return Err(XmlError::NotAnElement(node)),
        };

        let name = QualifiedName::parse(name);
        match attrs.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => attrs.push(Attribute {
                name,
                value: value.to_string(),
            }),
        }
        Ok(())
    }

    /// Set the text of the child element `tag` of `node`.
    ///
    /// The first matching child that is empty gets a text node, and the first
    /// one holding a single text node has it overwritten. When no matching
    /// child has either shape a new `tag` element is appended, even if other
    /// children with that tag exist.
    ///
    /// An empty (or whitespace-only) value leaves the element childless, so it
    /// serializes as `<tag/>` and reads back the same way.
    pub fn set_element_text(&mut self, node: NodeId, tag: &str, value: &str) -> Result<NodeId, XmlError> {
        if !self[node].is_container() {
            return Err(XmlError::NotAContainer(node));
        }

        let candidates: Vec<NodeId> = self.child_elements(node, tag).collect();
        for child in candidates {
            match (self[child].first_child, self[child].last_child) {
                (None, _) => {
                    self.append_text(child, value);
                    return Ok(child);
                }
                (Some(first), Some(last)) if first == last && self[first].is_text() => {
                    if value.trim().is_empty() {
                        self.detach(first);
                    } else if let NodeKind::Text(text) = &mut self[first].kind {
                        *text = value.to_string();
                    }
                    return Ok(child);
                }
                _ => {}
            }
        }

        let child = self.add_element(node, tag)?;
        self.append_text(child, value);
        Ok(child)
    }

    /// Append an empty `tag` element as the last child of `parent`.
    ///
    /// Never merges with existing children; calling it twice yields two
    /// sibling elements.
    pub fn add_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, XmlError> {
        if !self[parent].is_container() {
            return Err(XmlError::NotAContainer(parent));
        }
        Ok(self.append(parent, NodeKind::Element(Element::new(tag))))
    }

    fn append_text(&mut self, parent: NodeId, value: &str) {
        if !value.trim().is_empty() {
            self.append(parent, NodeKind::Text(value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let project = doc.add_element(root, "project").unwrap();
        (doc, project)
    }

    fn texts(doc: &Document, parent: NodeId, tag: &str) -> Vec<String> {
        doc.child_elements(parent, tag).map(|id| doc.inner_text(id)).collect()
    }

    #[test]
    fn set_attr_overwrites_existing_key() {
        let (mut doc, project) = project();
        doc.set_attr(project, "plugin", "a@1").unwrap();
        doc.set_attr(project, "plugin", "a@2").unwrap();

        let attrs = &doc[project].element().unwrap().attrs;
        assert_eq!(attrs.len(), 1);
        assert_eq!(doc.attr(project, "plugin"), Some("a@2"));
    }

    #[test]
    fn set_attr_splits_namespace() {
        let (mut doc, project) = project();
        doc.set_attr(project, "xsi:type", "list").unwrap();

        let attr = &doc[project].element().unwrap().attrs[0];
        assert_eq!(attr.name.space.as_deref(), Some("xsi"));
        assert_eq!(attr.name.local, "type");
        assert_eq!(attr.value, "list");
    }

    #[test]
    fn set_attr_distinguishes_namespaces() {
        let (mut doc, project) = project();
        doc.set_attr(project, "type", "plain").unwrap();
        doc.set_attr(project, "xsi:type", "prefixed").unwrap();

        assert_eq!(doc[project].element().unwrap().attrs.len(), 2);
        assert_eq!(doc.attr(project, "type"), Some("plain"));
        assert_eq!(doc.attr(project, "xsi:type"), Some("prefixed"));
    }

    #[test]
    fn set_attr_keeps_order_of_existing_attributes() {
        let mut doc = Document::parse(r#"<a first="1" second="2" third="3"/>"#).unwrap();
        let a = doc.root_element().unwrap();
        doc.set_attr(a, "second", "two").unwrap();

        let names: Vec<String> = doc[a]
            .element()
            .unwrap()
            .attrs
            .iter()
            .map(|attr| attr.name.to_string())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(doc.attr(a, "second"), Some("two"));
    }

    #[test]
    fn set_attr_on_text_node_is_rejected() {
        let mut doc = Document::parse("<a>text</a>").unwrap();
        let a = doc.root_element().unwrap();
        let text = doc[a].first_child().unwrap();
        assert_eq!(doc.set_attr(text, "k", "v"), Err(XmlError::NotAnElement(text)));
    }

    #[test]
    fn set_element_text_fills_empty_child() {
        let mut doc = Document::parse("<project><disabled/></project>").unwrap();
        let project = doc.root_element().unwrap();
        let disabled = doc.set_element_text(project, "disabled", "true").unwrap();

        assert_eq!(texts(&doc, project, "disabled"), ["true"]);
        let text = doc[disabled].first_child().unwrap();
        assert_eq!(doc[disabled].last_child(), Some(text));
        assert_eq!(doc[text].text(), Some("true"));
    }

    #[test]
    fn set_element_text_overwrites_in_place() {
        let mut doc = Document::parse("<project><disabled>false</disabled></project>").unwrap();
        let project = doc.root_element().unwrap();
        let before = doc.node_count();

        doc.set_element_text(project, "disabled", "true").unwrap();
        doc.set_element_text(project, "disabled", "false").unwrap();

        assert_eq!(texts(&doc, project, "disabled"), ["false"]);
        assert_eq!(doc.node_count(), before);
    }

    #[test]
    fn set_element_text_creates_missing_child() {
        let (mut doc, project) = project();
        doc.add_element(project, "description").unwrap();
        let created = doc.set_element_text(project, "assignedNode", "linux").unwrap();

        assert_eq!(doc[project].last_child(), Some(created));
        assert_eq!(texts(&doc, project, "assignedNode"), ["linux"]);
    }

    #[test]
    fn set_element_text_empty_value_leaves_element_childless() {
        let mut doc = Document::parse("<project><description>old</description><disabled/></project>").unwrap();
        let project = doc.root_element().unwrap();

        let description = doc.set_element_text(project, "description", "").unwrap();
        let disabled = doc.set_element_text(project, "disabled", "").unwrap();
        let label = doc.set_element_text(project, "label", " ").unwrap();

        for id in [description, disabled, label] {
            assert_eq!(doc[id].first_child(), None);
        }
        let once = doc.to_xml();
        assert!(once.contains("<description/>"));
        assert!(once.contains("<label/>"));
        assert_eq!(Document::parse(&once).unwrap().to_xml(), once);
    }

    #[test]
    fn set_element_text_appends_when_shape_is_unexpected() {
        let mut doc = Document::parse("<project><scm><a/><b/></scm></project>").unwrap();
        let project = doc.root_element().unwrap();
        doc.set_element_text(project, "scm", "none").unwrap();

        let scms: Vec<NodeId> = doc.child_elements(project, "scm").collect();
        assert_eq!(scms.len(), 2);
        assert_eq!(doc.inner_text(scms[1]), "none");
        assert_eq!(doc.children(scms[0]).count(), 2);
    }

    #[test]
    fn set_element_text_skips_to_later_matching_child() {
        let mut doc = Document::parse("<p><n><x/></n><n>old</n></p>").unwrap();
        let p = doc.root_element().unwrap();
        doc.set_element_text(p, "n", "new").unwrap();

        let ns: Vec<NodeId> = doc.child_elements(p, "n").collect();
        assert_eq!(ns.len(), 2);
        assert_eq!(doc.inner_text(ns[1]), "new");
    }

    #[test]
    fn add_element_always_appends() {
        let (mut doc, project) = project();
        let ids: Vec<NodeId> = (0..3)
            .map(|_| doc.add_element(project, "publisher").unwrap())
            .collect();

        assert_eq!(doc.child_elements(project, "publisher").collect::<Vec<_>>(), ids);
        assert_eq!(doc[ids[0]].prev_sibling(), None);
        assert_eq!(doc[ids[1]].prev_sibling(), Some(ids[0]));
        assert_eq!(doc[ids[1]].next_sibling(), Some(ids[2]));
        assert_eq!(doc[project].last_child(), Some(ids[2]));
        assert!(ids.iter().all(|&id| doc[id].parent() == Some(project)));
    }

    #[test]
    fn add_element_with_prefix() {
        let (mut doc, project) = project();
        let id = doc.add_element(project, "hudson:trigger").unwrap();
        let element = doc[id].element().unwrap();
        assert_eq!(element.prefix.as_deref(), Some("hudson"));
        assert_eq!(element.name, "trigger");
    }

    #[test]
    fn add_element_under_text_is_rejected() {
        let mut doc = Document::parse("<a>text</a>").unwrap();
        let text = doc[doc.root_element().unwrap()].first_child().unwrap();
        assert_eq!(doc.add_element(text, "b"), Err(XmlError::NotAContainer(text)));
    }
}
