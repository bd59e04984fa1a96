//! Read-only tree queries used by the manifest parsers.
//!
//! The parsers only need a handful of DOM-style lookups, so they are written
//! against [`TreeNode`] rather than a concrete XML library. The
//! [`roxmltree`] implementation is the one used for packages on disk.

/// Minimal read-only view of a manifest tree node.
///
/// Whitespace-only text nodes are never reported as children, so "the next
/// sibling" always means the next meaningful node.
pub trait TreeNode: Copy {
    /// Whether this node is an element (as opposed to text or a comment).
    fn is_element(&self) -> bool;

    /// Local tag name. Empty for non-element nodes.
    fn tag(&self) -> &str;

    /// Child nodes in document order, skipping whitespace-only text.
    fn child_nodes(&self) -> Vec<Self>;

    /// Attribute value. `prefix:local` names are resolved through the
    /// namespace declarations in scope; `xml:` always maps to the XML
    /// namespace.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Concatenated text of all descendant text nodes.
    fn text(&self) -> String;

    /// First child element named `tag`.
    fn first_child(&self, tag: &str) -> Option<Self> {
        self.child_nodes()
            .into_iter()
            .find(|n| n.is_element() && n.tag() == tag)
    }

    /// All descendant elements named `tag`, in document order.
    fn descendants_by_tag(&self, tag: &str) -> Vec<Self> {
        let mut found = Vec::new();
        collect_descendants(*self, tag, &mut found);
        found
    }

    /// Attribute value, or `default` when absent.
    fn attribute_or(&self, name: &str, default: &str) -> String {
        self.attribute(name).unwrap_or(default).to_owned()
    }
}

fn collect_descendants<N: TreeNode>(node: N, tag: &str, out: &mut Vec<N>) {
    for child in node.child_nodes() {
        if child.is_element() {
            if child.tag() == tag {
                out.push(child);
            }
            collect_descendants(child, tag, out);
        }
    }
}

/// Parse an XML document, accepting the DOCTYPE declarations property
/// lists carry.
pub(crate) fn parse_xml(text: &str) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    let mut options = roxmltree::ParsingOptions::default();
    options.allow_dtd = true;
    roxmltree::Document::parse_with_options(text, options)
}

impl<'a, 'input: 'a> TreeNode for roxmltree::Node<'a, 'input> {
    fn is_element(&self) -> bool {
        roxmltree::Node::is_element(self)
    }

    fn tag(&self) -> &str {
        if roxmltree::Node::is_element(self) {
            self.tag_name().name()
        } else {
            ""
        }
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children()
            .filter(|n| !(n.is_text() && n.text().is_some_and(|t| t.trim().is_empty())))
            .collect()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        match name.split_once(':') {
            Some((prefix, local)) => {
                let uri = if prefix == "xml" {
                    Some(roxmltree::NS_XML_URI)
                } else {
                    self.lookup_namespace_uri(Some(prefix))
                }?;
                roxmltree::Node::attribute(self, (uri, local))
            },
            None => roxmltree::Node::attribute(self, name),
        }
    }

    fn text(&self) -> String {
        if self.is_text() {
            return roxmltree::Node::text(self).unwrap_or_default().to_owned();
        }
        self.descendants()
            .filter(roxmltree::Node::is_text)
            .filter_map(|n| roxmltree::Node::text(&n))
            .collect()
    }
}
