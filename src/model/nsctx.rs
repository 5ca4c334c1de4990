//! XML namespace context.
//!
//! A [`NamespaceContext`] is the set of prefix to namespace bindings in scope
//! at a node: every `xmlns` / `xmlns:p` attribute of the node and its
//! ancestors, with the nearest declaration of a prefix winning.

use crate::model::tree::{Document, NodeId};
use hashbrown::HashMap;
use log::trace;

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NamespaceContext {
    /// `None` key is the default namespace.
    bindings: HashMap<Option<String>, String, ahash::RandomState>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the bindings in scope at `id`.
    pub fn of_node(doc: &Document, id: NodeId) -> Self {
        let mut ctx = NamespaceContext::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            for attr in doc.attributes(node) {
                let Some(attr) = doc.attribute(*attr) else {
                    continue;
                };
                if !attr.is_namespace_binding() {
                    continue;
                }
                let key = attr.bound_prefix().map(str::to_owned);
                // Closer declarations were inserted first.
                ctx.bindings
                    .entry(key)
                    .or_insert_with(|| attr.value.clone());
            }
            cursor = doc.parent(node);
        }
        ctx
    }

    pub fn bind(&mut self, prefix: Option<&str>, namespace: &str) {
        self.bindings
            .insert(prefix.map(str::to_owned), namespace.to_owned());
    }

    /// Namespace bound to `prefix` (`None` for the default namespace).
    pub fn namespace(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        self.bindings
            .get(&prefix.map(str::to_owned))
            .map(String::as_str)
    }

    /// Reverse lookup of a namespace.
    ///
    /// Returns `Some(None)` when the namespace is the default namespace,
    /// `Some(Some(p))` when it is bound to a prefix, `None` if it is not in
    /// scope. If several prefixes map to it the default binding wins, then the
    /// smallest prefix.
    pub fn prefix_of(&self, namespace: &str) -> Option<Option<&str>> {
        if self.bindings.get(&None).map(String::as_str) == Some(namespace) {
            return Some(None);
        }
        self.bindings
            .iter()
            .filter(|(_, ns)| ns.as_str() == namespace)
            .filter_map(|(prefix, _)| prefix.as_deref())
            .min()
            .map(Some)
    }

    /// All bindings, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.bindings
            .iter()
            .map(|(p, ns)| (p.as_deref(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Resolve `prefix` to a namespace as seen from node `id`.
pub fn namespace_of(doc: &Document, id: NodeId, prefix: Option<&str>) -> Option<String> {
    if prefix == Some("xml") {
        return Some(XML_NAMESPACE.to_owned());
    }
    let mut cursor = Some(id);
    while let Some(node) = cursor {
        let found = match prefix {
            None => doc.find_attribute_value(node, None, "xmlns"),
            Some(p) => doc.find_attribute_value(node, Some("xmlns"), p),
        };
        if let Some(ns) = found {
            return Some(ns.to_owned());
        }
        cursor = doc.parent(node);
    }
    None
}

/// Namespace of an element itself, from its own prefix.
pub fn element_namespace(doc: &Document, id: NodeId) -> Option<String> {
    namespace_of(doc, id, doc.prefix(id))
}

/// Rebind element `id` into `namespace` using `prefix`.
///
/// Sets the element prefix and, unless the binding is already in scope,
/// declares it on the element (overwriting a conflicting local declaration).
pub fn namespace_change(doc: &mut Document, id: NodeId, namespace: &str, prefix: Option<&str>) {
    doc.set_prefix(id, prefix.map(str::to_owned));
    if namespace_of(doc, id, prefix).as_deref() == Some(namespace) {
        return;
    }
    trace!(
        "binding {}={} on <{}>",
        prefix.map_or_else(|| "xmlns".to_owned(), |p| format!("xmlns:{p}")),
        namespace,
        doc.name(id)
    );
    let existing = match prefix {
        None => doc.find_attribute(id, None, "xmlns"),
        Some(p) => doc.find_attribute(id, Some("xmlns"), p),
    };
    match (existing, prefix) {
        (Some(attr), _) => doc.set_value(attr, namespace),
        (None, None) => {
            doc.new_attribute(id, None, "xmlns", namespace);
        }
        (None, Some(p)) => {
            doc.new_attribute(id, Some("xmlns"), p, namespace);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested() -> (Document, NodeId) {
        let mut doc = Document::new("top");
        let root = doc.root();
        doc.new_attribute(root, None, "xmlns", "urn:outer");
        doc.new_attribute(root, Some("xmlns"), "b", "urn:b");
        let mid = doc.new_element(root, "mid", None);
        doc.new_attribute(mid, Some("xmlns"), "a", "urn:b");
        doc.new_attribute(mid, None, "xmlns", "urn:inner");
        let leaf = doc.new_element(mid, "leaf", Some("a"));
        (doc, leaf)
    }

    #[test]
    fn test_nearest_binding_wins() {
        let (doc, leaf) = nested();
        let ctx = NamespaceContext::of_node(&doc, leaf);
        assert_eq!(ctx.namespace(None), Some("urn:inner"));
        assert_eq!(ctx.namespace(Some("b")), Some("urn:b"));
        assert_eq!(ctx.namespace(Some("xml")), Some(XML_NAMESPACE));
        assert_eq!(element_namespace(&doc, leaf).as_deref(), Some("urn:b"));
    }

    #[test]
    fn test_prefix_of_prefers_default_then_smallest() {
        let (doc, leaf) = nested();
        let ctx = NamespaceContext::of_node(&doc, leaf);
        assert_eq!(ctx.prefix_of("urn:inner"), Some(None));
        assert_eq!(ctx.prefix_of("urn:b"), Some(Some("a")));
        assert_eq!(ctx.prefix_of("urn:outer"), None);
    }

    #[test]
    fn test_namespace_change_adds_binding_once() {
        let (mut doc, leaf) = nested();
        namespace_change(&mut doc, leaf, "urn:inner", None);
        assert_eq!(doc.prefix(leaf), None);
        assert!(doc.attributes(leaf).is_empty());

        namespace_change(&mut doc, leaf, "urn:other", None);
        assert_eq!(doc.find_attribute_value(leaf, None, "xmlns"), Some("urn:other"));
        namespace_change(&mut doc, leaf, "urn:third", None);
        assert_eq!(doc.attributes(leaf).len(), 1);
        assert_eq!(doc.find_attribute_value(leaf, None, "xmlns"), Some("urn:third"));
    }
}
