//! Arena-backed document tree.
//!
//! This module defines the XML-like tree that both JSON directions operate on.
//! Every node lives in a single `Vec` owned by the [`Document`] and is addressed
//! by a [`NodeId`]. Elements keep their attributes and their children as two
//! separate ordered id vectors, so sorting a node's children only permutes a
//! vector of ids and never moves or copies the nodes themselves.
//!
//! Design notes:
//! - Node kinds form a closed set: element, attribute or text body.
//! - The association to a schema statement is an optional [`SchemaId`] stored
//!   next to the element, independent of the node kind.
//! - Detached nodes stay in the arena until the document is dropped.

use crate::schema::SchemaId;

/// Identifier for a node stored in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The three kinds of node a tree can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
}

/// An element with its (optional) namespace prefix and schema binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub prefix: Option<String>,
    pub attrs: Vec<NodeId>,
    pub children: Vec<NodeId>,
    pub schema: Option<SchemaId>,
}

/// An attribute, `xmlns` bindings included.
///
/// A default namespace binding is stored as `name == "xmlns"` with no prefix,
/// a prefixed binding `xmlns:p` as `prefix == Some("xmlns")`, `name == "p"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub prefix: Option<String>,
    pub value: String,
}

impl Attribute {
    /// Returns true if this attribute declares a namespace.
    pub fn is_namespace_binding(&self) -> bool {
        match self.prefix.as_deref() {
            Some("xmlns") => true,
            None => self.name == "xmlns",
            Some(_) => false,
        }
    }

    /// For a namespace binding, the prefix it declares (`None` for the default namespace).
    pub fn bound_prefix(&self) -> Option<&str> {
        match self.prefix.as_deref() {
            Some("xmlns") => Some(self.name.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element(Element),
    Attribute(Attribute),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    parent: Option<NodeId>,
    data: NodeData,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Attribute(_) => NodeKind::Attribute,
            NodeData::Text(_) => NodeKind::Text,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&Attribute> {
        match &self.data {
            NodeData::Attribute(a) => Some(a),
            _ => None,
        }
    }
}

/// Result of a visitor passed to [`Document::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Descend into the children of the visited node.
    Continue,
    /// Do not descend below the visited node, carry on with its siblings.
    SkipSubtree,
    /// Stop the whole walk.
    Abort,
}

/// A document tree: an arena of nodes and the id of its root element.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document holding a single, childless root element.
    pub fn new(root_name: &str) -> Self {
        let mut doc = Document {
            nodes: Vec::with_capacity(16),
            root: NodeId(0),
        };
        doc.root = doc.push_node(None, NodeData::Element(Element::new(root_name, None)));
        doc
    }

    fn push_node(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { parent, data });
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node for the given id.
    ///
    /// Ids are only ever handed out by this document, so an unknown id is a
    /// caller bug.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == NodeKind::Element
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).as_element()
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id).data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Element or attribute name. Text bodies have no name and return `""`.
    pub fn name(&self, id: NodeId) -> &str {
        match &self.node(id).data {
            NodeData::Element(e) => &e.name,
            NodeData::Attribute(a) => &a.name,
            NodeData::Text(_) => "",
        }
    }

    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(e) => e.prefix.as_deref(),
            NodeData::Attribute(a) => a.prefix.as_deref(),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_prefix(&mut self, id: NodeId, prefix: Option<String>) {
        match &mut self.node_mut(id).data {
            NodeData::Element(e) => e.prefix = prefix,
            NodeData::Attribute(a) => a.prefix = prefix,
            NodeData::Text(_) => {}
        }
    }

    /// Text of a body node or value of an attribute.
    pub fn value(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(t) => Some(t),
            NodeData::Attribute(a) => Some(&a.value),
            NodeData::Element(_) => None,
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        match &mut self.node_mut(id).data {
            NodeData::Text(t) => *t = value.into(),
            NodeData::Attribute(a) => a.value = value.into(),
            NodeData::Element(_) => {}
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Non-attribute children (elements and text bodies) in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).data {
            NodeData::Element(e) => &e.children,
            _ => &[],
        }
    }

    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.children(id).get(i).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Element children only.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.is_element(*c))
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).data {
            NodeData::Element(e) => &e.attrs,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId) -> Option<&Attribute> {
        self.node(id).as_attribute()
    }

    pub fn schema(&self, id: NodeId) -> Option<SchemaId> {
        self.element(id).and_then(|e| e.schema)
    }

    pub fn set_schema(&mut self, id: NodeId, schema: Option<SchemaId>) {
        if let Some(e) = self.element_mut(id) {
            e.schema = schema;
        }
    }

    /// Append a new element under `parent`.
    pub fn new_element(&mut self, parent: NodeId, name: &str, prefix: Option<&str>) -> NodeId {
        let id = self.push_node(
            Some(parent),
            NodeData::Element(Element::new(name, prefix.map(str::to_owned))),
        );
        if let Some(e) = self.element_mut(parent) {
            e.children.push(id);
        }
        id
    }

    /// Append a new text body under `parent`.
    pub fn new_text(&mut self, parent: NodeId, value: impl Into<String>) -> NodeId {
        let id = self.push_node(Some(parent), NodeData::Text(value.into()));
        if let Some(e) = self.element_mut(parent) {
            e.children.push(id);
        }
        id
    }

    /// Append a new attribute to element `parent`.
    pub fn new_attribute(
        &mut self,
        parent: NodeId,
        prefix: Option<&str>,
        name: &str,
        value: impl Into<String>,
    ) -> NodeId {
        let id = self.push_node(
            Some(parent),
            NodeData::Attribute(Attribute {
                name: name.to_owned(),
                prefix: prefix.map(str::to_owned),
                value: value.into(),
            }),
        );
        if let Some(e) = self.element_mut(parent) {
            e.attrs.push(id);
        }
        id
    }

    /// Convenience for `<name>body</name>` under `parent`.
    pub fn new_leaf(&mut self, parent: NodeId, name: &str, body: impl Into<String>) -> NodeId {
        let id = self.new_element(parent, name, None);
        self.new_text(id, body);
        id
    }

    /// Move a detached node (or a node from elsewhere in this document) to
    /// position `index` among the children of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        if let Some(e) = self.element_mut(parent) {
            let index = index.min(e.children.len());
            e.children.insert(index, child);
        }
        self.node_mut(child).parent = Some(parent);
    }

    /// Unlink a node from its parent. The node and its subtree stay valid.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let is_attr = self.kind(id) == NodeKind::Attribute;
        if let Some(e) = self.element_mut(parent) {
            let list = if is_attr { &mut e.attrs } else { &mut e.children };
            list.retain(|c| *c != id);
        }
        self.node_mut(id).parent = None;
    }

    /// Remove the child from its parent, returns false if it was not attached there.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.node(child).parent != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    /// Temporarily take the child vector out so it can be reordered while the
    /// rest of the document is borrowed.
    pub(crate) fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        self.element_mut(id)
            .map(|e| std::mem::take(&mut e.children))
            .unwrap_or_default()
    }

    /// Put back a permutation of a vector returned by [`Document::take_children`].
    pub(crate) fn restore_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        if let Some(e) = self.element_mut(id) {
            e.children = children;
        }
    }

    /// The text body of an element: its first text child.
    pub fn body(&self, id: NodeId) -> Option<&str> {
        self.body_node(id).and_then(|b| self.value(b))
    }

    pub fn body_node(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.kind(*c) == NodeKind::Text)
    }

    /// First element child named `name`.
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.element_children(id).find(|c| self.name(*c) == name)
    }

    /// Body of the first element child named `name`, eg the value of a list key.
    pub fn find_body(&self, id: NodeId, name: &str) -> Option<&str> {
        self.find_child(id, name).and_then(|c| self.body(c))
    }

    /// First element child named `name` whose body equals `body`.
    pub fn find_child_with_body(&self, id: NodeId, name: &str, body: &str) -> Option<NodeId> {
        self.element_children(id)
            .find(|c| self.name(*c) == name && self.body(*c) == Some(body))
    }

    pub fn find_attribute(&self, id: NodeId, prefix: Option<&str>, name: &str) -> Option<NodeId> {
        self.attributes(id).iter().copied().find(|a| {
            self.attribute(*a)
                .is_some_and(|attr| attr.name == name && attr.prefix.as_deref() == prefix)
        })
    }

    pub fn find_attribute_value(&self, id: NodeId, prefix: Option<&str>, name: &str) -> Option<&str> {
        self.find_attribute(id, prefix, name)
            .and_then(|a| self.value(a))
    }

    /// Copy the subtree rooted at `src_id` of `src` below `parent`, keeping
    /// schema bindings. Returns the id of the copy.
    pub fn copy_subtree(&mut self, parent: NodeId, src: &Document, src_id: NodeId) -> NodeId {
        let copy = match &src.node(src_id).data {
            NodeData::Text(t) => return self.new_text(parent, t.clone()),
            NodeData::Attribute(a) => {
                return self.new_attribute(parent, a.prefix.as_deref(), &a.name, a.value.clone());
            }
            NodeData::Element(e) => {
                let id = self.new_element(parent, &e.name, e.prefix.as_deref());
                self.set_schema(id, e.schema);
                id
            }
        };
        for attr in src.attributes(src_id) {
            self.copy_subtree(copy, src, *attr);
        }
        for child in src.children(src_id) {
            self.copy_subtree(copy, src, *child);
        }
        copy
    }

    /// Pre-order walk over the elements of the subtree rooted at `id`.
    ///
    /// Returns `Walk::Abort` if the visitor aborted, `Walk::Continue` otherwise.
    pub fn apply<E, F>(&mut self, id: NodeId, f: &mut F) -> Result<Walk, E>
    where
        F: FnMut(&mut Document, NodeId) -> Result<Walk, E>,
    {
        match f(self, id)? {
            Walk::Abort => return Ok(Walk::Abort),
            Walk::SkipSubtree => return Ok(Walk::Continue),
            Walk::Continue => {}
        }
        let children: Vec<NodeId> = self.element_children(id).collect();
        for child in children {
            if self.apply(child, f)? == Walk::Abort {
                return Ok(Walk::Abort);
            }
        }
        Ok(Walk::Continue)
    }

    /// Read-only variant of [`Document::apply`].
    pub fn visit<E, F>(&self, id: NodeId, f: &mut F) -> Result<Walk, E>
    where
        F: FnMut(&Document, NodeId) -> Result<Walk, E>,
    {
        match f(self, id)? {
            Walk::Abort => return Ok(Walk::Abort),
            Walk::SkipSubtree => return Ok(Walk::Continue),
            Walk::Continue => {}
        }
        for child in self.element_children(id) {
            if self.visit(child, f)? == Walk::Abort {
                return Ok(Walk::Abort);
            }
        }
        Ok(Walk::Continue)
    }
}

impl Element {
    pub fn new(name: &str, prefix: Option<String>) -> Self {
        Element {
            name: name.to_owned(),
            prefix,
            attrs: Vec::new(),
            children: Vec::new(),
            schema: None,
        }
    }
}
