//! Locating children of a sorted element.
//!
//! Children of a bound, sorted element can be found by binary search on
//! schema order, then on name, list keys or leaf-list value. Instances of
//! `ordered-by user` lists and of state data are not sorted by value, so a
//! search that lands inside such a run falls back to a linear scan of the run.

use crate::model::{Document, NodeId};
use crate::schema::{Keyword, Schema, SchemaId, compare_bodies};
use log::trace;
use std::cmp::Ordering;

/// What a search is looking for: a data node of the schema and, for list and
/// leaf-list instances, the values that identify one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildQuery<'q> {
    pub name: &'q str,
    pub schema: SchemaId,
    /// `(key, value)` pairs in key order for a list. A leaf-list holds its
    /// value in a single pair whose key is the leaf-list name.
    pub keys: Vec<(&'q str, &'q str)>,
}

impl<'q> ChildQuery<'q> {
    /// Query for a container, leaf or any other single-instance node.
    pub fn new(name: &'q str, schema: SchemaId) -> Self {
        ChildQuery {
            name,
            schema,
            keys: Vec::new(),
        }
    }

    /// Query for a leaf-list entry.
    pub fn leaf_list(name: &'q str, schema: SchemaId, value: &'q str) -> Self {
        ChildQuery {
            name,
            schema,
            keys: vec![(name, value)],
        }
    }

    /// Query for a list entry by its keys.
    pub fn list(name: &'q str, schema: SchemaId, keys: Vec<(&'q str, &'q str)>) -> Self {
        ChildQuery { name, schema, keys }
    }

    /// Query matching `node` of `doc`, read as an instance of `id`.
    ///
    /// `None` if an identifying value is missing: a leaf-list without a body,
    /// or a list entry without one of its keys.
    pub fn for_node(doc: &'q Document, schema: &'q Schema, node: NodeId, id: SchemaId) -> Option<Self> {
        let name = doc.name(node);
        match schema.keyword(id) {
            Keyword::LeafList => Some(Self::leaf_list(name, id, doc.body(node)?)),
            Keyword::List => {
                let keys = schema
                    .keys(id)
                    .iter()
                    .map(|key| Some((key.as_str(), doc.find_body(node, key)?)))
                    .collect::<Option<Vec<_>>>()?;
                Some(Self::list(name, id, keys))
            }
            _ => Some(Self::new(name, id)),
        }
    }

    fn value(&self) -> Option<&'q str> {
        self.keys.first().map(|(_, v)| *v)
    }
}

/// Compare the query with a child bound to the same-ordered statement.
///
/// `unsorted` is set when the child belongs to a run that is not sorted by
/// value (state data or `ordered-by user`).
fn compare_query(doc: &Document, schema: &Schema, q: &ChildQuery<'_>, child: NodeId, id: SchemaId, unsorted: &mut bool) -> Ordering {
    if schema.is_state(id) {
        *unsorted = true;
    }
    match schema.keyword(q.schema) {
        Keyword::LeafList => {
            if schema.is_user_ordered(q.schema) {
                *unsorted = true;
            }
            compare_bodies(schema.leaf_type(q.schema), q.value(), doc.body(child))
        }
        Keyword::List => {
            if schema.is_user_ordered(q.schema) {
                *unsorted = true;
            }
            q.keys
                .iter()
                .map(|(key, value)| Some(*value).cmp(&doc.find_body(child, key)))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }
        _ => q.name.cmp(doc.name(child)),
    }
}

fn same_order(doc: &Document, schema: &Schema, child: NodeId, order: u32) -> Option<SchemaId> {
    doc.schema(child).filter(|id| schema.order(*id) == order)
}

/// Linear scan of the run of children around `mid` that share its schema order.
fn scan_run(doc: &Document, schema: &Schema, parent: NodeId, q: &ChildQuery<'_>, mid: usize) -> Option<NodeId> {
    let children = doc.children(parent);
    let order = schema.order(q.schema);
    let mut ignored = false;
    let mut matches = |i: usize| {
        same_order(doc, schema, children[i], order)
            .map(|id| compare_query(doc, schema, q, children[i], id, &mut ignored) == Ordering::Equal)
    };
    for i in mid + 1..children.len() {
        match matches(i) {
            Some(true) => return Some(children[i]),
            Some(false) => {}
            None => break,
        }
    }
    for i in (0..mid).rev() {
        match matches(i) {
            Some(true) => return Some(children[i]),
            Some(false) => {}
            None => break,
        }
    }
    None
}

/// Binary search for the child of `parent` that `q` identifies.
///
/// The children must be bound and sorted. Hitting an unbound child ends the
/// search with `None`.
pub fn find(doc: &Document, schema: &Schema, parent: NodeId, q: &ChildQuery<'_>) -> Option<NodeId> {
    let children = doc.children(parent);
    let order = schema.order(q.schema);
    let (mut low, mut high) = (0, children.len());
    while low < high {
        let mid = low + (high - low) / 2;
        let child = children[mid];
        let id = doc.schema(child)?;
        let mut cmp = order.cmp(&schema.order(id));
        if cmp == Ordering::Equal {
            let mut unsorted = false;
            cmp = compare_query(doc, schema, q, child, id, &mut unsorted);
            if unsorted && cmp != Ordering::Equal {
                trace!("<{}> lands in an unsorted run, scanning", q.name);
                return scan_run(doc, schema, parent, q, mid);
            }
        }
        match cmp {
            Ordering::Equal => return Some(child),
            Ordering::Less => high = mid,
            Ordering::Greater => low = mid + 1,
        }
    }
    None
}

/// Index in `low..high` at which a node matching `q` is inserted to keep the
/// children of `parent` sorted.
///
/// An empty range gives `low`; a range reaching past the children gives the
/// child count. Within an unsorted run the position is after the last child
/// with the same name, so new entries are appended.
pub fn insert_position(doc: &Document, schema: &Schema, parent: NodeId, q: &ChildQuery<'_>, low: usize, high: usize) -> usize {
    let children = doc.children(parent);
    let order = schema.order(q.schema);
    let (mut low, mut high) = (low, high);
    while low < high {
        let mid = low + (high - low) / 2;
        let Some(&child) = children.get(mid) else {
            return children.len();
        };
        let mut cmp = match doc.schema(child) {
            Some(id) => order.cmp(&schema.order(id)),
            None => Ordering::Greater,
        };
        if let (Ordering::Equal, Some(id)) = (cmp, doc.schema(child)) {
            let mut unsorted = false;
            cmp = compare_query(doc, schema, q, child, id, &mut unsorted);
            if unsorted {
                let last = (mid..children.len())
                    .take_while(|i| doc.name(children[*i]) == q.name)
                    .last()
                    .unwrap_or(mid);
                return last + 1;
            }
        }
        match cmp {
            Ordering::Equal => return mid,
            Ordering::Less => high = mid,
            Ordering::Greater => low = mid + 1,
        }
    }
    low
}

/// Find the child matching `q` by scanning every child, for unsorted parents.
///
/// Containers and leaves match by name, leaf-list entries by name and body,
/// list entries by name and every key. A list query without keys matches
/// nothing.
pub fn linear_match(doc: &Document, schema: &Schema, parent: NodeId, q: &ChildQuery<'_>) -> Option<NodeId> {
    match schema.keyword(q.schema) {
        Keyword::LeafList => doc.find_child_with_body(parent, q.name, q.value()?),
        Keyword::List => {
            if q.keys.is_empty() {
                return None;
            }
            doc.element_children(parent).find(|child| {
                doc.name(*child) == q.name
                    && q.keys
                        .iter()
                        .all(|(key, value)| doc.find_body(*child, key) == Some(*value))
            })
        }
        _ => doc.find_child(parent, q.name),
    }
}

/// Find the child of `base_parent` in `base` that corresponds to `child` of
/// `modification`, an instance of `id`.
///
/// A node inside a choice matches whichever child of the same choice is
/// present, so a case can be replaced by another. Binary search is used when
/// the base children are bound and sorted, linear matching otherwise. Children
/// of state data are never sorted.
pub fn find_matching_child(
    base: &Document,
    schema: &Schema,
    base_parent: NodeId,
    modification: &Document,
    child: NodeId,
    id: SchemaId,
) -> Option<NodeId> {
    if let Some(choice) = schema.choice_of(id) {
        return base.element_children(base_parent).find(|c| {
            base.schema(*c)
                .is_some_and(|cid| schema.choice_of(cid) == Some(choice))
        });
    }
    let q = ChildQuery::for_node(modification, schema, child, id)?;
    let state_parent = base.schema(base_parent).is_some_and(|p| schema.is_state(p));
    let sorted = !state_parent
        && base
            .children(base_parent)
            .first()
            .is_none_or(|first| base.schema(*first).is_some());
    if sorted {
        find(base, schema, base_parent, &q)
    } else {
        linear_match(base, schema, base_parent, &q)
    }
}

/// Move the bound element `child` under `parent` at its sorted position.
/// Returns the index it was inserted at.
pub fn insert_sorted(doc: &mut Document, schema: &Schema, parent: NodeId, child: NodeId) -> usize {
    doc.detach(child);
    let view: &Document = doc;
    let count = view.child_count(parent);
    let position = view
        .schema(child)
        .and_then(|id| ChildQuery::for_node(view, schema, child, id))
        .map_or(count, |q| insert_position(view, schema, parent, &q, 0, count));
    doc.insert_child(parent, position, child);
    position
}
