//! Canonical ordering of sibling elements.
//!
//! Bound siblings are ordered first by the declaration order of their schema
//! statements, then, for several instances of the same list or leaf-list, by
//! key values or typed body. State data and `ordered-by user` instances keep
//! their relative order. Unbound elements have no defined order.

use crate::model::{Document, NodeId, Walk};
use crate::schema::{Keyword, Schema, compare_bodies};
use log::trace;
use std::cmp::Ordering;
use std::convert::Infallible;

/// Compare two siblings.
pub fn compare_siblings(doc: &Document, schema: &Schema, a: NodeId, b: NodeId) -> Ordering {
    let (Some(sa), Some(sb)) = (doc.schema(a), doc.schema(b)) else {
        return Ordering::Equal;
    };
    if sa != sb {
        return schema.order(sa).cmp(&schema.order(sb));
    }
    if schema.is_state(sa) || schema.is_user_ordered(sa) {
        return Ordering::Equal;
    }
    match schema.keyword(sa) {
        Keyword::LeafList => compare_bodies(schema.leaf_type(sa), doc.body(a), doc.body(b)),
        Keyword::List => schema
            .keys(sa)
            .iter()
            .map(|key| doc.find_body(a, key).cmp(&doc.find_body(b, key)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Sort the children of `node` in place.
///
/// Returns [`Walk::SkipSubtree`] for state data, whose content is left as is.
/// Only runs of bound elements are reordered: text and unbound elements stay
/// where they are and split the children into independently sorted runs.
pub fn sort_children(doc: &mut Document, schema: &Schema, node: NodeId) -> Walk {
    if doc.schema(node).is_some_and(|id| schema.is_state(id)) {
        return Walk::SkipSubtree;
    }
    let mut children = doc.take_children(node);
    if children.len() > 1 {
        trace!("sorting {} children of <{}>", children.len(), doc.name(node));
        let view: &Document = doc;
        for run in children.split_mut(|c| view.schema(*c).is_none()) {
            run.sort_by(|a, b| compare_siblings(view, schema, *a, *b));
        }
    }
    doc.restore_children(node, children);
    Walk::Continue
}

/// Sort every element of the subtree rooted at `node`.
pub fn sort_tree(doc: &mut Document, schema: &Schema, node: NodeId) {
    let result: Result<Walk, Infallible> = doc.apply(node, &mut |d, id| Ok(sort_children(d, schema, id)));
    let Ok(_) = result;
}

/// First adjacent pair of children of `node` that is out of order.
pub fn first_inversion(doc: &Document, schema: &Schema, node: NodeId) -> Option<(NodeId, NodeId)> {
    if doc.schema(node).is_some_and(|id| schema.is_state(id)) {
        return None;
    }
    doc.children(node)
        .windows(2)
        .find(|pair| compare_siblings(doc, schema, pair[0], pair[1]) == Ordering::Greater)
        .map(|pair| (pair[0], pair[1]))
}

/// True if the children of `node` are in canonical order. State data is sorted
/// by definition.
pub fn verify_sorted(doc: &Document, schema: &Schema, node: NodeId) -> bool {
    first_inversion(doc, schema, node).is_none()
}

/// [`verify_sorted`] over the whole subtree.
pub fn verify_sorted_tree(doc: &Document, schema: &Schema, node: NodeId) -> bool {
    let walk = doc.visit(node, &mut |d, id| -> Result<Walk, ()> {
        if d.schema(id).is_some_and(|s| schema.is_state(s)) {
            return Ok(Walk::SkipSubtree);
        }
        if verify_sorted(d, schema, id) {
            Ok(Walk::Continue)
        } else {
            Ok(Walk::Abort)
        }
    });
    walk == Ok(Walk::Continue)
}
