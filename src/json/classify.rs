//! Structural classification of nodes for JSON encoding.
//!
//! Two independent axes decide how a node is written:
//!
//! ```text
//!   array \ child |  null            | body        | any
//!   --------------+------------------+-------------+------------------
//!   no-array      |  "a": null       |  "a": 1     |  "a": { ... }
//!   first/single  |  "a": [ null     |  "a": [ 1   |  "a": [ { ... }
//!   middle        |     null         |     1       |     { ... }
//!   last          |     null ]       |     1 ]     |     { ... } ]
//! ```

use crate::model::{Document, NodeId, NodeKind};
use crate::schema::{Keyword, Schema};

/// Position of a node in a run of same-named siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayClass {
    NoArray,
    First,
    Middle,
    Last,
    /// A list instance without same-named neighbours, still written as an array.
    Single,
    /// A text body, written as a value.
    Body,
}

impl ArrayClass {
    pub fn opens_array(self) -> bool {
        matches!(self, ArrayClass::First | ArrayClass::Single)
    }

    pub fn closes_array(self) -> bool {
        matches!(self, ArrayClass::Last | ArrayClass::Single)
    }

    pub fn in_array(self) -> bool {
        matches!(
            self,
            ArrayClass::First | ArrayClass::Middle | ArrayClass::Last | ArrayClass::Single
        )
    }
}

/// What an element contains, attributes aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildShape {
    Null,
    Body,
    Any,
}

/// The default namespace declared on the element itself, the only one taken
/// into account when grouping siblings into arrays.
fn own_default_namespace(doc: &Document, id: NodeId) -> Option<&str> {
    doc.find_attribute_value(id, None, "xmlns")
}

fn same_member(doc: &Document, a: NodeId, b: Option<NodeId>) -> bool {
    let Some(b) = b else {
        return false;
    };
    doc.is_element(b)
        && doc.name(a) == doc.name(b)
        && own_default_namespace(doc, a) == own_default_namespace(doc, b)
}

pub fn classify_array(
    doc: &Document,
    schema: Option<&Schema>,
    prev: Option<NodeId>,
    node: NodeId,
    next: Option<NodeId>,
) -> ArrayClass {
    if doc.kind(node) != NodeKind::Element {
        return ArrayClass::Body;
    }
    match (same_member(doc, node, prev), same_member(doc, node, next)) {
        (true, true) => ArrayClass::Middle,
        (true, false) => ArrayClass::Last,
        (false, true) => ArrayClass::First,
        (false, false) => {
            let list_kind = schema.zip(doc.schema(node)).is_some_and(|(s, id)| {
                matches!(s.keyword(id), Keyword::List | Keyword::LeafList)
            });
            if list_kind {
                ArrayClass::Single
            } else {
                ArrayClass::NoArray
            }
        }
    }
}

pub fn classify_children(doc: &Document, node: NodeId) -> ChildShape {
    match doc.children(node) {
        [] => ChildShape::Null,
        [only] if doc.kind(*only) == NodeKind::Text => ChildShape::Body,
        _ => ChildShape::Any,
    }
}
