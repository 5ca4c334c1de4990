//! In-memory document model shared by the JSON and XML front-ends.

pub mod nsctx;
pub mod tree;

pub use self::nsctx::{NamespaceContext, namespace_change, namespace_of};
pub use self::tree::{Attribute, Document, Element, Node, NodeData, NodeId, NodeKind, Walk};
