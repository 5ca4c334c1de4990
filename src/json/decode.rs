//! RFC 7951 JSON to document tree.
//!
//! Decoding runs in passes over each top-level member:
//!
//! 1. members become elements, `module:name` split into prefix and name;
//! 2. with a schema, every top-level member must be module-qualified;
//! 3. module prefixes are replaced by a default `xmlns` binding to the
//!    module's namespace;
//! 4. elements are bound to schema statements per [`BindingMode`];
//! 5. identityref values are rewritten to XML prefixes;
//!
//! after which the whole tree is sorted into canonical order.
//!
//! Failing steps 2, 3 or 5 rejects the input at once. Binding failures are
//! collected for the whole input before it is rejected.

use crate::bind::bind_subtree;
use crate::err::Result;
use crate::json::parser::parse_members;
use crate::json::value::decode_identityref;
use crate::model::{Document, NodeId, Walk, namespace_change};
use crate::netconf::{ErrorReport, RpcError};
use crate::order::sort_tree;
use crate::schema::{BaseType, Keyword, Schema};
use crate::settings::{BindingMode, CodecSettings};
use log::{debug, trace};
use std::io::Read;

/// Name of the element that holds the top-level members of a fresh tree.
pub const TOP_ELEMENT: &str = "top";

/// Schema verdict on a well-formed JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Invalid(ErrorReport),
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid)
    }

    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Outcome::Valid => None,
            Outcome::Invalid(report) => Some(report),
        }
    }

    fn rejected(error: RpcError) -> Self {
        let mut report = ErrorReport::new();
        report.push(error);
        Outcome::Invalid(report)
    }
}

/// A decoded document.
#[derive(Debug)]
pub struct Parsed {
    pub tree: Document,
    /// Top-level members, children of the tree root.
    pub top: Vec<NodeId>,
    pub outcome: Outcome,
}

/// Decode `text` into a fresh tree rooted at a `top` element.
pub fn parse_str(text: &str, schema: Option<&Schema>, settings: &CodecSettings) -> Result<Parsed> {
    let mut tree = Document::new(TOP_ELEMENT);
    let root = tree.root();
    let (top, outcome) = parse_into(&mut tree, root, text, schema, settings)?;
    Ok(Parsed { tree, top, outcome })
}

/// Decode everything `reader` yields.
pub fn parse_reader<R: Read>(mut reader: R, schema: Option<&Schema>, settings: &CodecSettings) -> Result<Parsed> {
    let mut buf = Vec::with_capacity(1024);
    reader.read_to_end(&mut buf)?;
    let text = String::from_utf8(buf)?;
    parse_str(&text, schema, settings)
}

/// Decode `text` and append its members under `parent` of an existing tree.
///
/// Returns the new top-level elements and the schema verdict. Malformed JSON
/// is an `Err`; a schema rejection is `Ok` with [`Outcome::Invalid`].
pub fn parse_into(
    doc: &mut Document,
    parent: NodeId,
    text: &str,
    schema: Option<&Schema>,
    settings: &CodecSettings,
) -> Result<(Vec<NodeId>, Outcome)> {
    let top = parse_members(doc, parent, text)?;
    debug!("parsed {} top-level members", top.len());
    let Some(schema) = schema else {
        return Ok((top, Outcome::Valid));
    };

    let mut report = ErrorReport::new();
    for node in &top {
        if doc.prefix(*node).is_none() {
            return Ok((
                top.clone(),
                Outcome::rejected(RpcError::malformed_message(format!(
                    "Top-level JSON object {} is not qualified with namespace which is a MUST according to RFC 7951",
                    doc.name(*node)
                ))),
            ));
        }
        if let Err(error) = translate_namespaces(doc, schema, *node) {
            return Ok((top.clone(), Outcome::rejected(error)));
        }
        bind_subtree(doc, schema, *node, settings.get_binding(), &mut report);
        if let Err(error) = decode_identityrefs(doc, schema, *node, settings.should_enforce_identityref_namespaces()) {
            return Ok((top.clone(), Outcome::rejected(error)));
        }
    }
    sort_tree(doc, schema, parent);

    if report.is_empty() {
        Ok((top, Outcome::Valid))
    } else {
        debug!("{} elements failed to bind", report.len());
        Ok((top, Outcome::Invalid(report)))
    }
}

/// Replace module-name prefixes below `node` with default namespace bindings.
fn translate_namespaces(doc: &mut Document, schema: &Schema, node: NodeId) -> std::result::Result<(), RpcError> {
    doc.apply(node, &mut |doc, id| -> std::result::Result<Walk, RpcError> {
        let Some(module_name) = doc.prefix(id) else {
            return Ok(Walk::Continue);
        };
        let module = schema.module_by_name(module_name).ok_or_else(|| {
            RpcError::unknown_namespace(module_name, "No yang module found corresponding to prefix")
        })?;
        let namespace = schema.module(module).namespace.clone();
        trace!("<{module_name}:{}> moves to namespace `{namespace}`", doc.name(id));
        namespace_change(doc, id, &namespace, None);
        Ok(Walk::Continue)
    })
    .map(|_| ())
}

/// Rewrite the values of bound identityref leaves below `node`.
fn decode_identityrefs(doc: &mut Document, schema: &Schema, node: NodeId, strict: bool) -> std::result::Result<(), RpcError> {
    doc.apply(node, &mut |doc, id| -> std::result::Result<Walk, RpcError> {
        let Some(leaf) = doc.schema(id) else {
            return Ok(Walk::Continue);
        };
        match schema.keyword(leaf) {
            Keyword::Leaf | Keyword::LeafList => {
                if schema.leaf_type(leaf).is_some_and(|ty| ty.base == BaseType::Identityref) {
                    decode_identityref(doc, schema, id, leaf, strict)?;
                }
                Ok(Walk::SkipSubtree)
            }
            Keyword::AnyXml | Keyword::AnyData => Ok(Walk::SkipSubtree),
            _ => Ok(Walk::Continue),
        }
    })
    .map(|_| ())
}

/// Decode without a schema: prefixes stay on the elements and nothing is bound.
pub fn parse_unbound(text: &str) -> Result<Parsed> {
    parse_str(text, None, &CodecSettings::new().binding(BindingMode::None))
}
