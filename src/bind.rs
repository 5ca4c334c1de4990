//! Attaching schema statements to document elements.
//!
//! Binding resolves the top element of a decoded subtree according to the
//! [`BindingMode`], then descends by child name. An element that has no
//! matching statement is reported as `unknown-element` and its subtree is left
//! unbound; binding carries on with its siblings so a single decode reports
//! every unknown element.

use crate::model::nsctx::element_namespace;
use crate::model::{Document, NodeId};
use crate::netconf::{ErrorReport, RpcError};
use crate::schema::{Keyword, Schema, SchemaId};
use crate::settings::BindingMode;
use log::{debug, trace};

/// Bind `node` and its descendants. Returns false if any element could not be bound.
pub fn bind_subtree(
    doc: &mut Document,
    schema: &Schema,
    node: NodeId,
    mode: BindingMode,
    report: &mut ErrorReport,
) -> bool {
    let resolved = match mode {
        BindingMode::None => return true,
        BindingMode::Top => resolve_top(doc, schema, node),
        BindingMode::Parent => resolve_from_parent(doc, schema, node),
        BindingMode::Rpc => resolve_top(doc, schema, node).and_then(|id| {
            if schema.keyword(id) == Keyword::Rpc {
                Ok(id)
            } else {
                Err(format!("`{}` is a {}, not an rpc", doc.name(node), schema.keyword(id)))
            }
        }),
    };
    match resolved {
        Ok(id) => {
            doc.set_schema(node, Some(id));
            bind_children(doc, schema, node, id, report)
        }
        Err(message) => {
            debug!("binding <{}> failed: {message}", doc.name(node));
            report.push(RpcError::unknown_element(doc.name(node), message));
            false
        }
    }
}

fn resolve_top(doc: &Document, schema: &Schema, node: NodeId) -> Result<SchemaId, String> {
    let name = doc.name(node);
    match element_namespace(doc, node) {
        Some(namespace) => {
            let module = schema
                .module_by_namespace(&namespace)
                .ok_or_else(|| format!("no module has namespace `{namespace}`"))?;
            schema
                .find_top(module, name)
                .ok_or_else(|| format!("module `{}` has no top-level node `{name}`", schema.module(module).name))
        }
        // Namespace-less XML: take the first module that defines the name.
        None => schema
            .modules()
            .find_map(|(module, _)| schema.find_top(module, name))
            .ok_or_else(|| format!("no module has a top-level node `{name}`")),
    }
}

fn resolve_from_parent(doc: &Document, schema: &Schema, node: NodeId) -> Result<SchemaId, String> {
    let parent = doc
        .parent(node)
        .and_then(|p| doc.schema(p))
        .ok_or_else(|| format!("parent of `{}` is not bound to a schema node", doc.name(node)))?;
    resolve_child(doc, schema, parent, node)
}

fn resolve_child(doc: &Document, schema: &Schema, parent: SchemaId, node: NodeId) -> Result<SchemaId, String> {
    let name = doc.name(node);
    let id = schema
        .find_datanode(parent, name)
        .ok_or_else(|| format!("`{}` has no child node `{name}`", schema.name(parent)))?;
    if let Some(namespace) = element_namespace(doc, node) {
        let expected = &schema.module_of(id).namespace;
        if *expected != namespace {
            return Err(format!(
                "`{name}` is defined in namespace `{expected}`, found in `{namespace}`"
            ));
        }
    }
    Ok(id)
}

fn bind_children(doc: &mut Document, schema: &Schema, node: NodeId, id: SchemaId, report: &mut ErrorReport) -> bool {
    if matches!(schema.keyword(id), Keyword::AnyXml | Keyword::AnyData) {
        trace!("<{}> holds unmodeled content", doc.name(node));
        return true;
    }
    let children: Vec<NodeId> = doc.element_children(node).collect();
    let mut ok = true;
    for child in children {
        match resolve_child(doc, schema, id, child) {
            Ok(child_id) => {
                doc.set_schema(child, Some(child_id));
                ok &= bind_children(doc, schema, child, child_id, report);
            }
            Err(message) => {
                debug!("binding <{}> failed: {message}", doc.name(child));
                report.push(RpcError::unknown_element(doc.name(child), message));
                ok = false;
            }
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::example_schema;
    use pretty_assertions::assert_eq;

    fn system_doc() -> (Document, NodeId) {
        let mut doc = Document::new("top");
        let root = doc.root();
        let system = doc.new_element(root, "system", None);
        doc.new_attribute(system, None, "xmlns", "urn:example:example");
        doc.new_leaf(system, "hostname", "r1");
        let server = doc.new_element(system, "server", None);
        doc.new_leaf(server, "name", "a");
        (doc, system)
    }

    #[test]
    fn test_top_binding_reaches_every_element() {
        let schema = example_schema();
        let (mut doc, system) = system_doc();
        let mut report = ErrorReport::new();
        assert!(bind_subtree(&mut doc, &schema, system, BindingMode::Top, &mut report));
        assert!(report.is_empty());
        let server = doc.find_child(system, "server").expect("server");
        let name = doc.find_child(server, "name").expect("name");
        assert_eq!(doc.schema(name).map(|id| schema.keyword(id)), Some(Keyword::Leaf));
    }

    #[test]
    fn test_unknown_children_are_all_reported() {
        let schema = example_schema();
        let (mut doc, system) = system_doc();
        doc.new_leaf(system, "bogus", "1");
        let server = doc.find_child(system, "server").expect("server");
        doc.new_leaf(server, "colour", "red");
        let mut report = ErrorReport::new();
        assert!(!bind_subtree(&mut doc, &schema, system, BindingMode::Top, &mut report));
        assert_eq!(report.len(), 2);
        let hostname = doc.find_child(system, "hostname").expect("hostname");
        assert!(doc.schema(hostname).is_some());
        let bogus = doc.find_child(system, "bogus").expect("bogus");
        assert_eq!(doc.schema(bogus), None);
    }

    #[test]
    fn test_parent_mode_needs_bound_parent() {
        let schema = example_schema();
        let (mut doc, system) = system_doc();
        let mut report = ErrorReport::new();
        assert!(!bind_subtree(&mut doc, &schema, system, BindingMode::Parent, &mut report));

        let ex = schema.module_by_name("example").expect("module");
        doc.set_schema(system, schema.find_top(ex, "system"));
        let mtu = doc.new_leaf(system, "mtu", "1500");
        let mut report = ErrorReport::new();
        assert!(bind_subtree(&mut doc, &schema, mtu, BindingMode::Parent, &mut report));
        assert!(doc.schema(mtu).is_some());
    }

    #[test]
    fn test_rpc_mode_binds_input_leaves() {
        let schema = example_schema();
        let mut doc = Document::new("top");
        let root = doc.root();
        let reboot = doc.new_element(root, "reboot", None);
        doc.new_attribute(reboot, None, "xmlns", "urn:example:example");
        let delay = doc.new_leaf(reboot, "delay", "5");
        let mut report = ErrorReport::new();
        assert!(bind_subtree(&mut doc, &schema, reboot, BindingMode::Rpc, &mut report));
        assert!(doc.schema(delay).is_some());

        let (mut doc, system) = system_doc();
        assert!(!bind_subtree(&mut doc, &schema, system, BindingMode::Rpc, &mut report));
    }
}
