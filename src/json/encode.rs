//! RFC 7951 JSON rendering of document trees.
//!
//! The renderer walks the tree once and writes straight into a `String`:
//!
//! - Member names are qualified with the module name (`module:name`) only
//!   where the module differs from the one of the nearest qualified ancestor.
//! - Runs of same-named siblings become one JSON array, and list entries are
//!   always arrays, even alone.
//! - Leaf values are bare for numeric and boolean types, strings otherwise.
//! - Childless nodes are `{}` (containers), `[null]` (leaves, i.e. type
//!   `empty`) or `null`.
//! - Attributes are not rendered; namespace bindings only drive qualification.
//!
//! Pretty output indents by two spaces per level and closes arrays at the
//! indentation of their member name.

use crate::err::Result;
use crate::json::classify::{ArrayClass, ChildShape, classify_array, classify_children};
use crate::json::value::encode_value;
use crate::model::nsctx::NamespaceContext;
use crate::model::{Document, NodeId};
use crate::schema::{Keyword, Schema};
use crate::settings::CodecSettings;
use log::{trace, warn};
use std::io::Write;

const INDENT_WIDTH: usize = 2;

/// Render `node` as a single-member JSON object.
pub fn render(doc: &Document, schema: Option<&Schema>, node: NodeId, settings: &CodecSettings) -> String {
    let mut emitter = JsonEmitter::new(doc, schema, settings);
    emitter.out.push('{');
    emitter.new_line();
    emitter.render_member(node, ArrayClass::NoArray, 1, None);
    emitter.new_line();
    emitter.out.push('}');
    emitter.new_line();
    emitter.out
}

/// Render several nodes, not necessarily siblings, as members of one object.
///
/// The nodes are copied under a synthetic root that is not itself rendered.
/// Each copy carries the namespace bindings in scope at its original, so
/// prefixed values keep resolving.
pub fn render_many(doc: &Document, schema: Option<&Schema>, nodes: &[NodeId], settings: &CodecSettings) -> String {
    let mut graft = Document::new("yang-json");
    let root = graft.root();
    for node in nodes {
        let copy = graft.copy_subtree(root, doc, *node);
        let ctx = NamespaceContext::of_node(doc, *node);
        for (prefix, namespace) in ctx.iter() {
            let declared = match prefix {
                None => graft.find_attribute(copy, None, "xmlns"),
                Some(p) => graft.find_attribute(copy, Some("xmlns"), p),
            };
            if declared.is_some() {
                continue;
            }
            match prefix {
                None => graft.new_attribute(copy, None, "xmlns", namespace),
                Some(p) => graft.new_attribute(copy, Some("xmlns"), p, namespace),
            };
        }
    }

    let mut emitter = JsonEmitter::new(&graft, schema, settings);
    if nodes.is_empty() {
        emitter.out.push_str("{}");
    } else {
        emitter.out.push('{');
        emitter.new_line();
        emitter.render_members(root, 1, None);
        emitter.new_line();
        emitter.out.push('}');
    }
    emitter.new_line();
    emitter.out
}

/// [`render`] into a writer.
pub fn write_json<W: Write>(
    writer: &mut W,
    doc: &Document,
    schema: Option<&Schema>,
    node: NodeId,
    settings: &CodecSettings,
) -> Result<()> {
    writer.write_all(render(doc, schema, node, settings).as_bytes())?;
    Ok(())
}

struct JsonEmitter<'a> {
    doc: &'a Document,
    schema: Option<&'a Schema>,
    indent: bool,
    strict_identityref: bool,
    out: String,
}

impl<'a> JsonEmitter<'a> {
    fn new(doc: &'a Document, schema: Option<&'a Schema>, settings: &CodecSettings) -> Self {
        JsonEmitter {
            doc,
            schema,
            indent: settings.should_indent(),
            strict_identityref: settings.should_enforce_identityref_namespaces(),
            out: String::with_capacity(256),
        }
    }

    fn new_line(&mut self) {
        if self.indent {
            self.out.push('\n');
        }
    }

    fn write_indent(&mut self, depth: usize) {
        if self.indent {
            self.out
                .extend(std::iter::repeat_n(' ', depth * INDENT_WIDTH));
        }
    }

    /// Module name used to qualify a member. Unbound elements fall back to
    /// their prefix, which after a schema-less decode is the JSON module name.
    fn module_name(&self, node: NodeId) -> Option<&'a str> {
        let doc = self.doc;
        match (self.schema, doc.schema(node)) {
            (Some(schema), Some(id)) => Some(schema.module_of(id).name.as_str()),
            _ => doc.prefix(node),
        }
    }

    fn keyword(&self, node: NodeId) -> Option<Keyword> {
        let id = self.doc.schema(node)?;
        self.schema.map(|s| s.keyword(id))
    }

    fn write_name(&mut self, node: NodeId, qualifier: Option<&str>) {
        self.out.push('"');
        if let Some(module) = qualifier {
            self.out.push_str(module);
            self.out.push(':');
        }
        self.out.push_str(self.doc.name(node));
        self.out.push_str("\":");
        if self.indent {
            self.out.push(' ');
        }
    }

    fn render_member(&mut self, node: NodeId, class: ArrayClass, depth: usize, ancestor: Option<&'a str>) {
        let module = self.module_name(node);
        let (qualifier, inherited) = match module {
            Some(m) if Some(m) != ancestor => (Some(m), Some(m)),
            Some(m) => (None, Some(m)),
            None => (None, ancestor),
        };
        let shape = classify_children(self.doc, node);
        trace!("<{}> {:?} {:?}", self.doc.name(node), class, shape);

        match class {
            ArrayClass::NoArray => {
                self.write_indent(depth);
                self.write_name(node, qualifier);
                self.render_value(node, shape, depth, inherited, false);
            }
            ArrayClass::First | ArrayClass::Single => {
                self.write_indent(depth);
                self.write_name(node, qualifier);
                self.out.push('[');
                self.new_line();
                self.write_indent(depth + 1);
                self.render_value(node, shape, depth + 1, inherited, true);
            }
            ArrayClass::Middle | ArrayClass::Last => {
                self.write_indent(depth + 1);
                self.render_value(node, shape, depth + 1, inherited, true);
            }
            ArrayClass::Body => {
                encode_value(self.doc, self.schema, node, self.strict_identityref, &mut self.out);
            }
        }
        if class.closes_array() {
            self.new_line();
            self.write_indent(depth);
            self.out.push(']');
        }
    }

    fn render_value(&mut self, node: NodeId, shape: ChildShape, depth: usize, module: Option<&'a str>, in_array: bool) {
        match shape {
            ChildShape::Null => {
                let text = match self.keyword(node) {
                    _ if in_array => "null",
                    Some(Keyword::Container) => "{}",
                    Some(Keyword::Leaf | Keyword::LeafList) => "[null]",
                    _ => "null",
                };
                self.out.push_str(text);
            }
            ChildShape::Body => {
                if let Some(body) = self.doc.body_node(node) {
                    self.render_member(body, ArrayClass::Body, depth, module);
                }
            }
            ChildShape::Any => {
                if self.doc.element_children(node).next().is_none() {
                    warn!("<{}> holds only text, rendering it as an empty object", self.doc.name(node));
                    self.out.push_str("{}");
                    return;
                }
                self.out.push('{');
                self.new_line();
                self.render_members(node, depth + 1, module);
                self.new_line();
                self.write_indent(depth);
                self.out.push('}');
            }
        }
    }

    /// Render the element children of `node` as comma separated members.
    fn render_members(&mut self, node: NodeId, depth: usize, module: Option<&'a str>) {
        let doc = self.doc;
        if doc.children(node).len() != doc.element_children(node).count() {
            warn!("mixed content in <{}>, text is not rendered", doc.name(node));
        }
        let children: Vec<NodeId> = doc.element_children(node).collect();
        for (i, child) in children.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| children[p]);
            let next = children.get(i + 1).copied();
            let class = classify_array(doc, self.schema, prev, *child, next);
            self.render_member(*child, class, depth, module);
            if i + 1 < children.len() {
                self.out.push(',');
                self.new_line();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::example_schema;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    struct Fixture {
        schema: Schema,
        doc: Document,
        system: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let schema = example_schema();
            let ex = schema.module_by_name("example").expect("module");
            let system_id = schema.find_top(ex, "system").expect("system");
            let mut doc = Document::new("top");
            let root = doc.root();
            let system = doc.new_element(root, "system", None);
            doc.new_attribute(system, None, "xmlns", "urn:example:example");
            doc.set_schema(system, Some(system_id));
            Fixture { schema, doc, system }
        }

        fn add(&mut self, parent: NodeId, name: &str, body: Option<&str>) -> NodeId {
            let parent_id = self.doc.schema(parent).expect("bound parent");
            let id = self.schema.find_datanode(parent_id, name).expect("schema node");
            let node = self.doc.new_element(parent, name, None);
            if let Some(body) = body {
                self.doc.new_text(node, body);
            }
            self.doc.set_schema(node, Some(id));
            node
        }

        fn render(&self, pretty: bool) -> String {
            let settings = CodecSettings::new().pretty(pretty);
            render(&self.doc, Some(&self.schema), self.system, &settings)
        }
    }

    #[test]
    fn test_leaf_list_of_integers_is_bare_array() {
        let mut f = Fixture::new();
        let system = f.system;
        f.add(system, "priority", Some("1"));
        f.add(system, "priority", Some("2"));
        assert_eq!(f.render(false), r#"{"example:system":{"priority":[1,2]}}"#);
    }

    #[test]
    fn test_empty_container_and_empty_leaf() {
        let mut f = Fixture::new();
        let system = f.system;
        f.add(system, "options", None);
        f.add(system, "debug", None);
        assert_eq!(
            f.render(false),
            r#"{"example:system":{"options":{},"debug":[null]}}"#
        );
    }

    #[test]
    fn test_single_list_entry_is_array() {
        let mut f = Fixture::new();
        let system = f.system;
        let server = f.add(system, "server", None);
        f.add(server, "name", Some("a"));
        f.add(server, "enabled", Some("true"));
        f.add(server, "weight", Some("1.50"));
        assert_eq!(
            f.render(false),
            r#"{"example:system":{"server":[{"name":"a","enabled":true,"weight":1.50}]}}"#
        );
    }

    #[test]
    fn test_foreign_module_member_is_qualified() {
        let mut f = Fixture::new();
        let system = f.system;
        f.add(system, "hostname", Some("r1"));
        let location = f.add(system, "location", Some("lab"));
        f.doc.new_attribute(location, None, "xmlns", "urn:example:extras");
        assert_eq!(
            f.render(false),
            r#"{"example:system":{"hostname":"r1","extras:location":"lab"}}"#
        );
    }

    #[test]
    fn test_pretty_layout() {
        let mut f = Fixture::new();
        let system = f.system;
        f.add(system, "hostname", Some("r1"));
        for name in ["a", "b"] {
            let server = f.add(system, "server", None);
            f.add(server, "name", Some(name));
        }
        f.add(system, "priority", Some("7"));
        assert_eq!(
            f.render(true),
            indoc! {r#"
                {
                  "example:system": {
                    "hostname": "r1",
                    "server": [
                      {
                        "name": "a"
                      },
                      {
                        "name": "b"
                      }
                    ],
                    "priority": [
                      7
                    ]
                  }
                }
            "#}
        );
    }

    #[test]
    fn test_render_many_without_common_parent() {
        let mut f = Fixture::new();
        let system = f.system;
        let hostname = f.add(system, "hostname", Some("r1"));
        let mtu = f.add(system, "mtu", Some("1500"));
        let settings = CodecSettings::new().pretty(false);
        let out = render_many(&f.doc, Some(&f.schema), &[hostname, mtu], &settings);
        assert_eq!(out, r#"{"example:hostname":"r1","example:mtu":1500}"#);
        assert_eq!(render_many(&f.doc, Some(&f.schema), &[], &settings), "{}");
    }

    #[test]
    fn test_unbound_tree_keeps_prefixes_and_quotes_values() {
        let mut doc = Document::new("top");
        let root = doc.root();
        let a = doc.new_element(root, "a", Some("mod"));
        doc.new_leaf(a, "b", "1");
        doc.new_leaf(a, "b", "2");
        doc.new_element(a, "c", None);
        let out = render(&doc, None, a, &CodecSettings::new().pretty(false));
        assert_eq!(out, r#"{"mod:a":{"b":["1","2"],"c":null}}"#);
    }
}
