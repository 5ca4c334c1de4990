//! Leaf value encoding and identityref translation.

use crate::model::nsctx::{NamespaceContext, namespace_of};
use crate::model::{Document, NodeId};
use crate::netconf::RpcError;
use crate::schema::{BaseType, Keyword, Schema, SchemaId, TypedValue};
use log::{debug, warn};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Escape `value` for use inside a JSON string, dropping CDATA markers.
///
/// The text between `<![CDATA[` and `]]>` is kept, only the markers go.
pub fn escape_json_cdata(value: &str, out: &mut String) {
    let mut in_cdata = false;
    let mut rest = value;
    while let Some(c) = rest.chars().next() {
        if !in_cdata && rest.starts_with(CDATA_OPEN) {
            in_cdata = true;
            rest = &rest[CDATA_OPEN.len()..];
            continue;
        }
        if in_cdata && rest.starts_with(CDATA_CLOSE) {
            in_cdata = false;
            rest = &rest[CDATA_CLOSE.len()..];
            continue;
        }
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }
}

/// Split `prefix:id` at the first colon.
pub(crate) fn split_nodeid(value: &str) -> (Option<&str>, &str) {
    match value.split_once(':') {
        Some((prefix, id)) => (Some(prefix), id),
        None => (None, value),
    }
}

/// The schema of the leaf or leaf-list a body belongs to, if typed.
fn owning_leaf(doc: &Document, schema: &Schema, body: NodeId) -> Option<SchemaId> {
    let parent = doc.parent(body)?;
    let id = doc.schema(parent)?;
    matches!(schema.keyword(id), Keyword::Leaf | Keyword::LeafList).then_some(id)
}

/// Encode a text body as a JSON value: bare for numeric and boolean leaves,
/// a string otherwise.
pub fn encode_value(doc: &Document, schema: Option<&Schema>, body: NodeId, strict: bool, out: &mut String) {
    let text = doc.value(body).unwrap_or_default();
    let leaf = schema.and_then(|s| owning_leaf(doc, s, body).map(|id| (s, id)));
    let Some((schema, leaf)) = leaf else {
        push_quoted(text, out);
        return;
    };
    let Some(ty) = schema.leaf_type(leaf) else {
        push_quoted(text, out);
        return;
    };
    if ty.base.is_unquoted() {
        match ty.parse(text) {
            Ok(value) => {
                let trimmed = text.trim();
                if matches!(value, TypedValue::Bool(_)) || is_json_number(trimmed) {
                    out.push_str(trimmed);
                } else {
                    out.push_str(&value.canonical(ty.fraction_digits));
                }
            }
            Err(e) => {
                warn!("{e} in `{}`, writing it as a string", schema.name(leaf));
                push_quoted(text, out);
            }
        }
        return;
    }
    if ty.base == BaseType::Identityref {
        let encoded = encode_identityref(doc, schema, body, leaf, strict);
        push_quoted(&encoded, out);
        return;
    }
    push_quoted(text, out);
}

/// Whether `text` is already a JSON number (`-?(0|[1-9][0-9]*)(\.[0-9]+)?`).
fn is_json_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    let int_ok = int_part == "0" || (all_digits(int_part) && !int_part.starts_with('0'));
    int_ok && frac_part.is_none_or(all_digits)
}

fn push_quoted(text: &str, out: &mut String) {
    out.push('"');
    escape_json_cdata(text, out);
    out.push('"');
}

/// Translate an XML identityref (`prefix:id`, prefix bound to a namespace)
/// into its JSON form (`module:id`, or `id` within the leaf's own module).
pub fn encode_identityref(doc: &Document, schema: &Schema, body: NodeId, leaf: SchemaId, strict: bool) -> String {
    let text = doc.value(body).unwrap_or_default();
    let (prefix, id) = split_nodeid(text);
    let element = doc.parent(body).unwrap_or(body);
    let Some(namespace) = namespace_of(doc, element, prefix) else {
        if strict {
            return id.to_owned();
        }
        // No binding in scope: read the prefix as a module prefix, then as a module name.
        let module = prefix.and_then(|p| schema.module_by_prefix(p).or_else(|| schema.module_by_name(p)));
        return match module {
            Some(m) => format!("{}:{id}", schema.module(m).name),
            None => id.to_owned(),
        };
    };
    match schema.module_by_namespace(&namespace) {
        Some(m) if schema.module(m).name == schema.module_of(leaf).name => id.to_owned(),
        Some(m) => format!("{}:{id}", schema.module(m).name),
        None => id.to_owned(),
    }
}

/// Translate a JSON identityref body (`module:id`) of `element` into XML form,
/// declaring a prefix for the module's namespace when none is in scope.
pub fn decode_identityref(
    doc: &mut Document,
    schema: &Schema,
    element: NodeId,
    leaf: SchemaId,
    strict: bool,
) -> Result<(), RpcError> {
    let Some(body) = doc.body_node(element) else {
        return Ok(());
    };
    let text = doc.value(body).unwrap_or_default().to_owned();
    let (Some(module_name), id) = split_nodeid(&text) else {
        return Ok(());
    };
    let module = schema.module_by_name(module_name).ok_or_else(|| {
        RpcError::unknown_namespace(module_name, "No module corresponding to prefix")
    })?;
    let module = schema.module(module);
    let namespace = module.namespace.as_str();

    let ctx = NamespaceContext::of_node(doc, element);
    let prefix = match ctx.prefix_of(namespace) {
        Some(bound) => bound.map(str::to_owned),
        None => {
            let local = match schema.prefix_for_namespace(leaf, namespace) {
                Some(p) => p,
                None if strict => {
                    return Err(RpcError::unknown_namespace(
                        namespace,
                        "No local prefix corresponding to namespace",
                    ));
                }
                None => module.prefix.as_str(),
            };
            doc.new_attribute(element, Some("xmlns"), local, namespace);
            Some(local.to_owned())
        }
    };
    let value = match &prefix {
        Some(p) => format!("{p}:{id}"),
        None => id.to_owned(),
    };
    debug!("identityref `{text}` of <{}> decoded as `{value}`", doc.name(element));
    doc.set_value(body, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::example_schema;
    use pretty_assertions::assert_eq;

    fn escaped(value: &str) -> String {
        let mut out = String::new();
        escape_json_cdata(value, &mut out);
        out
    }

    #[test]
    fn test_escape() {
        assert_eq!(escaped("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
        assert_eq!(escaped("tab\there\u{1}"), "tab\\there\\u0001");
        assert_eq!(escaped("x<![CDATA[<y>]]>z"), "x<y>z");
        assert_eq!(escaped("]]> stays outside cdata"), "]]> stays outside cdata");
    }

    /// `<system xmlns="urn:example:example"><leaf>body</leaf></system>`
    fn leaf_doc(schema: &Schema, leaf: &str, body: &str) -> (Document, NodeId, SchemaId) {
        let ex = schema.module_by_name("example").expect("module");
        let system_id = schema.find_top(ex, "system").expect("system");
        let leaf_id = schema.find_datanode(system_id, leaf).expect("leaf");
        let mut doc = Document::new("top");
        let root = doc.root();
        let system = doc.new_element(root, "system", None);
        doc.new_attribute(system, None, "xmlns", "urn:example:example");
        doc.set_schema(system, Some(system_id));
        let node = doc.new_leaf(system, leaf, body);
        doc.set_schema(node, Some(leaf_id));
        (doc, node, leaf_id)
    }

    fn encoded(doc: &Document, schema: &Schema, node: NodeId) -> String {
        let mut out = String::new();
        let body = doc.body_node(node).expect("body");
        encode_value(doc, Some(schema), body, false, &mut out);
        out
    }

    #[test]
    fn test_numbers_are_bare_strings_are_quoted() {
        let schema = example_schema();
        let (doc, node, _) = leaf_doc(&schema, "mtu", "42");
        assert_eq!(encoded(&doc, &schema, node), "42");
        let (doc, node, _) = leaf_doc(&schema, "hostname", "42");
        assert_eq!(encoded(&doc, &schema, node), "\"42\"");
        let (doc, node, _) = leaf_doc(&schema, "mtu", "big");
        assert_eq!(encoded(&doc, &schema, node), "\"big\"");
    }

    #[test]
    fn test_number_forms_outside_json_are_canonicalized() {
        let schema = example_schema();
        for (body, json) in [("+5", "5"), ("007", "7"), (" 0 ", "0"), ("1500", "1500")] {
            let (doc, node, _) = leaf_doc(&schema, "mtu", body);
            assert_eq!(encoded(&doc, &schema, node), json, "{body:?}");
        }
    }

    #[test]
    fn test_decimal_forms_outside_json_are_canonicalized() {
        let schema = example_schema();
        let ex = schema.module_by_name("example").expect("module");
        let system_id = schema.find_top(ex, "system").expect("system");
        let server_id = schema.find_datanode(system_id, "server").expect("server");
        let weight_id = schema.find_datanode(server_id, "weight").expect("weight");
        for (body, json) in [("1.", "1.0"), (".5", "0.5"), ("+2.25", "2.25"), ("1.50", "1.50"), ("-0.25", "-0.25")] {
            let mut doc = Document::new("top");
            let root = doc.root();
            let server = doc.new_element(root, "server", None);
            doc.set_schema(server, Some(server_id));
            let weight = doc.new_leaf(server, "weight", body);
            doc.set_schema(weight, Some(weight_id));
            assert_eq!(encoded(&doc, &schema, weight), json, "{body:?}");
        }
    }

    #[test]
    fn test_identityref_round_trip_other_module() {
        let schema = example_schema();
        let (mut doc, node, leaf) = leaf_doc(&schema, "algorithm", "crypto:aes");
        decode_identityref(&mut doc, &schema, node, leaf, false).expect("decodes");
        assert_eq!(doc.body(node), Some("cr:aes"));
        assert_eq!(
            doc.find_attribute_value(node, Some("xmlns"), "cr"),
            Some("urn:example:crypto")
        );
        assert_eq!(encoded(&doc, &schema, node), "\"crypto:aes\"");
    }

    #[test]
    fn test_identityref_same_module_is_bare() {
        let schema = example_schema();
        let (mut doc, node, leaf) = leaf_doc(&schema, "algorithm", "example:local-algo");
        decode_identityref(&mut doc, &schema, node, leaf, true).expect("decodes");
        assert_eq!(doc.body(node), Some("local-algo"));
        assert!(doc.attributes(node).is_empty());
        assert_eq!(encoded(&doc, &schema, node), "\"local-algo\"");
    }

    #[test]
    fn test_identityref_unknown_module() {
        let schema = example_schema();
        let (mut doc, node, leaf) = leaf_doc(&schema, "algorithm", "nope:x");
        let err = decode_identityref(&mut doc, &schema, node, leaf, false).expect_err("unknown module");
        assert_eq!(err.tag, crate::netconf::ErrorTag::UnknownNamespace);
    }

    #[test]
    fn test_identityref_strictness_without_import() {
        // `extras` is not imported by `example`.
        let schema = example_schema();
        let (mut doc, node, leaf) = leaf_doc(&schema, "algorithm", "extras:fast");
        assert!(decode_identityref(&mut doc, &schema, node, leaf, true).is_err());
        decode_identityref(&mut doc, &schema, node, leaf, false).expect("lenient");
        assert_eq!(doc.body(node), Some("x:fast"));
    }

    #[test]
    fn test_identityref_encode_unbound_prefix() {
        let schema = example_schema();
        let (doc, node, leaf) = leaf_doc(&schema, "algorithm", "crypto:aes");
        let body = doc.body_node(node).expect("body");
        assert_eq!(encode_identityref(&doc, &schema, body, leaf, false), "crypto:aes");
        assert_eq!(encode_identityref(&doc, &schema, body, leaf, true), "aes");
    }
}
