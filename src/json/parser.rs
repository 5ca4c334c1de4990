//! JSON text to generic document tree.
//!
//! `serde_json` does the grammar work (with `preserve_order`, so members keep
//! their written order, and `arbitrary_precision`, so numbers keep their
//! literal form). This module maps the resulting value onto elements:
//!
//! - every member becomes an element, `module:name` is split into prefix and name;
//! - an array member becomes one sibling element per item;
//! - scalars become the text body, `null` leaves the element empty.
//!
//! A member name repeated within one object is rejected: list and leaf-list
//! instances are written as one array member.

use crate::err::{CodecError, Result};
use crate::model::{Document, NodeId};
use hashbrown::HashSet;
use log::trace;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::fmt;

/// Parse `text` and append its top-level members under `parent`.
///
/// Returns the top-level elements in document order. Blank input yields none.
pub fn parse_members(doc: &mut Document, parent: NodeId, text: &str) -> Result<Vec<NodeId>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(members) = value else {
        return Err(CodecError::json_structure(format!(
            "expected a JSON object at top level, found {}",
            kind_of(&value)
        )));
    };
    let RepeatedMember(repeated) = serde_json::from_str(text)?;
    if let Some(name) = repeated {
        return Err(CodecError::json_structure(format!(
            "member `{name}` appears more than once in one object"
        )));
    }
    let mut top = Vec::with_capacity(members.len());
    add_members(doc, parent, &members, &mut top)?;
    Ok(top)
}

/// The first member name repeated within a single object, at any depth.
struct RepeatedMember(Option<String>);

impl<'de> Deserialize<'de> for RepeatedMember {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(RepeatedMemberVisitor)
    }
}

struct RepeatedMemberVisitor;

impl<'de> Visitor<'de> for RepeatedMemberVisitor {
    type Value = RepeatedMember;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(RepeatedMember(None))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Self::Value, E> {
        Ok(RepeatedMember(None))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Self::Value, E> {
        Ok(RepeatedMember(None))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Self::Value, E> {
        Ok(RepeatedMember(None))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Self::Value, E> {
        Ok(RepeatedMember(None))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Self::Value, E> {
        Ok(RepeatedMember(None))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut repeated = None;
        while let Some(RepeatedMember(inner)) = seq.next_element()? {
            repeated = repeated.or(inner);
        }
        Ok(RepeatedMember(repeated))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut seen: HashSet<String, ahash::RandomState> = HashSet::default();
        let mut repeated = None;
        while let Some(name) = map.next_key::<String>()? {
            let RepeatedMember(inner) = map.next_value()?;
            if repeated.is_none() && seen.contains(&name) {
                repeated = Some(name);
            } else {
                seen.insert(name);
                repeated = repeated.or(inner);
            }
        }
        Ok(RepeatedMember(repeated))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn split_member_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn add_members(doc: &mut Document, parent: NodeId, members: &Map<String, Value>, created: &mut Vec<NodeId>) -> Result<()> {
    for (name, value) in members {
        let (prefix, local) = split_member_name(name);
        match value {
            Value::Array(items) => {
                for item in items {
                    if item.is_array() {
                        return Err(CodecError::json_structure(format!(
                            "member `{name}` holds a nested array"
                        )));
                    }
                    created.push(add_element(doc, parent, prefix, local, item)?);
                }
            }
            value => created.push(add_element(doc, parent, prefix, local, value)?),
        }
    }
    Ok(())
}

fn add_element(doc: &mut Document, parent: NodeId, prefix: Option<&str>, name: &str, value: &Value) -> Result<NodeId> {
    let id = doc.new_element(parent, name, prefix);
    trace!("member {}{name} ({})", prefix.map(|p| format!("{p}:")).unwrap_or_default(), kind_of(value));
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            doc.new_text(id, if *b { "true" } else { "false" });
        }
        Value::Number(n) => {
            doc.new_text(id, n.to_string());
        }
        Value::String(s) => {
            doc.new_text(id, s.as_str());
        }
        Value::Object(members) => {
            let mut children = Vec::with_capacity(members.len());
            add_members(doc, id, members, &mut children)?;
        }
        Value::Array(_) => {
            return Err(CodecError::json_structure(format!("member `{name}` holds a nested array")));
        }
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_members_and_arrays_become_elements() {
        let mut doc = Document::new("top");
        let root = doc.root();
        let top = parse_members(
            &mut doc,
            root,
            r#"{"ex:a": {"b": [1, 2.50, "x"], "c": null, "d": {}, "e": true}}"#,
        )
        .expect("valid json");
        assert_eq!(top.len(), 1);
        let a = top[0];
        assert_eq!(doc.name(a), "a");
        assert_eq!(doc.prefix(a), Some("ex"));
        let bodies: Vec<_> = doc
            .element_children(a)
            .filter(|c| doc.name(*c) == "b")
            .map(|c| doc.body(c).unwrap_or_default().to_owned())
            .collect();
        assert_eq!(bodies, vec!["1", "2.50", "x"]);
        let c = doc.find_child(a, "c").expect("c");
        assert_eq!(doc.child_count(c), 0);
        assert_eq!(doc.find_body(a, "e"), Some("true"));
    }

    #[test]
    fn test_structure_errors() {
        let mut doc = Document::new("top");
        let root = doc.root();
        assert!(matches!(
            parse_members(&mut doc, root, "[1]"),
            Err(CodecError::JsonStructure { .. })
        ));
        assert!(matches!(
            parse_members(&mut doc, root, r#"{"a": [[1]]}"#),
            Err(CodecError::JsonStructure { .. })
        ));
        assert!(matches!(
            parse_members(&mut doc, root, r#"{"a": "#),
            Err(CodecError::MalformedInput { line: 1, .. })
        ));
        assert_eq!(parse_members(&mut doc, root, "  \n").expect("blank").len(), 0);
    }

    #[test]
    fn test_repeated_member_is_rejected() {
        let mut doc = Document::new("top");
        let root = doc.root();
        for text in [
            r#"{"ex:a": {"b": 1, "b": 2}}"#,
            r#"{"ex:a": [{"c": {"d": "x", "d": "y"}}]}"#,
            r#"{"ex:a": 1, "ex:a": 2}"#,
        ] {
            match parse_members(&mut doc, root, text) {
                Err(CodecError::JsonStructure { message }) => assert!(message.contains("appears more than once"), "{message}"),
                other => panic!("{text}: {other:?}"),
            }
        }
        let top = parse_members(&mut doc, root, r#"{"ex:a": {"b": 1.50, "c": [{"b": 2}, {"b": 3}]}}"#)
            .expect("same name in sibling objects");
        assert_eq!(top.len(), 1);
    }
}
