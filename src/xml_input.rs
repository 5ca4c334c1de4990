//! XML text to document tree, on top of the `quick-xml` pull parser.
//!
//! Top-level elements are appended under a synthetic `top` root, so fragments
//! with several roots read the same way decoded JSON does. Leaf text is kept
//! verbatim; whitespace-only text is dropped from elements that have element
//! children. Adjacent text and CDATA sections share one text body, CDATA
//! wrapped in its markers.

use crate::bind::bind_subtree;
use crate::err::{CodecError, Result};
use crate::json::{Outcome, Parsed, TOP_ELEMENT};
use crate::model::{Document, NodeId, NodeKind};
use crate::netconf::ErrorReport;
use crate::order::sort_tree;
use crate::schema::Schema;
use crate::settings::CodecSettings;
use log::trace;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::Read;

/// Parse `text` into a fresh tree. With a schema, the top-level elements are
/// bound per the binding mode of `settings` and the tree is sorted.
pub fn parse_xml_str(text: &str, schema: Option<&Schema>, settings: &CodecSettings) -> Result<Parsed> {
    let mut tree = Document::new(TOP_ELEMENT);
    let root = tree.root();
    let top = read_elements(&mut tree, root, text)?;
    let Some(schema) = schema else {
        return Ok(Parsed {
            tree,
            top,
            outcome: Outcome::Valid,
        });
    };
    let mut report = ErrorReport::new();
    for node in &top {
        bind_subtree(&mut tree, schema, *node, settings.get_binding(), &mut report);
    }
    sort_tree(&mut tree, schema, root);
    let outcome = if report.is_empty() {
        Outcome::Valid
    } else {
        Outcome::Invalid(report)
    };
    Ok(Parsed { tree, top, outcome })
}

/// [`parse_xml_str`] over everything `reader` yields.
pub fn parse_xml_reader<R: Read>(mut reader: R, schema: Option<&Schema>, settings: &CodecSettings) -> Result<Parsed> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_xml_str(&text, schema, settings)
}

/// Append the elements of `text` under `parent`, returning the top-level ones.
pub fn read_elements(doc: &mut Document, parent: NodeId, text: &str) -> Result<Vec<NodeId>> {
    let mut reader = Reader::from_str(text);

    let mut top = Vec::new();
    let mut stack = vec![parent];
    loop {
        let event = reader.read_event().map_err(|e| CodecError::MalformedXml {
            position: reader.error_position() as u64,
            message: e.to_string(),
        })?;
        let current = stack.last().copied().unwrap_or(parent);
        match event {
            Event::Start(start) => {
                let id = open_element(doc, current, &start, reader.buffer_position() as u64)?;
                if current == parent {
                    top.push(id);
                }
                stack.push(id);
            }
            Event::Empty(start) => {
                let id = open_element(doc, current, &start, reader.buffer_position() as u64)?;
                if current == parent {
                    top.push(id);
                }
            }
            Event::End(_) => {
                if let Some(closed) = stack.pop() {
                    drop_layout_text(doc, closed);
                }
            }
            Event::Text(raw) => {
                let position = reader.buffer_position() as u64;
                let raw = utf8(&raw, position)?;
                let value = unescape(raw).map_err(|e| malformed(position, e))?;
                if current != parent {
                    append_text(doc, current, &value);
                }
            }
            Event::CData(raw) => {
                let value = utf8(&raw, reader.buffer_position() as u64)?;
                if current != parent {
                    append_text(doc, current, &format!("<![CDATA[{value}]]>"));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    trace!("read {} top-level elements", top.len());
    Ok(top)
}

/// Extend the trailing text body of `element`, or start one.
fn append_text(doc: &mut Document, element: NodeId, value: &str) {
    let last = doc.children(element).last().copied();
    match last {
        Some(last) if doc.kind(last) == NodeKind::Text => {
            let merged = format!("{}{value}", doc.value(last).unwrap_or_default());
            doc.set_value(last, merged);
        }
        _ => {
            doc.new_text(element, value);
        }
    }
}

/// Remove indentation between the element children of `element`.
fn drop_layout_text(doc: &mut Document, element: NodeId) {
    let children = doc.children(element);
    if !children.iter().any(|c| doc.is_element(*c)) {
        return;
    }
    let layout: Vec<NodeId> = children
        .iter()
        .copied()
        .filter(|c| doc.kind(*c) == NodeKind::Text && doc.value(*c).is_some_and(|v| v.trim().is_empty()))
        .collect();
    for text in layout {
        doc.remove_child(element, text);
    }
}

fn malformed(position: u64, err: impl std::fmt::Display) -> CodecError {
    CodecError::MalformedXml {
        position,
        message: err.to_string(),
    }
}

fn utf8(bytes: &[u8], position: u64) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| malformed(position, e))
}

fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

fn open_element(doc: &mut Document, parent: NodeId, start: &BytesStart<'_>, position: u64) -> Result<NodeId> {
    let qname = utf8(start.name().into_inner(), position)?;
    let (prefix, name) = split_qname(qname);
    let id = doc.new_element(parent, name, prefix);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(position, e))?;
        let key = utf8(attr.key.into_inner(), position)?;
        let value = unescape(utf8(&attr.value, position)?).map_err(|e| malformed(position, e))?;
        let (prefix, name) = split_qname(key);
        doc.new_attribute(id, prefix, name, value.into_owned());
    }
    Ok(id)
}
