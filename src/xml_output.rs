//! Document tree to XML text, through the `quick-xml` writer.

use crate::err::{CodecError, Result};
use crate::model::{Document, NodeData, NodeId};
use crate::settings::CodecSettings;
use log::trace;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;
use std::io::Write;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Serializes document subtrees as XML.
pub struct XmlOutput<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlOutput<W> {
    pub fn with_writer(target: W, settings: &CodecSettings) -> Self {
        let writer = if settings.should_indent() {
            Writer::new_with_indent(target, b' ', 2)
        } else {
            Writer::new(target)
        };
        XmlOutput { writer }
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    /// Write the element `node` and everything below it.
    pub fn write_element(&mut self, doc: &Document, node: NodeId) -> Result<()> {
        let qname = qualified(doc.prefix(node), doc.name(node));
        trace!("writing <{qname}>");
        let mut start = BytesStart::new(qname.as_ref());
        for attr in doc.attributes(node) {
            if let Some(attribute) = doc.attribute(*attr) {
                let key = qualified(attribute.prefix.as_deref(), &attribute.name);
                start.push_attribute((key.as_ref(), attribute.value.as_str()));
            }
        }
        let children = doc.children(node);
        if children.is_empty() {
            return self.emit(Event::Empty(start));
        }
        self.emit(Event::Start(start))?;
        for child in children {
            match doc.node(*child).data() {
                NodeData::Element(_) => self.write_element(doc, *child)?,
                NodeData::Text(value) => self.write_text(value)?,
                NodeData::Attribute(_) => {}
            }
        }
        self.emit(Event::End(BytesEnd::new(qname.as_ref())))
    }

    /// Text outside CDATA markers is escaped, text inside goes out as a CDATA section.
    fn write_text(&mut self, value: &str) -> Result<()> {
        let mut rest = value;
        while let Some(open) = rest.find(CDATA_OPEN) {
            let after = &rest[open + CDATA_OPEN.len()..];
            let Some(close) = after.find(CDATA_CLOSE) else {
                break;
            };
            if open > 0 {
                self.emit(Event::Text(BytesText::new(&rest[..open])))?;
            }
            self.emit(Event::CData(BytesCData::new(&after[..close])))?;
            rest = &after[close + CDATA_CLOSE.len()..];
        }
        if !rest.is_empty() {
            self.emit(Event::Text(BytesText::new(rest)))?;
        }
        Ok(())
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(CodecError::xml_output)
    }
}

fn qualified<'a>(prefix: Option<&str>, name: &'a str) -> Cow<'a, str> {
    match prefix {
        Some(p) => Cow::Owned(format!("{p}:{name}")),
        None => Cow::Borrowed(name),
    }
}

/// Render the elements `nodes` of `doc` as XML, one after another.
pub fn to_xml_string(doc: &Document, nodes: &[NodeId], settings: &CodecSettings) -> Result<String> {
    let mut output = XmlOutput::with_writer(Vec::new(), settings);
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 && settings.should_indent() {
            output.writer.get_mut().push(b'\n');
        }
        output.write_element(doc, *node)?;
    }
    let mut bytes = output.into_writer();
    if settings.should_indent() && !bytes.is_empty() {
        bytes.push(b'\n');
    }
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_input::read_elements;
    use pretty_assertions::assert_eq;

    fn round_trip(xml: &str) -> String {
        let mut doc = Document::new("top");
        let root = doc.root();
        let top = read_elements(&mut doc, root, xml).expect("well-formed");
        to_xml_string(&doc, &top, &CodecSettings::new().pretty(false)).expect("writes")
    }

    #[test]
    fn test_compact_output_matches_input() {
        let xml = r#"<ex:a xmlns:ex="urn:x" v="1 &amp; 2"><b>x &lt; y</b><c/><d><![CDATA[<raw>]]></d></ex:a><e/>"#;
        assert_eq!(round_trip(xml), xml);
    }

    #[test]
    fn test_indented_output() {
        let mut doc = Document::new("top");
        let root = doc.root();
        let top = read_elements(&mut doc, root, "<a><b>1</b><c/></a>").expect("well-formed");
        let xml = to_xml_string(&doc, &top, &CodecSettings::new()).expect("writes");
        assert_eq!(xml, "<a>\n  <b>1</b>\n  <c/>\n</a>\n");
    }

    #[test]
    fn test_error_report_document() {
        use crate::netconf::{ErrorReport, RpcError};
        let mut report = ErrorReport::new();
        report.push(RpcError::malformed_message("bad"));
        let doc = report.to_document();
        let xml = to_xml_string(&doc, &[doc.root()], &CodecSettings::new().pretty(false)).expect("writes");
        assert!(xml.starts_with("<rpc-reply xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\"><rpc-error>"));
        assert!(xml.contains("<error-tag>malformed-message</error-tag>"));
    }
}
