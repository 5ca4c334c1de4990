#![deny(unused_must_use)]
#![forbid(unsafe_code)]
//! RFC 7951 JSON encoding and decoding of YANG-modeled XML document trees.
//!
//! A [`Document`] is an arena of elements, attributes and text, optionally
//! bound to the statements of a [`Schema`]. Bound trees are kept in canonical
//! order (schema declaration order, then list keys or leaf-list values), so
//! their children can be located with binary search.
//!
//! ```
//! use yang_json::{CodecSettings, parse_str, render_many};
//!
//! let parsed = parse_str(r#"{"ex:a": {"b": [1, 2]}}"#, None, &CodecSettings::new().pretty(false))?;
//! let json = render_many(&parsed.tree, None, &parsed.top, &CodecSettings::new().pretty(false));
//! assert_eq!(json, r#"{"ex:a":{"b":["1","2"]}}"#);
//! # Ok::<(), yang_json::err::CodecError>(())
//! ```

pub mod bind;
pub mod err;
pub mod json;
pub mod model;
pub mod netconf;
pub mod order;
pub mod schema;
pub mod settings;
pub mod xml_input;
pub mod xml_output;

pub use bind::bind_subtree;
pub use err::{CodecError, Result, SchemaError, ValueError};
pub use json::{Outcome, Parsed, parse_into, parse_reader, parse_str, parse_unbound, render, render_many, write_json};
pub use model::{Document, NodeId, Walk};
pub use netconf::{ErrorReport, RpcError};
pub use order::{ChildQuery, compare_siblings, find, insert_position, linear_match, sort_tree, verify_sorted};
pub use schema::{Keyword, Schema, SchemaId};
pub use settings::{BindingMode, CodecSettings};
pub use xml_input::{parse_xml_reader, parse_xml_str};
pub use xml_output::{XmlOutput, to_xml_string};
