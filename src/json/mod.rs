//! RFC 7951 JSON encoding and decoding.

pub mod classify;
pub mod decode;
pub mod encode;
pub mod parser;
pub mod value;

pub use self::decode::{Outcome, Parsed, TOP_ELEMENT, parse_into, parse_reader, parse_str, parse_unbound};
pub use self::encode::{render, render_many, write_json};
pub use self::value::{decode_identityref, encode_identityref, encode_value, escape_json_cdata};
