use thiserror::Error;

use std::io;
use std::string::FromUtf8Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Errors related to reading JSON text
    #[error("JSON error: line {line}, column {column}: {message}")]
    MalformedInput {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Building a document tree from JSON failed with message: {message}")]
    JsonStructure { message: String },

    /// Errors related to reading XML text
    #[error("XML error at position {position}: {message}")]
    MalformedXml { position: u64, message: String },

    /// Errors related to serialization.
    // `quick-xml` keeps the element stack for us, structural errors in the XML
    // writer end up in this generic error alongside IO errors.
    #[error("Writing to XML failed with: {message}")]
    XmlOutput { message: String },

    #[error("An I/O error has occurred: {0}")]
    Io(#[from] io::Error),

    #[error("Input contains invalid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CodecError {
    pub(crate) fn xml_output(err: impl std::fmt::Display) -> Self {
        CodecError::XmlOutput {
            message: err.to_string(),
        }
    }

    pub(crate) fn json_structure(message: impl Into<String>) -> Self {
        CodecError::JsonStructure {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::MalformedInput {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Errors raised while building or loading a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("module `{name}` is defined more than once")]
    DuplicateModule { name: String },

    #[error("module `{name}` is not defined")]
    UnknownModule { name: String },

    #[error("module `{module}` imports unknown module `{import}`")]
    UnknownImport { module: String, import: String },

    #[error("list `{list}` declares key `{key}` which is not one of its leaves")]
    UnknownKey { list: String, key: String },

    #[error("type `{name}` cannot be resolved to a built-in type")]
    UnknownType { name: String },

    #[error("typedef `{name}` refers back to itself")]
    TypedefCycle { name: String },

    #[error("`{child}` cannot be placed under a `{parent}` statement")]
    InvalidParent { parent: String, child: String },

    #[error("augment target `{target}` does not resolve to a schema node")]
    UnknownTarget { target: String },

    #[error("type of `{node}` is malformed: {message}")]
    MalformedType { node: String, message: String },

    #[error("failed to read schema description: {0}")]
    Description(#[from] serde_json::Error),

    #[error("failed to open schema description: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised when a leaf body does not parse as its declared type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("`{value}` is not a valid {type_name}")]
    InvalidNumber {
        value: String,
        type_name: &'static str,
    },

    #[error("`{value}` is not a valid decimal64 with {fraction_digits} fraction digits")]
    InvalidDecimal { value: String, fraction_digits: u8 },

    #[error("`{value}` is not a boolean, expected `true` or `false`")]
    InvalidBoolean { value: String },
}
