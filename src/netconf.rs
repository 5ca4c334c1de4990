//! Structured validation errors in the NETCONF `rpc-error` shape.
//!
//! Schema and namespace problems found while decoding are not hard errors:
//! they are collected into an [`ErrorReport`] which the caller can print or
//! turn into an `<rpc-reply>` document with [`ErrorReport::to_document`].

use crate::model::Document;
use std::fmt;

pub const NETCONF_BASE_NAMESPACE: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Rpc,
    Protocol,
    Application,
}

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::Rpc => "rpc",
            ErrorType::Protocol => "protocol",
            ErrorType::Application => "application",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTag {
    MalformedMessage,
    UnknownNamespace,
    UnknownElement,
}

impl ErrorTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorTag::MalformedMessage => "malformed-message",
            ErrorTag::UnknownNamespace => "unknown-namespace",
            ErrorTag::UnknownElement => "unknown-element",
        }
    }
}

/// Content of `<error-info>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorInfo {
    BadNamespace(String),
    BadElement(String),
}

impl ErrorInfo {
    fn element_name(&self) -> &'static str {
        match self {
            ErrorInfo::BadNamespace(_) => "bad-namespace",
            ErrorInfo::BadElement(_) => "bad-element",
        }
    }

    fn value(&self) -> &str {
        match self {
            ErrorInfo::BadNamespace(v) | ErrorInfo::BadElement(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub error_type: ErrorType,
    pub tag: ErrorTag,
    pub info: Option<ErrorInfo>,
    pub message: String,
}

impl RpcError {
    pub fn malformed_message(message: impl Into<String>) -> Self {
        RpcError {
            error_type: ErrorType::Rpc,
            tag: ErrorTag::MalformedMessage,
            info: None,
            message: message.into(),
        }
    }

    pub fn unknown_namespace(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        RpcError {
            error_type: ErrorType::Application,
            tag: ErrorTag::UnknownNamespace,
            info: Some(ErrorInfo::BadNamespace(namespace.into())),
            message: message.into(),
        }
    }

    pub fn unknown_element(element: impl Into<String>, message: impl Into<String>) -> Self {
        RpcError {
            error_type: ErrorType::Application,
            tag: ErrorTag::UnknownElement,
            info: Some(ErrorInfo::BadElement(element.into())),
            message: message.into(),
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.error_type.as_str(), self.tag.as_str())?;
        if let Some(info) = &self.info {
            write!(f, " {}={}", info.element_name(), info.value())?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Every validation error found in one decode, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    errors: Vec<RpcError>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: RpcError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[RpcError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn first_tag(&self) -> Option<ErrorTag> {
        self.errors.first().map(|e| e.tag)
    }

    /// Build the `<rpc-reply>` carrying one `<rpc-error>` per error.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new("rpc-reply");
        let root = doc.root();
        doc.new_attribute(root, None, "xmlns", NETCONF_BASE_NAMESPACE);
        for error in &self.errors {
            let rpc_error = doc.new_element(root, "rpc-error", None);
            doc.new_leaf(rpc_error, "error-type", error.error_type.as_str());
            doc.new_leaf(rpc_error, "error-tag", error.tag.as_str());
            doc.new_leaf(rpc_error, "error-severity", "error");
            if let Some(info) = &error.info {
                let error_info = doc.new_element(rpc_error, "error-info", None);
                doc.new_leaf(error_info, info.element_name(), info.value());
            }
            doc.new_leaf(rpc_error, "error-message", error.message.as_str());
        }
        doc
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}
