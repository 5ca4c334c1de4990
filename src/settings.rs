use std::fmt;
use std::str::FromStr;

/// How schema statements are attached to a freshly decoded tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingMode {
    /// Schema-agnostic decode, nothing is bound.
    None,
    /// Children are resolved from the schema bound to the parent the JSON is
    /// decoded into.
    Parent,
    /// Top-level members are resolved from the module tops of the schema.
    #[default]
    Top,
    /// Top-level members must be rpcs, their children are bound from the rpc input.
    Rpc,
}

impl FromStr for BindingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(BindingMode::None),
            "parent" => Ok(BindingMode::Parent),
            "top" => Ok(BindingMode::Top),
            "rpc" => Ok(BindingMode::Rpc),
            other => Err(format!(
                "unknown binding mode `{other}`, expected one of none, parent, top, rpc"
            )),
        }
    }
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingMode::None => "none",
            BindingMode::Parent => "parent",
            BindingMode::Top => "top",
            BindingMode::Rpc => "rpc",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecSettings {
    pretty: bool,
    binding: BindingMode,
    strict_identityref_namespaces: bool,
}

impl Default for CodecSettings {
    fn default() -> Self {
        CodecSettings {
            pretty: true,
            binding: BindingMode::Top,
            strict_identityref_namespaces: false,
        }
    }
}

impl CodecSettings {
    pub fn new() -> Self {
        CodecSettings::default()
    }

    /// Indent output with two spaces per level, one member per line.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn binding(mut self, binding: BindingMode) -> Self {
        self.binding = binding;
        self
    }

    /// When set, identityref values whose namespace cannot be mapped to a
    /// prefix are rejected instead of falling back to the module's own prefix.
    pub fn strict_identityref_namespaces(mut self, strict: bool) -> Self {
        self.strict_identityref_namespaces = strict;
        self
    }

    pub fn should_indent(&self) -> bool {
        self.pretty
    }

    pub fn get_binding(&self) -> BindingMode {
        self.binding
    }

    pub fn should_enforce_identityref_namespaces(&self) -> bool {
        self.strict_identityref_namespaces
    }
}
