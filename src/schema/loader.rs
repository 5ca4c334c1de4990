//! Loading a [`Schema`] from a JSON description.
//!
//! The description is a compact rendition of the YANG statements the codec
//! needs:
//!
//! ```json
//! {"modules": [{
//!     "name": "example", "namespace": "urn:example", "prefix": "ex",
//!     "imports": [{"module": "types", "prefix": "t"}],
//!     "typedefs": [{"name": "percent", "type": "uint8"}],
//!     "data": [{"keyword": "list", "name": "server", "key": ["name"],
//!               "children": [{"keyword": "leaf", "name": "name", "type": "string"}]}],
//!     "augments": [{"target": "/types:settings", "data": []}]
//! }]}
//! ```
//!
//! A `type` is either a type name (built-in, local typedef or `prefix:typedef`)
//! or an object `{"name": "decimal64", "fraction-digits": 2}`.

use crate::err::SchemaError;
use crate::schema::types::{BaseType, TypeSpec};
use crate::schema::{Keyword, ModuleId, Schema, SchemaBuilder, SchemaId};

use hashbrown::HashMap;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    modules: Vec<ModuleDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleDoc {
    name: String,
    namespace: String,
    prefix: String,
    #[serde(default)]
    imports: Vec<ImportDoc>,
    #[serde(default)]
    typedefs: Vec<TypedefDoc>,
    #[serde(default)]
    data: Vec<NodeDoc>,
    #[serde(default)]
    augments: Vec<AugmentDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportDoc {
    module: String,
    prefix: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypedefDoc {
    name: String,
    // Kept as a raw value: untagged enums do not mix with `arbitrary_precision`.
    #[serde(rename = "type")]
    ty: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDoc {
    keyword: Keyword,
    name: String,
    #[serde(default)]
    key: Vec<String>,
    #[serde(rename = "type")]
    ty: Option<Value>,
    config: Option<bool>,
    #[serde(rename = "ordered-by-user", default)]
    ordered_by_user: bool,
    #[serde(default)]
    children: Vec<NodeDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AugmentDoc {
    target: String,
    data: Vec<NodeDoc>,
}

/// A type reference as written: a name plus an optional fraction-digits override.
#[derive(Debug, Clone)]
struct TypeRef {
    name: String,
    fraction_digits: Option<u8>,
}

impl TypeRef {
    fn from_value(owner: &str, value: &Value) -> Result<TypeRef, SchemaError> {
        let malformed = |message: &str| SchemaError::MalformedType {
            node: owner.to_owned(),
            message: message.to_owned(),
        };
        match value {
            Value::String(name) => Ok(TypeRef {
                name: name.clone(),
                fraction_digits: None,
            }),
            Value::Object(map) => {
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed("missing `name`"))?;
                let fraction_digits = match map.get("fraction-digits") {
                    None => None,
                    Some(v) => {
                        let digits = v
                            .as_u64()
                            .filter(|d| (1..=18).contains(d))
                            .ok_or_else(|| malformed("`fraction-digits` must be in 1..=18"))?;
                        Some(digits as u8)
                    }
                };
                Ok(TypeRef {
                    name: name.to_owned(),
                    fraction_digits,
                })
            }
            _ => Err(malformed("expected a type name or an object")),
        }
    }
}

/// Typedefs of every module, keyed by (module name, typedef name).
struct Typedefs<'d> {
    defs: HashMap<(String, String), &'d Value, ahash::RandomState>,
    modules: &'d [ModuleDoc],
}

impl<'d> Typedefs<'d> {
    fn new(modules: &'d [ModuleDoc]) -> Self {
        let mut defs = HashMap::default();
        for module in modules {
            for typedef in &module.typedefs {
                defs.insert((module.name.clone(), typedef.name.clone()), &typedef.ty);
            }
        }
        Typedefs { defs, modules }
    }

    /// Resolve a reference made from `module` down to a built-in type.
    fn resolve(&self, module: &'d ModuleDoc, ty: &TypeRef) -> Result<TypeSpec, SchemaError> {
        let mut seen: Vec<(String, String)> = Vec::new();
        let mut current_module = module;
        let mut current = ty.clone();
        let mut fraction_digits = ty.fraction_digits;
        loop {
            if let Some(base) = BaseType::from_name(&current.name) {
                let mut spec = TypeSpec::builtin(base);
                spec.name = ty.name.clone();
                if let Some(digits) = fraction_digits {
                    spec.fraction_digits = digits;
                }
                return Ok(spec);
            }
            let (owner, local) = match current.name.split_once(':') {
                Some((prefix, local)) => (self.module_for_prefix(current_module, prefix)?, local),
                None => (current_module, current.name.as_str()),
            };
            let key = (owner.name.clone(), local.to_owned());
            if seen.contains(&key) {
                return Err(SchemaError::TypedefCycle {
                    name: local.to_owned(),
                });
            }
            let value = self
                .defs
                .get(&key)
                .ok_or_else(|| SchemaError::UnknownType {
                    name: current.name.clone(),
                })?;
            let next = TypeRef::from_value(local, value)?;
            seen.push(key);
            fraction_digits = fraction_digits.or(next.fraction_digits);
            current_module = owner;
            current = next;
        }
    }

    fn module_for_prefix(&self, from: &'d ModuleDoc, prefix: &str) -> Result<&'d ModuleDoc, SchemaError> {
        let name = if from.prefix == prefix {
            from.name.as_str()
        } else {
            from.imports
                .iter()
                .find(|i| i.prefix == prefix)
                .map(|i| i.module.as_str())
                .ok_or_else(|| SchemaError::UnknownModule {
                    name: prefix.to_owned(),
                })?
        };
        self.modules
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| SchemaError::UnknownModule {
                name: name.to_owned(),
            })
    }
}

impl SchemaDoc {
    fn compile(&self) -> Result<Schema, SchemaError> {
        let typedefs = Typedefs::new(&self.modules);
        let mut builder = SchemaBuilder::new();
        let mut ids = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            let id = builder.add_module(&module.name, &module.namespace, &module.prefix)?;
            for import in &module.imports {
                builder.add_import(id, &import.module, &import.prefix);
            }
            ids.push(id);
        }
        for (module, id) in self.modules.iter().zip(&ids) {
            for node in &module.data {
                add_tree(&mut builder, &typedefs, module, *id, None, node)?;
            }
        }
        // Augments can target any module, so they go in once every module exists.
        for (module, id) in self.modules.iter().zip(&ids) {
            for augment in &module.augments {
                let target = resolve_target(&builder, module, &augment.target)?;
                for node in &augment.data {
                    add_tree(&mut builder, &typedefs, module, *id, Some(target), node)?;
                }
            }
        }
        builder.finish()
    }
}

fn add_tree<'d>(
    builder: &mut SchemaBuilder,
    typedefs: &Typedefs<'d>,
    module_doc: &'d ModuleDoc,
    module: ModuleId,
    parent: Option<SchemaId>,
    node: &NodeDoc,
) -> Result<(), SchemaError> {
    let id = builder.add_node(module, parent, node.keyword, &node.name)?;
    if let Some(ty) = &node.ty {
        let ty = TypeRef::from_value(&node.name, ty)?;
        builder.set_type(id, typedefs.resolve(module_doc, &ty)?);
    } else if matches!(node.keyword, Keyword::Leaf | Keyword::LeafList) {
        return Err(SchemaError::MalformedType {
            node: node.name.clone(),
            message: "leaf without a type".to_owned(),
        });
    }
    if !node.key.is_empty() {
        builder.set_keys(id, node.key.iter().cloned());
    }
    if node.config == Some(false) {
        builder.set_state(id);
    }
    if node.ordered_by_user {
        builder.set_ordered_by_user(id);
    }
    for child in &node.children {
        add_tree(builder, typedefs, module_doc, module, Some(id), child)?;
    }
    Ok(())
}

/// Resolve an absolute schema path like `/mod:a/b/other:c`. Unprefixed steps
/// stay in the module of the previous step.
fn resolve_target(builder: &SchemaBuilder, from: &ModuleDoc, target: &str) -> Result<SchemaId, SchemaError> {
    let unknown = || SchemaError::UnknownTarget {
        target: target.to_owned(),
    };
    let schema = &builder.schema;
    let mut current: Option<SchemaId> = None;
    let mut module_name = from.name.as_str();
    for step in target.split('/').filter(|s| !s.is_empty()) {
        let local = match step.split_once(':') {
            Some((prefix, local)) => {
                module_name = if prefix == from.prefix {
                    from.name.as_str()
                } else {
                    from.imports
                        .iter()
                        .find(|i| i.prefix == prefix)
                        .map(|i| i.module.as_str())
                        .unwrap_or(prefix)
                };
                local
            }
            None => step,
        };
        current = Some(match current {
            None => {
                let module = schema.module_by_name(module_name).ok_or_else(unknown)?;
                schema.find_top(module, local).ok_or_else(unknown)?
            }
            Some(parent) => schema.find_datanode(parent, local).ok_or_else(unknown)?,
        });
    }
    current.ok_or_else(unknown)
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let doc: SchemaDoc = serde_json::from_str(s)?;
        doc.compile()
    }
}

impl Schema {
    pub fn from_reader<R: Read>(reader: R) -> Result<Schema, SchemaError> {
        let doc: SchemaDoc = serde_json::from_reader(reader)?;
        doc.compile()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Schema, SchemaError> {
        let path = path.as_ref();
        debug!("loading schema description from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}
