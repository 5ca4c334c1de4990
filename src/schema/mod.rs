//! Compiled YANG schema.
//!
//! The schema is an arena of statements ([`SchemaNode`]) grouped into
//! [`Module`]s. It is built once, either programmatically through
//! [`SchemaBuilder`] or from a JSON description (see [`loader`]), and is
//! immutable afterwards. Document trees refer to statements by [`SchemaId`].
//!
//! When the schema is finished every statement gets an `order`: its position
//! in a pre-order walk over all modules. Siblings are therefore totally ordered
//! by declaration, including data nodes reached through `choice`/`case`.

pub mod loader;
pub mod types;

use crate::err::SchemaError;
use bitflags::bitflags;
use log::debug;
use serde::Deserialize;

pub use self::types::{BaseType, TypeSpec, TypedValue, compare_bodies};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

/// Statement keyword of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Keyword {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Rpc,
    Input,
    Output,
    Notification,
    #[serde(rename = "anyxml")]
    AnyXml,
    #[serde(rename = "anydata")]
    AnyData,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Container => "container",
            Keyword::List => "list",
            Keyword::Leaf => "leaf",
            Keyword::LeafList => "leaf-list",
            Keyword::Choice => "choice",
            Keyword::Case => "case",
            Keyword::Rpc => "rpc",
            Keyword::Input => "input",
            Keyword::Output => "output",
            Keyword::Notification => "notification",
            Keyword::AnyXml => "anyxml",
            Keyword::AnyData => "anydata",
        }
    }

    /// Choice and case do not appear in instance data.
    pub fn is_schema_only(self) -> bool {
        matches!(self, Keyword::Choice | Keyword::Case)
    }

    /// Leaves, leaf-lists and any-content nodes have no schema children.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Keyword::Leaf | Keyword::LeafList | Keyword::AnyXml | Keyword::AnyData
        )
    }

    fn can_contain(self, child: Keyword) -> bool {
        match self {
            _ if self.is_terminal() => false,
            Keyword::Choice => !matches!(
                child,
                Keyword::Choice | Keyword::Rpc | Keyword::Input | Keyword::Output | Keyword::Notification
            ),
            Keyword::Rpc => matches!(child, Keyword::Input | Keyword::Output),
            _ => !matches!(
                child,
                Keyword::Case | Keyword::Rpc | Keyword::Input | Keyword::Output | Keyword::Notification
            ),
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Per-statement properties relevant to ordering.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SchemaFlags: u8 {
        /// `config false`, set on the statement and inherited by descendants.
        const STATE = 0x01;
        /// `ordered-by user` on a list or leaf-list.
        const USER_ORDERED = 0x02;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub namespace: String,
    pub prefix: String,
    pub imports: Vec<Import>,
    top: Vec<SchemaId>,
}

impl Module {
    /// Top-level statements in declaration order.
    pub fn top(&self) -> &[SchemaId] {
        &self.top
    }
}

#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub keyword: Keyword,
    pub name: String,
    pub parent: Option<SchemaId>,
    pub children: Vec<SchemaId>,
    pub module: ModuleId,
    pub order: u32,
    pub flags: SchemaFlags,
    /// Key leaf names of a list, in declaration order.
    pub keys: Vec<String>,
    pub leaf_type: Option<TypeSpec>,
}

/// An immutable, compiled set of modules.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    modules: Vec<Module>,
    nodes: Vec<SchemaNode>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0 as usize]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.modules().find(|(_, m)| m.name == name).map(|(id, _)| id)
    }

    pub fn module_by_namespace(&self, namespace: &str) -> Option<ModuleId> {
        self.modules()
            .find(|(_, m)| m.namespace == namespace)
            .map(|(id, _)| id)
    }

    pub fn module_by_prefix(&self, prefix: &str) -> Option<ModuleId> {
        self.modules()
            .find(|(_, m)| m.prefix == prefix)
            .map(|(id, _)| id)
    }

    pub fn keyword(&self, id: SchemaId) -> Keyword {
        self.node(id).keyword
    }

    pub fn name(&self, id: SchemaId) -> &str {
        &self.node(id).name
    }

    pub fn order(&self, id: SchemaId) -> u32 {
        self.node(id).order
    }

    pub fn parent(&self, id: SchemaId) -> Option<SchemaId> {
        self.node(id).parent
    }

    pub fn module_of(&self, id: SchemaId) -> &Module {
        self.module(self.node(id).module)
    }

    pub fn keys(&self, id: SchemaId) -> &[String] {
        &self.node(id).keys
    }

    pub fn is_state(&self, id: SchemaId) -> bool {
        self.node(id).flags.contains(SchemaFlags::STATE)
    }

    pub fn is_user_ordered(&self, id: SchemaId) -> bool {
        self.node(id).flags.contains(SchemaFlags::USER_ORDERED)
    }

    pub fn leaf_type(&self, id: SchemaId) -> Option<&TypeSpec> {
        self.node(id).leaf_type.as_ref()
    }

    /// Find a data node named `name` among `candidates`, looking through
    /// choice and case statements.
    fn find_in(&self, candidates: &[SchemaId], name: &str) -> Option<SchemaId> {
        for id in candidates {
            let node = self.node(*id);
            if node.keyword.is_schema_only() {
                if let Some(found) = self.find_in(&node.children, name) {
                    return Some(found);
                }
            } else if node.name == name {
                return Some(*id);
            }
        }
        None
    }

    /// Top-level data node, rpc or notification of a module.
    pub fn find_top(&self, module: ModuleId, name: &str) -> Option<SchemaId> {
        self.find_in(&self.module(module).top, name)
    }

    /// Data child of `parent` named `name`. Children of an rpc are looked up
    /// in its `input`.
    pub fn find_datanode(&self, parent: SchemaId, name: &str) -> Option<SchemaId> {
        let node = self.node(parent);
        if node.keyword == Keyword::Rpc {
            let input = node
                .children
                .iter()
                .copied()
                .find(|c| self.keyword(*c) == Keyword::Input)?;
            return self.find_in(&self.node(input).children, name);
        }
        self.find_in(&node.children, name)
    }

    /// The choice a data node belongs to, if any.
    pub fn choice_of(&self, id: SchemaId) -> Option<SchemaId> {
        let mut cursor = self.parent(id)?;
        loop {
            match self.keyword(cursor) {
                Keyword::Choice => return Some(cursor),
                Keyword::Case => cursor = self.parent(cursor)?,
                _ => return None,
            }
        }
    }

    /// Prefix the module of `from` uses for `namespace`: its own prefix or the
    /// alias of a matching import.
    pub fn prefix_for_namespace(&self, from: SchemaId, namespace: &str) -> Option<&str> {
        let module = self.module_of(from);
        if module.namespace == namespace {
            return Some(&module.prefix);
        }
        module
            .imports
            .iter()
            .find(|import| {
                self.module_by_name(&import.module)
                    .is_some_and(|m| self.module(m).namespace == namespace)
            })
            .map(|import| import.prefix.as_str())
    }
}

/// Incremental construction of a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, name: &str, namespace: &str, prefix: &str) -> Result<ModuleId, SchemaError> {
        if self.schema.module_by_name(name).is_some() {
            return Err(SchemaError::DuplicateModule {
                name: name.to_owned(),
            });
        }
        let id = ModuleId(self.schema.modules.len() as u32);
        self.schema.modules.push(Module {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            prefix: prefix.to_owned(),
            imports: Vec::new(),
            top: Vec::new(),
        });
        Ok(id)
    }

    pub fn add_import(&mut self, module: ModuleId, imported: &str, prefix: &str) {
        self.schema.modules[module.0 as usize].imports.push(Import {
            module: imported.to_owned(),
            prefix: prefix.to_owned(),
        });
    }

    /// Add a statement owned by `module`, either at the top of the module or
    /// under `parent` (which may belong to another module, as with `augment`).
    pub fn add_node(
        &mut self,
        module: ModuleId,
        parent: Option<SchemaId>,
        keyword: Keyword,
        name: &str,
    ) -> Result<SchemaId, SchemaError> {
        match parent {
            Some(p) => {
                let parent_kw = self.schema.keyword(p);
                if !parent_kw.can_contain(keyword) {
                    return Err(SchemaError::InvalidParent {
                        parent: parent_kw.to_string(),
                        child: keyword.to_string(),
                    });
                }
            }
            None => {
                if matches!(keyword, Keyword::Case | Keyword::Input | Keyword::Output) {
                    return Err(SchemaError::InvalidParent {
                        parent: "module".to_owned(),
                        child: keyword.to_string(),
                    });
                }
            }
        }
        let id = SchemaId(self.schema.nodes.len() as u32);
        self.schema.nodes.push(SchemaNode {
            keyword,
            name: name.to_owned(),
            parent,
            children: Vec::new(),
            module,
            order: 0,
            flags: SchemaFlags::empty(),
            keys: Vec::new(),
            leaf_type: None,
        });
        match parent {
            Some(p) => self.schema.nodes[p.0 as usize].children.push(id),
            None => self.schema.modules[module.0 as usize].top.push(id),
        }
        Ok(id)
    }

    /// Add a statement under `parent` in the parent's own module.
    pub fn add_child(&mut self, parent: SchemaId, keyword: Keyword, name: &str) -> Result<SchemaId, SchemaError> {
        let module = self.schema.node(parent).module;
        self.add_node(module, Some(parent), keyword, name)
    }

    pub fn add_leaf(&mut self, parent: SchemaId, name: &str, ty: TypeSpec) -> Result<SchemaId, SchemaError> {
        let id = self.add_child(parent, Keyword::Leaf, name)?;
        self.set_type(id, ty);
        Ok(id)
    }

    pub fn set_type(&mut self, id: SchemaId, ty: TypeSpec) {
        self.node_mut(id).leaf_type = Some(ty);
    }

    pub fn set_keys<S: Into<String>>(&mut self, id: SchemaId, keys: impl IntoIterator<Item = S>) {
        self.node_mut(id).keys = keys.into_iter().map(Into::into).collect();
    }

    pub fn set_state(&mut self, id: SchemaId) {
        self.node_mut(id).flags.insert(SchemaFlags::STATE);
    }

    pub fn set_ordered_by_user(&mut self, id: SchemaId) {
        self.node_mut(id).flags.insert(SchemaFlags::USER_ORDERED);
    }

    fn node_mut(&mut self, id: SchemaId) -> &mut SchemaNode {
        &mut self.schema.nodes[id.0 as usize]
    }

    /// Validate cross references, inherit `config false` and number every
    /// statement in declaration order.
    pub fn finish(mut self) -> Result<Schema, SchemaError> {
        for module in &self.schema.modules {
            for import in &module.imports {
                if self.schema.module_by_name(&import.module).is_none() {
                    return Err(SchemaError::UnknownImport {
                        module: module.name.clone(),
                        import: import.module.clone(),
                    });
                }
            }
        }

        for node in &self.schema.nodes {
            for key in &node.keys {
                let is_leaf = node.children.iter().any(|c| {
                    let child = self.schema.node(*c);
                    child.keyword == Keyword::Leaf && child.name == *key
                });
                if !is_leaf {
                    return Err(SchemaError::UnknownKey {
                        list: node.name.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        let mut order = 0;
        // Explicit pre-order walk: pushed in reverse so the first declared pops first.
        let mut stack: Vec<(SchemaId, bool)> = Vec::new();
        for module in self.schema.modules.iter().rev() {
            stack.extend(module.top.iter().rev().map(|id| (*id, false)));
        }
        while let Some((id, inherited_state)) = stack.pop() {
            let node = &mut self.schema.nodes[id.0 as usize];
            node.order = order;
            order += 1;
            if inherited_state {
                node.flags.insert(SchemaFlags::STATE);
            }
            let state = node.flags.contains(SchemaFlags::STATE);
            stack.extend(node.children.iter().rev().map(|c| (*c, state)));
        }
        debug!(
            "compiled schema with {} modules and {} statements",
            self.schema.modules.len(),
            self.schema.nodes.len()
        );
        Ok(self.schema)
    }
}
