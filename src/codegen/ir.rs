//! Directory/Field IR
//!
//! The final product of a run: every directory with its named, typed
//! fields, plus the enumeration table. Everything is keyed by path or name
//! in `BTreeMap`s so emitters can iterate in a stable order.

use serde::Serialize;
use std::collections::BTreeMap;

use super::enums::{EnumEntity, EnumSet};
use super::keys::{resolve_list_key, ListKeyInfo};
use super::names::{camel_case, join_camel, module_qualified, NameRegistry};
use super::types::{MappedType, TypeResolver};
use crate::config::GenerateConfig;
use crate::mapping::{
    find_all_children, is_excluded, DiagnosticCode, Diagnostics, MappableEntities, MappedDirectory,
};
use crate::schema::{NodeId, NodeKind, SchemaIndex, SchemaTree};

// =============================================================================
// IR Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Leaf,
    LeafList,
    Container,
    List,
    Anydata,
}

impl FieldKind {
    fn of(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Leaf => Some(Self::Leaf),
            NodeKind::LeafList => Some(Self::LeafList),
            NodeKind::Container => Some(Self::Container),
            NodeKind::List => Some(Self::List),
            NodeKind::Anydata => Some(Self::Anydata),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    #[serde(skip)]
    pub node: NodeId,
    /// Path from the owning directory (`config/mtu`); absolute without the
    /// module for fields of the fake root
    pub schema_path: String,
    /// The same leaf on the other side of a config/state split
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_type: Option<MappedType>,
    /// Name of the directory a container or list field refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directory {
    pub name: String,
    /// Data path segments, `["", module, ...]`
    pub path: Vec<String>,
    pub fields: BTreeMap<String, Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_keys: Option<ListKeyInfo>,
    pub is_fake_root: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub belonging_module: Option<String>,
}

impl Directory {
    pub fn path_string(&self) -> String {
        if self.is_fake_root {
            return crate::mapping::FAKE_ROOT_PATH.to_string();
        }
        self.path.join("/")
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

/// The IR handed to emitters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ir {
    /// Directory path -> directory
    pub directories: BTreeMap<String, Directory>,
    /// Enum name -> entity
    pub enums: BTreeMap<String, EnumEntity>,
    /// Informational notes from the run
    #[serde(skip_serializing_if = "Diagnostics::is_empty")]
    pub diagnostics: Diagnostics,
}

impl Ir {
    pub fn directory(&self, path: &str) -> Option<&Directory> {
        self.directories.get(path)
    }

    pub fn directory_by_name(&self, name: &str) -> Option<&Directory> {
        self.directories.values().find(|d| d.name == name)
    }

    pub fn directory_names(&self) -> Vec<&str> {
        self.directories.values().map(|d| d.name.as_str()).collect()
    }

    pub fn enum_names(&self) -> Vec<&str> {
        self.enums.keys().map(String::as_str).collect()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Everything the IR builder reads
pub struct IrContext<'a> {
    pub tree: &'a SchemaTree,
    pub index: &'a SchemaIndex,
    pub entities: &'a MappableEntities,
    pub enums: &'a EnumSet,
    pub config: &'a GenerateConfig,
}

/// Name every directory and map its fields.
///
/// Errors from every directory are collected before the run is failed.
/// Directory names come from `registry`, which must not be shared with
/// enum naming.
pub fn build_ir(ctx: &IrContext<'_>, registry: &mut NameRegistry) -> Result<Ir, Diagnostics> {
    let behaviour = ctx.config.compress_behaviour;
    let compress = behaviour.compress_enabled();
    let resolver = TypeResolver::new(ctx.tree, ctx.index, ctx.enums);
    let mut diagnostics = Diagnostics::new();

    let kept: Vec<(&String, &MappedDirectory)> = ctx
        .entities
        .directories
        .iter()
        .filter(|(_, dir)| match dir {
            MappedDirectory::Schema(id) => !(behaviour.state_excluded() && !ctx.tree.is_config(*id)),
            MappedDirectory::FakeRoot(_) => true,
        })
        .collect();

    let mut names: BTreeMap<String, String> = BTreeMap::new();
    for (path, dir) in &kept {
        let name = registry.make_unique(&directory_base_name(ctx, path, dir, compress));
        names.insert((*path).clone(), name);
    }

    let mut ir = Ir::default();
    for (path, dir) in kept {
        let name = names.get(path).cloned().unwrap_or_default();
        let directory = match dir {
            MappedDirectory::Schema(id) => {
                let fields = match find_all_children(ctx.tree, *id, behaviour) {
                    Ok(fields) => fields,
                    Err(errors) => {
                        diagnostics.merge(errors);
                        continue;
                    }
                };
                let mut directory = Directory {
                    name: name.clone(),
                    path: ctx.tree.data_path(*id),
                    fields: BTreeMap::new(),
                    list_keys: None,
                    is_fake_root: false,
                    belonging_module: Some(ctx.tree.node(*id).module.clone()),
                };
                for (field_name, child) in fields {
                    let schema_path = relative_path(ctx.tree, *id, child);
                    if let Some(field) = build_field(ctx, &resolver, &names, &name, field_name, child, schema_path, &mut diagnostics) {
                        directory.fields.insert(field.name.clone(), field);
                    }
                }
                if ctx.tree.node(*id).is_list() {
                    match resolve_list_key(ctx.tree, *id, compress, &resolver, &name) {
                        Ok(Some(keys)) => directory.list_keys = Some(keys),
                        Ok(None) => diagnostics.info(
                            path.as_str(),
                            DiagnosticCode::KeylessList,
                            format!("read-only list {} has no key and maps to an unkeyed sequence", path),
                        ),
                        Err(errors) => diagnostics.merge(errors),
                    }
                }
                directory
            }
            MappedDirectory::FakeRoot(root) => {
                let mut directory = Directory {
                    name: name.clone(),
                    path: vec![String::new()],
                    fields: BTreeMap::new(),
                    list_keys: None,
                    is_fake_root: true,
                    belonging_module: None,
                };
                for (field_name, &child) in &root.fields {
                    if behaviour.state_excluded() && !ctx.tree.is_config(child) {
                        continue;
                    }
                    let schema_path = format!("/{}", ctx.tree.data_path(child)[2..].join("/"));
                    if let Some(field) = build_field(ctx, &resolver, &names, &name, field_name.clone(), child, schema_path, &mut diagnostics) {
                        directory.fields.insert(field.name.clone(), field);
                    }
                }
                directory
            }
        };
        ir.directories.insert(path.clone(), directory);
    }

    ir.enums = ctx.enums.entities.clone();

    if diagnostics.has_errors() {
        diagnostics.sort();
        return Err(diagnostics);
    }
    diagnostics.sort();
    ir.diagnostics = diagnostics;

    tracing::debug!(
        directories = ir.directories.len(),
        enums = ir.enums.len(),
        "built IR"
    );
    Ok(ir)
}

/// Candidate name before uniquification
fn directory_base_name(ctx: &IrContext<'_>, path: &str, dir: &MappedDirectory, compress: bool) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    match dir {
        MappedDirectory::FakeRoot(root) => camel_case(&root.name),
        MappedDirectory::Schema(_) if compress => {
            // only the segments that are themselves directories
            let dirs: Vec<&str> = (3..=segments.len())
                .filter(|&end| ctx.entities.directories.contains_key(&segments[..end].join("/")))
                .map(|end| segments[end - 1])
                .collect();
            join_camel(&dirs)
        }
        MappedDirectory::Schema(_) => module_qualified(segments[1], &segments[2..]),
    }
}

/// Path of `child` below `dir`, choice/case segments dropped
fn relative_path(tree: &SchemaTree, dir: NodeId, child: NodeId) -> String {
    let base = tree.data_path(dir).len();
    tree.data_path(child)[base..].join("/")
}

#[allow(clippy::too_many_arguments)]
fn build_field(
    ctx: &IrContext<'_>,
    resolver: &TypeResolver<'_>,
    names: &BTreeMap<String, String>,
    owner: &str,
    name: String,
    child: NodeId,
    schema_path: String,
    diagnostics: &mut Diagnostics,
) -> Option<Field> {
    let tree = ctx.tree;
    if is_excluded(tree, child, &ctx.config.exclude_modules) {
        return None;
    }
    let node = tree.node(child);
    let kind = FieldKind::of(node.kind)?;

    let mut field = Field {
        name,
        kind,
        node: child,
        schema_path,
        shadow_path: None,
        mapped_type: None,
        directory: None,
        module: node.module.clone(),
    };

    match kind {
        FieldKind::Leaf | FieldKind::LeafList => {
            match resolver.leaf_type(child, owner) {
                Ok(mapped) => {
                    let declared_union = node.type_desc.as_ref().map(|t| t.is_union()).unwrap_or(false);
                    if declared_union && !mapped.is_union() {
                        diagnostics.info(
                            tree.path_string(child),
                            DiagnosticCode::UnionSimplified,
                            format!("union collapsed to its single member type {}", mapped.native_type),
                        );
                    }
                    field.mapped_type = Some(mapped);
                }
                Err(errors) => diagnostics.merge(errors),
            }
            let behaviour = ctx.config.compress_behaviour;
            if behaviour.compress_enabled() && !behaviour.state_excluded() {
                field.shadow_path = shadow_path(tree, child, &field.schema_path);
            }
        }
        FieldKind::Container | FieldKind::List => {
            field.directory = names.get(&tree.path_string(child)).cloned();
        }
        FieldKind::Anydata => {}
    }

    Some(field)
}

/// `config/x` -> `state/x` (and back) when the twin exists
fn shadow_path(tree: &SchemaTree, leaf: NodeId, schema_path: &str) -> Option<String> {
    let wrapper = tree.parent(leaf).filter(|&p| tree.is_config_state(p))?;
    let other = if tree.node(wrapper).name == "config" { "state" } else { "config" };
    let twin_wrapper = tree.child(tree.parent(wrapper)?, other)?;
    tree.child(twin_wrapper, &tree.node(leaf).name)?;

    let (_, rest) = schema_path.split_once('/')?;
    Some(format!("{}/{}", other, rest))
}
