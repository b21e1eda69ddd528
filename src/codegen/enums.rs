//! Enumeration and Identity Deduplication
//!
//! Collects every enumeration and identityref member of every enum-bearing
//! leaf, groups the logically identical ones and gives each group a unique
//! name. Runs in two phases so that naming sees the complete set of groups:
//!
//! 1. grouping: typedefs by defining module + typedef name, identities by
//!    base module + base name, inline enumerations by their context
//! 2. naming: identities, then typedefs, then inline enumerations, all
//!    against the run's `NameRegistry`

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::names::{camel_case, module_qualified, NameRegistry};
use crate::mapping::{DiagnosticCode, Diagnostics};
use crate::schema::{NodeId, NodeKind, SchemaTree, TypeDescriptor, TypeKind};

// =============================================================================
// Enum Entities
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumKind {
    /// Inline `enumeration`
    Simple,
    /// Enumeration declared through a typedef
    Typedef,
    /// Identities derived from one base
    Identity,
}

/// One generated enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumEntity {
    pub name: String,
    pub kind: EnumKind,
    /// Module defining the typedef, the base identity, or the inline leaf
    pub module: String,
    pub values: Vec<String>,
    /// Leaf whose type defines the values
    #[serde(skip)]
    pub node: NodeId,
    pub representative_path: String,
    /// Every enum-bearing leaf that uses this entity, sorted
    pub leaf_paths: Vec<String>,
}

/// All enum entities of a run, with the lookups the type mapper needs
#[derive(Debug, Clone, Default)]
pub struct EnumSet {
    /// Name -> entity
    pub entities: BTreeMap<String, EnumEntity>,
    /// `module/base` -> name
    identity_names: BTreeMap<String, String>,
    /// `module/typedef` -> name
    typedef_names: BTreeMap<String, String>,
    /// Leaf data path -> name of its inline enumeration
    inline_names: BTreeMap<String, String>,
}

impl EnumSet {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity name for one enumerated `member` of the type of `leaf`
    pub fn name_for(&self, tree: &SchemaTree, leaf: NodeId, member: &TypeDescriptor) -> Option<&str> {
        let name = match member.kind {
            TypeKind::Identityref => {
                let identity = member.identity.as_ref()?;
                self.identity_names.get(&identity_key(&identity.module, &identity.base))
            }
            TypeKind::Enumeration => match &member.typedef {
                Some(typedef) => self.typedef_names.get(&typedef_key(&typedef.module, &typedef.name)),
                None => self.inline_names.get(&tree.path_string(leaf)),
            },
            _ => None,
        };
        name.map(String::as_str)
    }
}

fn identity_key(module: &str, base: &str) -> String {
    format!("{}/{}", module, base)
}

fn typedef_key(module: &str, name: &str) -> String {
    format!("{}/{}", module, name)
}

// =============================================================================
// Grouping
// =============================================================================

#[derive(Debug)]
struct Group {
    kind: EnumKind,
    module: String,
    /// Base identity or typedef name
    local: String,
    values: Vec<String>,
    node: NodeId,
    representative_path: String,
    /// Name segments below the module, config/state dropped when compressing
    context: Vec<String>,
    leaf_paths: BTreeSet<String>,
}

impl Group {
    fn new(kind: EnumKind, module: &str, local: &str, values: Vec<String>, leaf: NodeId, path: &str) -> Self {
        Self {
            kind,
            module: module.to_string(),
            local: local.to_string(),
            values,
            node: leaf,
            representative_path: path.to_string(),
            context: Vec::new(),
            leaf_paths: BTreeSet::new(),
        }
    }
}

#[derive(Default)]
struct Groups {
    identities: BTreeMap<String, Group>,
    typedefs: BTreeMap<String, Group>,
    inline: BTreeMap<String, Group>,
}

/// Name segments of `leaf` below its module root, the leaf itself last
fn context_segments(tree: &SchemaTree, leaf: NodeId, compress: bool) -> Vec<String> {
    let mut segments = vec![tree.node(leaf).name.clone()];
    let mut current = tree.data_parent(leaf);
    while let Some(parent) = current {
        if tree.node(parent).kind == NodeKind::Module {
            break;
        }
        if !(compress && tree.is_config_state(parent)) {
            segments.push(tree.node(parent).name.clone());
        }
        current = tree.data_parent(parent);
    }
    segments.reverse();
    segments
}

/// Grouping key of an inline enumeration.
///
/// Deduplicating: module, the nearest context segment above the leaf (the
/// direct parent uncompressed; config/state skipped when compressing), the
/// leaf name and the value set. With deduplication skipped, the leaf's full
/// context path.
fn inline_key(tree: &SchemaTree, leaf: NodeId, member: &TypeDescriptor, context: &[String], skip_dedup: bool) -> String {
    let node = tree.node(leaf);
    if skip_dedup {
        return format!("{}:/{}", tree.root_module(leaf), context.join("/"));
    }
    let parent = context
        .len()
        .checked_sub(2)
        .map(|i| context[i].as_str())
        .unwrap_or_default();
    let values: Vec<&str> = member.enum_values.iter().map(|v| v.name.as_str()).collect();
    format!("{}|{}|{}|{}", node.module, parent, node.name, values.join(","))
}

fn collect_groups(
    tree: &SchemaTree,
    enum_leaves: &BTreeMap<String, NodeId>,
    compress: bool,
    skip_dedup: bool,
    diagnostics: &mut Diagnostics,
) -> Groups {
    let mut groups = Groups::default();

    for (path, &leaf) in enum_leaves {
        let Some(ty) = tree.node(leaf).type_desc.as_ref() else {
            diagnostics.error(path, DiagnosticCode::MissingType, format!("enum-bearing leaf {} has no type", path));
            continue;
        };
        if ty.has_empty_union() {
            diagnostics.error(path, DiagnosticCode::EmptyUnion, format!("empty union in type of {}", path));
            continue;
        }

        let members = ty.enumerated_members();
        if members.iter().filter(|m| m.is_inline_enum()).count() > 1 {
            diagnostics.error(
                path,
                DiagnosticCode::MultipleInlineEnums,
                "multiple enumerated types within a single enumeration not supported",
            );
            continue;
        }

        for member in members {
            match (member.kind, &member.typedef) {
                (TypeKind::Identityref, _) => {
                    let Some(identity) = member.identity.as_ref().filter(|i| !i.base.is_empty()) else {
                        diagnostics.error(
                            path,
                            DiagnosticCode::MissingIdentityBase,
                            format!("identityref {} has no base identity", path),
                        );
                        continue;
                    };
                    let mut values: Vec<String> = Vec::new();
                    for v in &identity.values {
                        if !values.contains(v) {
                            values.push(v.clone());
                        }
                    }
                    groups
                        .identities
                        .entry(identity_key(&identity.module, &identity.base))
                        .or_insert_with(|| {
                            Group::new(EnumKind::Identity, &identity.module, &identity.base, values, leaf, path)
                        })
                        .leaf_paths
                        .insert(path.clone());
                }
                (TypeKind::Enumeration, Some(typedef)) => {
                    groups
                        .typedefs
                        .entry(typedef_key(&typedef.module, &typedef.name))
                        .or_insert_with(|| {
                            let values = member.enum_values.iter().map(|v| v.name.clone()).collect();
                            Group::new(EnumKind::Typedef, &typedef.module, &typedef.name, values, leaf, path)
                        })
                        .leaf_paths
                        .insert(path.clone());
                }
                _ => {
                    let context = context_segments(tree, leaf, compress);
                    let key = inline_key(tree, leaf, member, &context, skip_dedup);
                    let node = tree.node(leaf);
                    groups
                        .inline
                        .entry(key)
                        .or_insert_with(|| {
                            let values = member.enum_values.iter().map(|v| v.name.clone()).collect();
                            let mut group = Group::new(EnumKind::Simple, &node.module, &node.name, values, leaf, path);
                            group.context = context;
                            group
                        })
                        .leaf_paths
                        .insert(path.clone());
                }
            }
        }
    }

    groups
}

// =============================================================================
// Naming
// =============================================================================

/// Group and name every enumeration used by `enum_leaves`
pub fn find_enum_set(
    tree: &SchemaTree,
    enum_leaves: &BTreeMap<String, NodeId>,
    compress: bool,
    skip_dedup: bool,
    registry: &mut NameRegistry,
) -> Result<EnumSet, Diagnostics> {
    let mut diagnostics = Diagnostics::new();
    let groups = collect_groups(tree, enum_leaves, compress, skip_dedup, &mut diagnostics);

    let mut set = EnumSet::default();

    let identity_names = name_identities(&groups.identities, registry, &mut diagnostics);
    let typedef_names = name_typedefs(&groups.typedefs, registry);
    let inline_names = name_inline(&groups.inline, registry);

    for (key, group) in groups.identities {
        if let Some(name) = identity_names.get(&key) {
            set.identity_names.insert(key, name.clone());
            insert_entity(&mut set, name, group);
        }
    }
    for (key, group) in groups.typedefs {
        if let Some(name) = typedef_names.get(&key) {
            set.typedef_names.insert(key, name.clone());
            insert_entity(&mut set, name, group);
        }
    }
    for group in groups.inline.into_values() {
        if let Some(name) = inline_names.get(&group.representative_path) {
            for leaf_path in &group.leaf_paths {
                set.inline_names.insert(leaf_path.clone(), name.clone());
            }
            insert_entity(&mut set, name, group);
        }
    }

    tracing::debug!(
        entities = set.entities.len(),
        identities = set.identity_names.len(),
        typedefs = set.typedef_names.len(),
        skip_dedup,
        "named enumerations"
    );

    diagnostics.into_result(set)
}

fn insert_entity(set: &mut EnumSet, name: &str, group: Group) {
    set.entities.insert(
        name.to_string(),
        EnumEntity {
            name: name.to_string(),
            kind: group.kind,
            module: group.module,
            values: group.values,
            node: group.node,
            representative_path: group.representative_path,
            leaf_paths: group.leaf_paths.into_iter().collect(),
        },
    );
}

/// `<Module>_<Base>`; identity names are never suffixed
fn name_identities(
    identities: &BTreeMap<String, Group>,
    registry: &mut NameRegistry,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, String> {
    let mut by_candidate: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (key, group) in identities {
        let candidate = format!("{}_{}", camel_case(&group.module), camel_case(&group.local));
        by_candidate.entry(candidate).or_default().push(key);
    }

    let mut names = BTreeMap::new();
    for (candidate, keys) in by_candidate {
        if keys.len() > 1 {
            diagnostics.error(
                keys.join(", "),
                DiagnosticCode::IdentityNameConflict,
                format!("identities {} all map to the name {}", keys.join(", "), candidate),
            );
            continue;
        }
        if !registry.insert(candidate.clone()) {
            diagnostics.error(
                keys[0],
                DiagnosticCode::IdentityNameConflict,
                format!("identity {} maps to the name {} which is already defined", keys[0], candidate),
            );
            continue;
        }
        names.insert(keys[0].to_string(), candidate);
    }
    names
}

/// `<Module>_<Typedef>`, clashes resolved by suffixing
fn name_typedefs(typedefs: &BTreeMap<String, Group>, registry: &mut NameRegistry) -> BTreeMap<String, String> {
    let mut clashes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, group) in typedefs {
        let candidate = format!("{}_{}", camel_case(&group.module), camel_case(&group.local));
        clashes.entry(candidate).or_default().insert(key.clone());
    }
    registry.resolve_name_clash_set(&clashes)
}

/// A group still looking for a name
struct Pending<'a> {
    group: &'a Group,
    /// Number of trailing context segments in the candidate
    level: usize,
}

impl Pending<'_> {
    fn candidate(&self) -> String {
        let context = &self.group.context;
        module_qualified(&self.group.module, &context[context.len() - self.level..])
    }

    fn exhausted(&self) -> bool {
        self.level >= self.group.context.len()
    }
}

/// Shortest unique `<Module>_<Ctx..>_<Leaf>`, keyed by representative path.
///
/// Every group starts at parent + leaf. Groups whose candidate collides
/// (with each other or with a registered name) grow by one ancestor segment
/// per round; groups colliding at full length go through
/// `resolve_name_clash_set`.
fn name_inline(inline: &BTreeMap<String, Group>, registry: &mut NameRegistry) -> BTreeMap<String, String> {
    let mut pending: Vec<Pending<'_>> = inline
        .values()
        .map(|group| Pending {
            group,
            level: group.context.len().min(2),
        })
        .collect();

    let mut names = BTreeMap::new();
    let mut exhausted: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    while !pending.is_empty() {
        let mut by_candidate: BTreeMap<String, Vec<Pending<'_>>> = BTreeMap::new();
        for p in pending {
            by_candidate.entry(p.candidate()).or_default().push(p);
        }

        let mut next = Vec::new();
        for (candidate, members) in by_candidate {
            let clash = members.len() > 1 || registry.contains(&candidate);
            for mut p in members {
                if !clash {
                    registry.insert(candidate.clone());
                    names.insert(p.group.representative_path.clone(), candidate.clone());
                } else if p.exhausted() {
                    exhausted
                        .entry(candidate.clone())
                        .or_default()
                        .insert(p.group.representative_path.clone());
                } else {
                    p.level += 1;
                    next.push(p);
                }
            }
        }
        pending = next;
    }

    names.extend(registry.resolve_name_clash_set(&exhausted));
    names
}
