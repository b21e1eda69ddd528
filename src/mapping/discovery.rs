//! Entity Discovery
//!
//! Recursive descent over every module root, classifying each node as a
//! directory (container/list that becomes a generated type), an
//! enum-bearing leaf, or something elided (choice/case, compressed-out
//! config/state wrappers and list-surrounding containers, anydata).

use std::collections::BTreeMap;

use super::diagnostics::{DiagnosticCode, Diagnostics};
use super::{is_excluded, DirectoryMap, MappedDirectory};
use crate::schema::{NodeId, NodeKind, SchemaIndex, SchemaTree, TypeDescriptor, TypeKind};

/// Output of discovery: both maps are keyed by data path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappableEntities {
    pub directories: DirectoryMap,
    pub enum_leaves: BTreeMap<String, NodeId>,
}

/// Walk `roots` and record directories and enum-bearing leaves.
///
/// Errors (unknown node kinds) are collected across the whole walk and
/// returned together.
pub fn find_mappable_entities(
    tree: &SchemaTree,
    roots: &[NodeId],
    exclude_modules: &[String],
    compress: bool,
) -> Result<MappableEntities, Diagnostics> {
    let mut walker = Walker {
        tree,
        exclude_modules,
        compress,
        out: MappableEntities::default(),
        diagnostics: Diagnostics::new(),
    };

    for &root in roots {
        if is_excluded(tree, root, exclude_modules) {
            tracing::debug!(module = %tree.node(root).name, "skipping excluded module");
            continue;
        }
        walker.walk(root);
    }

    tracing::debug!(
        directories = walker.out.directories.len(),
        enum_leaves = walker.out.enum_leaves.len(),
        compress,
        "discovered mappable entities"
    );

    let Walker { out, diagnostics, .. } = walker;
    diagnostics.into_result(out)
}

struct Walker<'a> {
    tree: &'a SchemaTree,
    exclude_modules: &'a [String],
    compress: bool,
    out: MappableEntities,
    diagnostics: Diagnostics,
}

impl Walker<'_> {
    fn walk(&mut self, node: NodeId) {
        let children: Vec<NodeId> = self.tree.children(node).collect();
        for child in children {
            if is_excluded(self.tree, child, self.exclude_modules) {
                continue;
            }
            self.visit(child);
        }
    }

    fn visit(&mut self, child: NodeId) {
        let tree = self.tree;
        let node = tree.node(child);

        match node.kind {
            NodeKind::Leaf | NodeKind::LeafList => self.check_enum(child),
            NodeKind::Container if self.compress && tree.is_config_state(child) => self.walk(child),
            NodeKind::Container if self.compress && tree.is_list_wrapper(child) => self.walk(child),
            NodeKind::Choice | NodeKind::Case => {
                for descendant in tree.first_non_choice_or_case(child) {
                    if is_excluded(tree, descendant, self.exclude_modules) {
                        continue;
                    }
                    self.visit_choice_descendant(descendant);
                }
            }
            NodeKind::Container | NodeKind::List => {
                self.record_directory(child);
                self.walk(child);
            }
            NodeKind::Anydata => {}
            NodeKind::Module | NodeKind::Unknown => {
                self.diagnostics.error(
                    tree.path_string(child),
                    DiagnosticCode::UnknownNodeKind,
                    format!(
                        "unknown type of entry {} in find_mappable_entities for {}",
                        node.kind.as_str(),
                        tree.path_string(child)
                    ),
                );
            }
        }
    }

    /// Descendants of a choice are never elided as wrappers; the field set of
    /// the enclosing directory refers to them directly.
    fn visit_choice_descendant(&mut self, descendant: NodeId) {
        let node = self.tree.node(descendant);
        match node.kind {
            NodeKind::Leaf | NodeKind::LeafList => self.check_enum(descendant),
            NodeKind::Container | NodeKind::List => {
                self.record_directory(descendant);
                self.walk(descendant);
            }
            NodeKind::Anydata => {}
            _ => self.visit(descendant),
        }
    }

    fn record_directory(&mut self, id: NodeId) {
        self.out
            .directories
            .insert(self.tree.path_string(id), MappedDirectory::Schema(id));
    }

    fn check_enum(&mut self, id: NodeId) {
        let is_enum = self
            .tree
            .node(id)
            .type_desc
            .as_ref()
            .map(|t| t.contains_enumerated())
            .unwrap_or(false);
        if is_enum {
            self.out.enum_leaves.insert(self.tree.path_string(id), id);
        }
    }
}

/// Add the enum-bearing targets of every leafref under `roots` to
/// `enum_leaves`.
///
/// Targets may live anywhere in the tree, imported-only modules included;
/// they only gain an enumeration entity, never a directory.
pub fn add_leafref_enum_targets(
    tree: &SchemaTree,
    index: &SchemaIndex,
    roots: &[NodeId],
    exclude_modules: &[String],
    enum_leaves: &mut BTreeMap<String, NodeId>,
) {
    let mut stack: Vec<NodeId> = roots
        .iter()
        .copied()
        .filter(|&root| !is_excluded(tree, root, exclude_modules))
        .collect();
    let mut added = 0;

    while let Some(id) = stack.pop() {
        let node = tree.node(id);
        if node.is_leaf() || node.is_leaf_list() {
            let Some(ty) = node.type_desc.as_ref() else {
                continue;
            };
            for path in leafref_paths(ty) {
                let Some(target) = index.resolve_leafref_chain(tree, id, path) else {
                    continue;
                };
                let is_enum = tree
                    .node(target)
                    .type_desc
                    .as_ref()
                    .map(|t| t.contains_enumerated())
                    .unwrap_or(false);
                if is_enum && enum_leaves.insert(tree.path_string(target), target).is_none() {
                    added += 1;
                }
            }
            continue;
        }
        stack.extend(
            tree.children(id)
                .filter(|&child| !is_excluded(tree, child, exclude_modules)),
        );
    }

    if added > 0 {
        tracing::debug!(added, "added enum-bearing leafref targets");
    }
}

/// Leafref paths of `ty`, union members included
fn leafref_paths(ty: &TypeDescriptor) -> Vec<&str> {
    match ty.kind {
        TypeKind::Leafref => ty.path.as_deref().into_iter().collect(),
        TypeKind::Union => ty.union_types.iter().flat_map(leafref_paths).collect(),
        _ => Vec::new(),
    }
}
