//! Compressed-Child Resolution
//!
//! Computes the field set of one directory node. Without compression the
//! fields are the node's children with choice/case transparently replaced by
//! their first non-choice/case descendants. With compression, the
//! `config`/`state` wrappers are merged up into the node and a container
//! that only holds a list is replaced by that list.

use std::collections::BTreeMap;

use super::diagnostics::Diagnostics;
use crate::config::CompressBehaviour;
use crate::schema::{NodeId, SchemaTree, TypeKind};

/// Where a field came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// A child of the node itself (or of a choice/case under it)
    Direct,
    /// A child of a merged `config`/`state` wrapper
    Wrapper,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    node: NodeId,
    source: Source,
}

/// Field name -> node for the directory rooted at `node`.
///
/// Duplicate field names from two direct sources are collected as errors;
/// the map is only returned when there are none.
pub fn find_all_children(
    tree: &SchemaTree,
    node: NodeId,
    behaviour: CompressBehaviour,
) -> Result<BTreeMap<String, NodeId>, Diagnostics> {
    let exclude_state = behaviour.state_excluded();
    if exclude_state && !tree.is_config(node) {
        return Ok(BTreeMap::new());
    }

    let mut resolver = ChildResolver {
        tree,
        dir: node,
        exclude_state,
        fields: BTreeMap::new(),
        diagnostics: Diagnostics::new(),
    };

    if behaviour.compress_enabled() {
        resolver.compressed(behaviour.preferred_wrapper());
    } else {
        resolver.uncompressed();
    }

    let ChildResolver { fields, diagnostics, .. } = resolver;
    let fields = fields.into_iter().map(|(name, e)| (name, e.node)).collect();
    diagnostics.into_result(fields)
}

struct ChildResolver<'a> {
    tree: &'a SchemaTree,
    dir: NodeId,
    exclude_state: bool,
    fields: BTreeMap<String, Entry>,
    diagnostics: Diagnostics,
}

impl ChildResolver<'_> {
    fn uncompressed(&mut self) {
        let children: Vec<NodeId> = self.tree.children(self.dir).collect();
        for child in children {
            self.add_resolving_choice(child, Source::Direct);
        }
    }

    fn compressed(&mut self, preferred: &str) {
        let tree = self.tree;
        let preferred_id = tree
            .child(self.dir, preferred)
            .filter(|&id| tree.is_config_state(id));

        if let Some(wrapper) = preferred_id {
            self.merge_wrapper(wrapper);
        }

        let children: Vec<NodeId> = tree.children(self.dir).collect();
        for child in children {
            if Some(child) == preferred_id {
                continue;
            }
            if tree.is_config_state(child) {
                self.merge_wrapper(child);
            } else if let Some(list) = tree.wrapped_list(child) {
                self.add(list, Source::Direct);
            } else if self.is_own_leafref_key(child) {
                tracing::debug!(
                    key = %tree.node(child).name,
                    list = %tree.path_string(self.dir),
                    "leafref key omitted from list fields"
                );
            } else {
                self.add_resolving_choice(child, Source::Direct);
            }
        }
    }

    fn merge_wrapper(&mut self, wrapper: NodeId) {
        if self.exclude_state && !self.tree.is_config(wrapper) {
            return;
        }
        let children: Vec<NodeId> = self.tree.children(wrapper).collect();
        for child in children {
            match self.tree.wrapped_list(child) {
                Some(list) => self.add(list, Source::Wrapper),
                None => self.add_resolving_choice(child, Source::Wrapper),
            }
        }
    }

    fn add_resolving_choice(&mut self, child: NodeId, source: Source) {
        if self.tree.node(child).is_choice_or_case() {
            for descendant in self.tree.first_non_choice_or_case(child) {
                self.add(descendant, source);
            }
        } else {
            self.add(child, source);
        }
    }

    fn add(&mut self, child: NodeId, source: Source) {
        if self.exclude_state && !self.tree.is_config(child) {
            return;
        }

        let name = self.tree.node(child).name.clone();
        match self.fields.get(&name) {
            None => {
                self.fields.insert(name, Entry { node: child, source });
            }
            Some(existing) => match (existing.source, source) {
                (Source::Direct, Source::Direct) => {
                    let dir_path = self.tree.path_string(self.dir);
                    let first = self.tree.schema_path(existing.node).join("/");
                    let second = self.tree.schema_path(child).join("/");
                    self.diagnostics.duplicate_field(&dir_path, &name, &first, &second);
                }
                // first one in wins; the preferred wrapper is merged first
                _ => {
                    tracing::debug!(
                        field = %name,
                        dropped = %self.tree.schema_path(child).join("/"),
                        "duplicate field dropped"
                    );
                }
            },
        }
    }

    /// A leafref leaf named as a key of this config-true list
    fn is_own_leafref_key(&self, child: NodeId) -> bool {
        let dir = self.tree.node(self.dir);
        let node = self.tree.node(child);
        dir.is_list()
            && self.tree.is_config(self.dir)
            && node.is_leaf()
            && dir.key_names().contains(&node.name.as_str())
            && node
                .type_desc
                .as_ref()
                .map(|t| t.kind == TypeKind::Leafref)
                .unwrap_or(false)
    }
}
