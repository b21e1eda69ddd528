//! Schema Tree Index
//!
//! Leaf and leaf-list lookup by data path, built once per generation run.
//! Leafref paths are normalised (predicates and prefixes stripped, relative
//! steps applied) into data paths and looked up here.

use petgraph::visit::Dfs;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::{NodeId, SchemaTree, TypeKind};

/// Leafref chains longer than this are treated as unresolvable
const MAX_LEAFREF_DEPTH: usize = 32;

fn predicate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("static regex"))
}

/// Remove `[...]` predicates from a path expression
pub fn strip_predicates(path: &str) -> String {
    predicate_regex().replace_all(path, "").into_owned()
}

/// `pfx:name` -> (`Some("pfx")`, `"name"`)
pub fn split_prefix(segment: &str) -> (Option<&str>, &str) {
    match segment.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, segment),
    }
}

/// `pfx:name` -> `name`
pub fn strip_module_prefix(segment: &str) -> &str {
    split_prefix(segment).1
}

#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    /// Data path -> leaf or leaf-list
    leaves: HashMap<String, NodeId>,
    /// Module prefix -> module name
    prefixes: HashMap<String, String>,
}

impl SchemaIndex {
    /// Index every leaf and leaf-list of every loaded module
    pub fn build(tree: &SchemaTree) -> Self {
        let mut leaves = HashMap::new();
        for root in tree.all_roots() {
            let mut dfs = Dfs::new(&tree.graph, root);
            while let Some(id) = dfs.next(&tree.graph) {
                let node = tree.node(id);
                if node.is_leaf() || node.is_leaf_list() {
                    leaves.insert(tree.path_string(id), id);
                }
            }
        }

        let prefixes = tree
            .modules()
            .filter_map(|m| m.prefix.clone().map(|p| (p, m.name.clone())))
            .collect();

        tracing::debug!(leaves = leaves.len(), "built schema tree index");
        Self { leaves, prefixes }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Look up a leaf by data path (`/module/a/b`)
    pub fn leaf(&self, path: &str) -> Option<NodeId> {
        self.leaves.get(path).copied()
    }

    pub fn module_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Turn a leafref path into the data path it points at, relative to `context`
    pub fn target_path(&self, tree: &SchemaTree, context: NodeId, path: &str) -> Option<String> {
        let cleaned = strip_predicates(path);
        let cleaned = cleaned.trim();

        if let Some(absolute) = cleaned.strip_prefix('/') {
            let mut parts = absolute.split('/').filter(|s| !s.is_empty());
            let first = parts.next()?;
            let (prefix, name) = split_prefix(first);
            let module = match prefix {
                Some(p) => self
                    .module_for_prefix(p)
                    .map(str::to_string)
                    .unwrap_or_else(|| p.to_string()),
                None => tree.root_module(context),
            };
            let mut segments = vec![String::new(), module, name.to_string()];
            segments.extend(parts.map(|s| strip_module_prefix(s).to_string()));
            return Some(segments.join("/"));
        }

        let mut segments = tree.data_path(context);
        for step in cleaned.split('/').filter(|s| !s.is_empty()) {
            match step.trim() {
                "." => {}
                ".." => {
                    // never climb above ["", module]
                    if segments.len() <= 2 {
                        return None;
                    }
                    segments.pop();
                }
                other => segments.push(strip_module_prefix(other).to_string()),
            }
        }
        Some(segments.join("/"))
    }

    /// Resolve a leafref path to the leaf it names
    pub fn resolve_leafref(&self, tree: &SchemaTree, context: NodeId, path: &str) -> Option<NodeId> {
        let target = self.target_path(tree, context, path)?;
        self.leaf(&target)
    }

    /// Follow a leafref, and any leafref it points at, to a non-leafref leaf
    pub fn resolve_leafref_chain(&self, tree: &SchemaTree, context: NodeId, path: &str) -> Option<NodeId> {
        let mut target = self.resolve_leafref(tree, context, path)?;
        for _ in 0..MAX_LEAFREF_DEPTH {
            let next_path = match tree.node(target).type_desc.as_ref() {
                Some(ty) if ty.kind == TypeKind::Leafref => ty.path.clone()?,
                _ => return Some(target),
            };
            target = self.resolve_leafref(tree, target, &next_path)?;
        }
        None
    }
}
