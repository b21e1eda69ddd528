//! List Key Resolution

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;
use std::collections::BTreeMap;

use super::types::{MappedType, TypeResolver};
use crate::mapping::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::schema::index::{strip_module_prefix, strip_predicates};
use crate::schema::{NodeId, SchemaTree, TypeKind};

/// Keys of one list directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListKeyInfo {
    /// Declared key names, in declaration order
    pub keys: Vec<String>,
    pub key_types: BTreeMap<String, MappedType>,
    /// Leaf supplying each key's type, after leafref redirection
    #[serde(skip)]
    pub key_nodes: BTreeMap<String, NodeId>,
    /// Data path of each key's supplying leaf
    pub key_paths: BTreeMap<String, String>,
}

/// Resolve the keys of `list`.
///
/// `Ok(None)` for a keyless read-only list. Under compression a leafref key
/// is redirected into the `config`/`state` sibling named by the last two
/// segments of its path; if that fails the error is recorded and the
/// literal key leaf is used.
pub fn resolve_list_key(
    tree: &SchemaTree,
    list: NodeId,
    compress: bool,
    resolver: &TypeResolver<'_>,
    owner: &str,
) -> Result<Option<ListKeyInfo>, Diagnostics> {
    let mut diagnostics = Diagnostics::new();
    let path = tree.path_string(list);
    let node = tree.node(list);

    if !node.is_list() {
        diagnostics.error(
            &path,
            DiagnosticCode::NotAList,
            format!("{} is a {}, not a list", path, node.kind.as_str()),
        );
        return Err(diagnostics);
    }

    let names = node.key_names();
    if names.is_empty() {
        if tree.is_config(list) {
            diagnostics.error(
                &path,
                DiagnosticCode::MissingListKey,
                format!("list {} is config true but has no key", path),
            );
            return Err(diagnostics);
        }
        return Ok(None);
    }

    let mut info = ListKeyInfo {
        keys: names.iter().map(|k| k.to_string()).collect(),
        key_types: BTreeMap::new(),
        key_nodes: BTreeMap::new(),
        key_paths: BTreeMap::new(),
    };

    for key in names {
        let Some(key_leaf) = tree.child(list, key) else {
            let mut item = DiagnosticItem::new(
                &path,
                DiagnosticCode::UnknownListKey,
                format!("key {} is not a child of list {}", key, path),
            );
            if let Some(hint) = closest_child(tree, list, key) {
                item = item.with_context(format!("did you mean '{}'?", hint));
            }
            diagnostics.push(item);
            continue;
        };

        let effective = if compress && is_leafref(tree, key_leaf) {
            match redirect_leafref_key(tree, list, key_leaf) {
                Some(target) => target,
                None => {
                    diagnostics.error(
                        &path,
                        DiagnosticCode::UnresolvedKeyLeafref,
                        format!("could not resolve leafref key {} of list {}", key, path),
                    );
                    key_leaf
                }
            }
        } else {
            key_leaf
        };

        match resolver.leaf_type(effective, owner) {
            Ok(mapped) => {
                info.key_types.insert(key.to_string(), mapped);
            }
            Err(errors) => diagnostics.merge(errors),
        }
        info.key_nodes.insert(key.to_string(), effective);
        info.key_paths.insert(key.to_string(), tree.path_string(effective));
    }

    diagnostics.into_result(Some(info))
}

fn is_leafref(tree: &SchemaTree, leaf: NodeId) -> bool {
    tree.node(leaf)
        .type_desc
        .as_ref()
        .map(|t| t.kind == TypeKind::Leafref)
        .unwrap_or(false)
}

/// `../config/name` -> the `name` leaf inside the list's `config` child
fn redirect_leafref_key(tree: &SchemaTree, list: NodeId, key_leaf: NodeId) -> Option<NodeId> {
    let path = tree.node(key_leaf).type_desc.as_ref()?.path.as_deref()?;
    let cleaned = strip_predicates(path);
    let segments: Vec<&str> = cleaned.split('/').filter(|s| !s.is_empty()).collect();
    let [.., dir, leaf] = segments.as_slice() else {
        return None;
    };
    let container = tree.child(list, strip_module_prefix(dir))?;
    tree.child(container, strip_module_prefix(leaf))
}

/// Closest child name of `list` to `key`, for error hints
fn closest_child(tree: &SchemaTree, list: NodeId, key: &str) -> Option<String> {
    let matcher = SkimMatcherV2::default();
    let mut best: Option<(i64, String)> = None;
    for child in tree.children(list) {
        let name = &tree.node(child).name;
        let score = matcher
            .fuzzy_match(name, key)
            .into_iter()
            .chain(matcher.fuzzy_match(key, name))
            .max();
        if let Some(score) = score {
            if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, name.clone()));
            }
        }
    }
    best.map(|(_, name)| name)
}
