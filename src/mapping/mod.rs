//! Structural Mapping
//!
//! Decides which schema nodes become generated types ("directories") and
//! which fields each of them carries:
//!
//! - `discovery`: walk the tree, record directories and enum-bearing leaves
//! - `children`: compute the (optionally compressed) field set of a directory
//! - `fake_root`: synthesize one root directory over all top-level entities
//! - `diagnostics`: collect-all error reporting shared by every pass
//!
//! These passes are type-agnostic; type mapping lives in `codegen`.

pub mod children;
pub mod diagnostics;
pub mod discovery;
pub mod fake_root;

pub use children::find_all_children;
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use discovery::{add_leafref_enum_targets, find_mappable_entities, MappableEntities};
pub use fake_root::{create_fake_root, root_leaves, FakeRoot, FAKE_ROOT_PATH};

use std::collections::BTreeMap;

use crate::schema::{NodeId, SchemaTree};

/// Where a directory comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedDirectory {
    /// A container or list in the schema
    Schema(NodeId),
    /// The synthesized root
    FakeRoot(FakeRoot),
}

/// Directory data path -> directory, iterated in path order
pub type DirectoryMap = BTreeMap<String, MappedDirectory>;

/// Is `node` defined by a module the caller asked us to skip?
///
/// Matches by module name AND namespace: an excluded name only applies to
/// nodes whose defining module carries that module's namespace.
pub fn is_excluded(tree: &SchemaTree, node: NodeId, exclude_modules: &[String]) -> bool {
    if exclude_modules.is_empty() {
        return false;
    }
    let Some(namespace) = tree.namespace_of(node) else {
        return false;
    };
    exclude_modules.iter().any(|name| {
        tree.module(name)
            .map(|m| m.namespace == namespace)
            .unwrap_or(false)
    })
}
