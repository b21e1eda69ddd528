//! Fake Root
//!
//! Synthesizes one directory at `/` whose fields are every top-level entity
//! of every generated module, so that disjoint module roots can be handled
//! as a single tree.

use std::collections::BTreeMap;

use super::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use super::{is_excluded, DirectoryMap, MappedDirectory};
use crate::config::DEFAULT_FAKE_ROOT_NAME;
use crate::schema::{NodeId, SchemaTree};

/// Key of the fake root in the directory map
pub const FAKE_ROOT_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeRoot {
    pub name: String,
    /// Local name -> root entity
    pub fields: BTreeMap<String, NodeId>,
}

/// Insert the fake root into `dirs`.
///
/// Root entities are the directories directly under a module
/// (`/module/name`); under compression also lists one level deeper whose
/// surrounding container was elided. Leaves and leaf-lists at module level
/// come from `root_elems`. Two entities with the same local name are an
/// error; the map is left untouched in that case.
pub fn create_fake_root(
    tree: &SchemaTree,
    dirs: &mut DirectoryMap,
    root_elems: &[NodeId],
    root_name: &str,
    compress: bool,
) -> Result<(), Diagnostics> {
    let name = if root_name.trim().is_empty() {
        DEFAULT_FAKE_ROOT_NAME
    } else {
        root_name
    };

    let mut candidates: Vec<NodeId> = Vec::new();
    for (path, dir) in dirs.iter() {
        let MappedDirectory::Schema(id) = dir else {
            continue;
        };
        let segments: Vec<&str> = path.split('/').collect();
        let is_root_entity = match segments.len() {
            3 => true,
            4 if compress => {
                let parent = segments[..3].join("/");
                tree.node(*id).is_list() && !dirs.contains_key(&parent)
            }
            _ => false,
        };
        if is_root_entity {
            candidates.push(*id);
        }
    }
    candidates.extend(root_elems.iter().copied());

    let mut fields: BTreeMap<String, NodeId> = BTreeMap::new();
    let mut diagnostics = Diagnostics::new();
    for id in candidates {
        let local = tree.node(id).name.clone();
        if let Some(existing) = fields.get(&local) {
            diagnostics.push(
                DiagnosticItem::new(
                    FAKE_ROOT_PATH,
                    DiagnosticCode::DuplicateRootEntry,
                    format!("duplicate entry {} at the root", local),
                )
                .with_context(format!("first: {}", tree.path_string(*existing)))
                .with_context(format!("second: {}", tree.path_string(id))),
            );
            continue;
        }
        fields.insert(local, id);
    }

    let fake_root = diagnostics.into_result(FakeRoot {
        name: name.to_string(),
        fields,
    })?;

    tracing::debug!(name = %fake_root.name, fields = fake_root.fields.len(), "created fake root");
    dirs.insert(FAKE_ROOT_PATH.to_string(), MappedDirectory::FakeRoot(fake_root));
    Ok(())
}

/// Leaves and leaf-lists directly under the given module roots
/// (choice/case resolved through), excluded modules skipped
pub fn root_leaves(tree: &SchemaTree, roots: &[NodeId], exclude_modules: &[String]) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &root in roots {
        if is_excluded(tree, root, exclude_modules) {
            continue;
        }
        for child in tree.first_non_choice_or_case(root) {
            let node = tree.node(child);
            if (node.is_leaf() || node.is_leaf_list()) && !is_excluded(tree, child, exclude_modules) {
                out.push(child);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::find_mappable_entities;
    use crate::schema::{SchemaTreeBuilder, TypeDescriptor, TypeKind};

    #[test]
    fn test_duplicate_root_entry() {
        let mut b = SchemaTreeBuilder::new();
        let one = b.module("one", "urn:one", None);
        b.container(one, "foo");
        let two = b.module("two", "urn:two", None);
        b.container(two, "foo");
        let tree = b.build();

        let mut found = find_mappable_entities(&tree, &tree.generation_roots(), &[], false).unwrap();
        let before = found.directories.len();
        let err = create_fake_root(&tree, &mut found.directories, &[], "", false).unwrap_err();
        assert!(err.contains(DiagnosticCode::DuplicateRootEntry));
        assert!(err.to_string().contains("duplicate entry foo at the root"));
        assert_eq!(found.directories.len(), before);
    }

    #[test]
    fn test_fake_root_collects_dirs_and_leaves() {
        let mut b = SchemaTreeBuilder::new();
        let m = b.module("mod", "urn:mod", None);
        b.container(m, "system");
        let wrapper = b.container(m, "things");
        let list = b.list(wrapper, "thing", Some("id"));
        b.leaf(list, "id", TypeDescriptor::new(TypeKind::String));
        b.leaf(m, "hostname", TypeDescriptor::new(TypeKind::String));
        let tree = b.build();
        let roots = tree.generation_roots();

        let mut found = find_mappable_entities(&tree, &roots, &[], true).unwrap();
        let leaves = root_leaves(&tree, &roots, &[]);
        create_fake_root(&tree, &mut found.directories, &leaves, "", true).unwrap();

        let Some(MappedDirectory::FakeRoot(root)) = found.directories.get(FAKE_ROOT_PATH) else {
            panic!("fake root missing");
        };
        assert_eq!(root.name, "device");
        let names: Vec<_> = root.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["hostname", "system", "thing"]);
    }

    #[test]
    fn test_deep_lists_ignored_when_uncompressed() {
        let mut b = SchemaTreeBuilder::new();
        let m = b.module("mod", "urn:mod", None);
        let wrapper = b.container(m, "things");
        b.list(wrapper, "thing", Some("id"));
        let tree = b.build();

        let mut found = find_mappable_entities(&tree, &tree.generation_roots(), &[], false).unwrap();
        create_fake_root(&tree, &mut found.directories, &[], "root", false).unwrap();
        let Some(MappedDirectory::FakeRoot(root)) = found.directories.get(FAKE_ROOT_PATH) else {
            panic!("fake root missing");
        };
        assert_eq!(root.name, "root");
        assert_eq!(root.fields.keys().collect::<Vec<_>>(), vec!["things"]);
    }
}
