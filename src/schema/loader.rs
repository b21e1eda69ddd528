//! Schema Loader
//!
//! Loads JSON module documents (the parser's output format) into a
//! `SchemaTree`. Imports are resolved by file name (`<module>.json`) under
//! the search paths and the importing file's own directory; modules loaded
//! only to satisfy an import are marked `imported_only`.
//!
//! Failures are classified as file-not-found, syntax or unresolved
//! reference, matching the upstream parser's error categories.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ModuleInfo, NodeId, NodeKind, SchemaNode, SchemaTree, SchemaTreeBuilder, TypeDescriptor};
use crate::error::{Result, YgenError};

// =============================================================================
// Documents
// =============================================================================

/// One module as written by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDoc {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub prefix: Option<String>,
    /// Modules this one needs for leafref and identity resolution
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub children: Vec<NodeDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<NodeDoc>,
    #[serde(default, rename = "type")]
    pub type_desc: Option<TypeDescriptor>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub config: Option<bool>,
    /// Defining module when it differs from the enclosing one (augments)
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
}

struct LoadedDoc {
    doc: ModuleDoc,
    path: PathBuf,
    imported_only: bool,
}

// =============================================================================
// Loading
// =============================================================================

/// Load `files` and, transitively, every module they import
pub fn load_modules<P: AsRef<Path>>(files: &[P], search_paths: &[PathBuf]) -> Result<SchemaTree> {
    let mut loaded: BTreeMap<String, LoadedDoc> = BTreeMap::new();
    let mut queue: VecDeque<(String, PathBuf)> = VecDeque::new();

    for file in files {
        let path = file.as_ref().to_path_buf();
        let doc = read_module(&path)?;
        if loaded.contains_key(&doc.name) {
            return Err(YgenError::Syntax {
                path,
                message: format!("module {} is defined more than once", doc.name),
            });
        }
        queue_imports(&doc, &path, &mut queue);
        loaded.insert(
            doc.name.clone(),
            LoadedDoc {
                doc,
                path,
                imported_only: false,
            },
        );
    }

    while let Some((import, importer)) = queue.pop_front() {
        if loaded.contains_key(&import) {
            continue;
        }
        let Some(path) = find_import(&import, &importer, search_paths) else {
            let module = module_name_of(&loaded, &importer);
            return Err(YgenError::UnresolvedReference {
                module,
                reference: import,
            });
        };
        let doc = read_module(&path)?;
        if doc.name != import {
            return Err(YgenError::Syntax {
                path,
                message: format!("expected module {}, found {}", import, doc.name),
            });
        }
        tracing::debug!(module = %import, path = %path.display(), "loaded import");
        queue_imports(&doc, &path, &mut queue);
        loaded.insert(
            import,
            LoadedDoc {
                doc,
                path,
                imported_only: true,
            },
        );
    }

    let mut builder = SchemaTreeBuilder::new();
    for entry in loaded.values() {
        let root = builder.add_module(ModuleInfo {
            name: entry.doc.name.clone(),
            namespace: entry.doc.namespace.clone(),
            prefix: entry.doc.prefix.clone(),
            imported_only: entry.imported_only,
        });
        for child in &entry.doc.children {
            add_node(&mut builder, &loaded, entry, root, &entry.doc.name, child)?;
        }
    }

    let tree = builder.build();
    tracing::info!(
        modules = loaded.len(),
        nodes = tree.node_count(),
        "loaded schema modules"
    );
    Ok(tree)
}

fn read_module(path: &Path) -> Result<ModuleDoc> {
    if !path.is_file() {
        return Err(YgenError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| YgenError::Syntax {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn queue_imports(doc: &ModuleDoc, path: &Path, queue: &mut VecDeque<(String, PathBuf)>) {
    for import in &doc.imports {
        queue.push_back((import.clone(), path.to_path_buf()));
    }
}

fn module_name_of(loaded: &BTreeMap<String, LoadedDoc>, path: &Path) -> String {
    loaded
        .values()
        .find(|e| e.path == path)
        .map(|e| e.doc.name.clone())
        .unwrap_or_else(|| path.display().to_string())
}

/// `<module>.json` next to the importer, then under each search path
fn find_import(module: &str, importer: &Path, search_paths: &[PathBuf]) -> Option<PathBuf> {
    let file_name = format!("{}.json", module);

    if let Some(sibling) = importer.parent().map(|dir| dir.join(&file_name)) {
        if sibling.is_file() {
            return Some(sibling);
        }
    }

    search_paths.iter().find_map(|dir| {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(search_path = %dir.display(), error = %err, "skipping unreadable entry");
                    None
                }
            })
            .find(|e| e.file_type().is_file() && e.file_name().to_str() == Some(file_name.as_str()))
            .map(|e| e.into_path())
    })
}

fn add_node(
    builder: &mut SchemaTreeBuilder,
    loaded: &BTreeMap<String, LoadedDoc>,
    entry: &LoadedDoc,
    parent: NodeId,
    parent_module: &str,
    doc: &NodeDoc,
) -> Result<()> {
    let module = doc.module.as_deref().unwrap_or(parent_module);
    if !loaded.contains_key(module) {
        return Err(YgenError::UnresolvedReference {
            module: entry.doc.name.clone(),
            reference: module.to_string(),
        });
    }

    let mut node = SchemaNode::new(&doc.name, doc.kind, module);
    node.type_desc = doc.type_desc.clone();
    node.key = doc.key.clone();
    node.config = doc.config.into();
    node.default = doc.default.clone();

    let id = builder.try_add(parent, node).map_err(|dup| YgenError::Syntax {
        path: entry.path.clone(),
        message: format!("duplicate node {} under {}", dup.name, dup.parent),
    })?;

    for child in &doc.children {
        add_node(builder, loaded, entry, id, module, child)?;
    }
    Ok(())
}
