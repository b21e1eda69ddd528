//! Schema Tree
//!
//! Arena storage for the parsed schema tree handed over by the parser.
//! Nodes live in a petgraph `DiGraph` with parent -> child edges, so the
//! parent of a node is its single incoming neighbour. The mapping passes
//! only ever read the tree.
//!
//! Paths come in two flavours:
//! - schema paths include every ancestor, choices and cases included
//! - data paths skip choice/case nodes; they are what directories and
//!   enum-bearing leaves are keyed by (`/module/container/leaf`)

pub mod builder;
pub mod index;
pub mod loader;
pub mod types;

pub use builder::SchemaTreeBuilder;
pub use index::SchemaIndex;
pub use loader::{load_modules, ModuleDoc, NodeDoc};
pub use types::{EnumValue, IdentityRef, TypeDescriptor, TypeKind, TypedefRef};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a node in the schema arena
pub type NodeId = NodeIndex;

// =============================================================================
// Node Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Module,
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Anydata,
    /// Statement kinds the mapping passes do not understand (rpc, notification, ...)
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Container => "container",
            Self::List => "list",
            Self::Leaf => "leaf",
            Self::LeafList => "leaf-list",
            Self::Choice => "choice",
            Self::Case => "case",
            Self::Anydata => "anydata",
            Self::Unknown => "unknown",
        }
    }
}

/// Tri-state config flag; `Inherit` takes the parent's effective value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFlag {
    True,
    False,
    #[default]
    Inherit,
}

impl From<Option<bool>> for ConfigFlag {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::True,
            Some(false) => Self::False,
            None => Self::Inherit,
        }
    }
}

// =============================================================================
// Schema Node
// =============================================================================

#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub name: String,
    pub kind: NodeKind,
    /// Child name -> node, iterated in name order
    pub children: BTreeMap<String, NodeId>,
    pub type_desc: Option<TypeDescriptor>,
    /// Space-separated key leaf names (lists only)
    pub key: Option<String>,
    pub config: ConfigFlag,
    /// Module the node was defined in (differs from the root module for augments)
    pub module: String,
    pub default: Option<String>,
}

impl SchemaNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            children: BTreeMap::new(),
            type_desc: None,
            key: None,
            config: ConfigFlag::Inherit,
            module: module.into(),
            default: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn is_leaf_list(&self) -> bool {
        self.kind == NodeKind::LeafList
    }

    pub fn is_list(&self) -> bool {
        self.kind == NodeKind::List
    }

    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }

    /// Containers and lists become directories
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Container | NodeKind::List)
    }

    pub fn is_choice_or_case(&self) -> bool {
        matches!(self.kind, NodeKind::Choice | NodeKind::Case)
    }

    /// Declared key names, in declaration order
    pub fn key_names(&self) -> Vec<&str> {
        self.key
            .as_deref()
            .map(|k| k.split_whitespace().collect())
            .unwrap_or_default()
    }
}

// =============================================================================
// Module Info
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub namespace: String,
    pub prefix: Option<String>,
    /// Loaded only to satisfy an import; indexed but never a generation root
    pub imported_only: bool,
}

// =============================================================================
// Schema Tree
// =============================================================================

/// The parsed schema, read-only once built
#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    pub(crate) graph: DiGraph<SchemaNode, ()>,
    pub(crate) modules: BTreeMap<String, ModuleInfo>,
    /// Module name -> module root node
    pub(crate) roots: BTreeMap<String, NodeId>,
}

impl SchemaTree {
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.graph[id]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.graph.neighbors_directed(id, Direction::Incoming).next()
    }

    /// Children in name order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph[id].children.values().copied()
    }

    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.graph[id].children.get(name).copied()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values()
    }

    pub fn root(&self, module: &str) -> Option<NodeId> {
        self.roots.get(module).copied()
    }

    /// Roots of every module that was asked for (not just imported)
    pub fn generation_roots(&self) -> Vec<NodeId> {
        self.roots
            .iter()
            .filter(|(name, _)| {
                self.modules
                    .get(name.as_str())
                    .map(|m| !m.imported_only)
                    .unwrap_or(true)
            })
            .map(|(_, id)| *id)
            .collect()
    }

    /// All module roots, imported ones included
    pub fn all_roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.values().copied()
    }

    /// Namespace of the module a node was defined in
    pub fn namespace_of(&self, id: NodeId) -> Option<&str> {
        self.modules
            .get(&self.graph[id].module)
            .map(|m| m.namespace.as_str())
    }

    /// Effective config value, inherited from the closest explicit ancestor
    pub fn is_config(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.graph[node].config {
                ConfigFlag::True => return true,
                ConfigFlag::False => return false,
                ConfigFlag::Inherit => current = self.parent(node),
            }
        }
        true
    }

    /// A `config` or `state` container
    pub fn is_config_state(&self, id: NodeId) -> bool {
        let node = &self.graph[id];
        node.is_container() && (node.name == "config" || node.name == "state")
    }

    /// A container whose one and only child is a list
    pub fn is_list_wrapper(&self, id: NodeId) -> bool {
        let node = &self.graph[id];
        node.is_container()
            && node.children.len() == 1
            && self
                .children(id)
                .next()
                .map(|c| self.graph[c].is_list())
                .unwrap_or(false)
    }

    /// The single list under a list wrapper
    pub fn wrapped_list(&self, id: NodeId) -> Option<NodeId> {
        if self.is_list_wrapper(id) {
            self.children(id).next()
        } else {
            None
        }
    }

    /// First non-choice/case descendants along every branch under `id`
    pub fn first_non_choice_or_case(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in self.children(id) {
            if self.graph[child].is_choice_or_case() {
                out.extend(self.first_non_choice_or_case(child));
            } else {
                out.push(child);
            }
        }
        out
    }

    /// Closest ancestor that is not a choice or case
    pub fn data_parent(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if !self.graph[p].is_choice_or_case() {
                return Some(p);
            }
            current = self.parent(p);
        }
        None
    }

    /// Every ancestor name from the root down, `["", module, ..., name]`
    pub fn schema_path(&self, id: NodeId) -> Vec<String> {
        self.collect_path(id, false)
    }

    /// Like `schema_path`, but choice/case segments are dropped
    pub fn data_path(&self, id: NodeId) -> Vec<String> {
        self.collect_path(id, true)
    }

    /// `data_path` joined with `/`
    pub fn path_string(&self, id: NodeId) -> String {
        self.data_path(id).join("/")
    }

    fn collect_path(&self, id: NodeId, skip_choice_case: bool) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let n = &self.graph[node];
            if !(skip_choice_case && n.is_choice_or_case()) {
                segments.push(n.name.clone());
            }
            current = self.parent(node);
        }
        segments.push(String::new());
        segments.reverse();
        segments
    }

    /// Name of the module root the node lives under
    pub fn root_module(&self, id: NodeId) -> String {
        let mut current = id;
        while let Some(p) = self.parent(current) {
            current = p;
        }
        self.graph[current].name.clone()
    }
}
