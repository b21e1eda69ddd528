//! Schema Tree Builder
//!
//! Assembles a `SchemaTree`. The loader goes through `try_add` so duplicate
//! children surface as errors; the convenience helpers are meant for
//! programmatic construction.

use super::{ConfigFlag, ModuleInfo, NodeId, NodeKind, SchemaNode, SchemaTree, TypeDescriptor};

/// Error returned when a parent already has a child of the same name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateChild {
    pub parent: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct SchemaTreeBuilder {
    tree: SchemaTree,
}

impl SchemaTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module and return its root node
    pub fn module(&mut self, name: &str, namespace: &str, prefix: Option<&str>) -> NodeId {
        self.add_module(
            ModuleInfo {
                name: name.to_string(),
                namespace: namespace.to_string(),
                prefix: prefix.map(str::to_string),
                imported_only: false,
            },
        )
    }

    pub fn add_module(&mut self, info: ModuleInfo) -> NodeId {
        let root = self
            .tree
            .graph
            .add_node(SchemaNode::new(&info.name, NodeKind::Module, &info.name));
        self.tree.roots.insert(info.name.clone(), root);
        self.tree.modules.insert(info.name.clone(), info);
        root
    }

    /// Attach `node` under `parent`, failing if the name is taken
    pub fn try_add(&mut self, parent: NodeId, node: SchemaNode) -> Result<NodeId, DuplicateChild> {
        if self.tree.graph[parent].children.contains_key(&node.name) {
            return Err(DuplicateChild {
                parent: self.tree.path_string(parent),
                name: node.name,
            });
        }
        Ok(self.insert(parent, node))
    }

    /// Attach `node` under `parent`; a same-named earlier child is shadowed
    pub fn add(&mut self, parent: NodeId, node: SchemaNode) -> NodeId {
        self.insert(parent, node)
    }

    fn insert(&mut self, parent: NodeId, node: SchemaNode) -> NodeId {
        let name = node.name.clone();
        let id = self.tree.graph.add_node(node);
        self.tree.graph.add_edge(parent, id, ());
        self.tree.graph[parent].children.insert(name, id);
        id
    }

    fn child_of(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let module = self.tree.graph[parent].module.clone();
        self.add(parent, SchemaNode::new(name, kind, module))
    }

    pub fn container(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.child_of(parent, name, NodeKind::Container)
    }

    pub fn list(&mut self, parent: NodeId, name: &str, key: Option<&str>) -> NodeId {
        let id = self.child_of(parent, name, NodeKind::List);
        self.tree.graph[id].key = key.map(str::to_string);
        id
    }

    pub fn leaf(&mut self, parent: NodeId, name: &str, ty: TypeDescriptor) -> NodeId {
        let id = self.child_of(parent, name, NodeKind::Leaf);
        self.tree.graph[id].type_desc = Some(ty);
        id
    }

    pub fn leaf_list(&mut self, parent: NodeId, name: &str, ty: TypeDescriptor) -> NodeId {
        let id = self.child_of(parent, name, NodeKind::LeafList);
        self.tree.graph[id].type_desc = Some(ty);
        id
    }

    pub fn choice(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.child_of(parent, name, NodeKind::Choice)
    }

    pub fn case(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.child_of(parent, name, NodeKind::Case)
    }

    pub fn anydata(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.child_of(parent, name, NodeKind::Anydata)
    }

    pub fn set_config(&mut self, id: NodeId, config: bool) {
        self.tree.graph[id].config = ConfigFlag::from(Some(config));
    }

    /// Mark a node as defined by another module (augments)
    pub fn set_module(&mut self, id: NodeId, module: &str) {
        self.tree.graph[id].module = module.to_string();
    }

    pub fn set_default(&mut self, id: NodeId, default: &str) {
        self.tree.graph[id].default = Some(default.to_string());
    }

    pub fn build(self) -> SchemaTree {
        self.tree
    }
}
