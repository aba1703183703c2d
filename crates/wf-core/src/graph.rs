use std::collections::BTreeMap;

use crate::content::{Container, Content, DebugMetadata, Leaf, Node};
use crate::error::WeftError;
use crate::path::{Component, Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerNode {
    pub name: Option<String>,
    pub count_visits_for_sequencing: bool,
    children: Vec<NodeId>,
    named: BTreeMap<String, NodeId>,
}

impl ContainerNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_at(&self, index: usize) -> Option<NodeId> {
        self.children.get(index).copied()
    }

    pub fn named_child(&self, name: &str) -> Option<NodeId> {
        self.named.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphContent {
    Container(ContainerNode),
    Leaf(Leaf),
}

#[derive(Debug, Clone, PartialEq)]
struct GraphNode {
    content: GraphContent,
    parent: Option<NodeId>,
    path: Path,
    metadata: Option<DebugMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentGraph {
    nodes: Vec<GraphNode>,
}

impl ContentGraph {
    pub fn from_root(root: Container) -> Result<Self, WeftError> {
        let mut graph = Self { nodes: Vec::new() };
        let metadata = root.metadata.clone();
        graph.add_node(
            Node {
                content: Content::Container(root),
                metadata,
            },
            None,
            Path::root(),
        )?;
        Ok(graph)
    }

    fn add_node(
        &mut self,
        node: Node,
        parent: Option<NodeId>,
        path: Path,
    ) -> Result<NodeId, WeftError> {
        let id = NodeId(self.nodes.len());
        match node.content {
            Content::Leaf(leaf) => {
                self.nodes.push(GraphNode {
                    content: GraphContent::Leaf(leaf),
                    parent,
                    path,
                    metadata: node.metadata,
                });
            }
            Content::Container(container) => {
                let metadata = node.metadata.or(container.metadata);
                self.nodes.push(GraphNode {
                    content: GraphContent::Container(ContainerNode {
                        name: container.name,
                        count_visits_for_sequencing: container.count_visits_for_sequencing,
                        children: Vec::new(),
                        named: BTreeMap::new(),
                    }),
                    parent,
                    path: path.clone(),
                    metadata,
                });

                let mut children = Vec::with_capacity(container.content.len());
                let mut named = BTreeMap::new();
                for (index, child) in container.content.into_iter().enumerate() {
                    let child_name = match &child.content {
                        Content::Container(inner) => inner.name.clone(),
                        Content::Leaf(_) => None,
                    };
                    let child_path = match &child_name {
                        Some(name) => path.with_name(name.clone()),
                        None => path.with_index(index),
                    };
                    let child_id = self.add_node(child, Some(id), child_path)?;
                    children.push(child_id);
                    if let Some(name) = child_name {
                        Self::insert_named(&mut named, &path, name, child_id)?;
                    }
                }

                for (name, mut child) in container.named_only {
                    if let Content::Container(inner) = &mut child.content {
                        inner.name = Some(name.clone());
                    }
                    let child_id = self.add_node(child, Some(id), path.with_name(name.clone()))?;
                    Self::insert_named(&mut named, &path, name, child_id)?;
                }

                if let GraphContent::Container(slot) = &mut self.nodes[id.0].content {
                    slot.children = children;
                    slot.named = named;
                }
            }
        }
        Ok(id)
    }

    fn insert_named(
        named: &mut BTreeMap<String, NodeId>,
        path: &Path,
        name: String,
        child_id: NodeId,
    ) -> Result<(), WeftError> {
        if named.contains_key(&name) {
            return Err(WeftError::new(
                "GRAPH_DUPLICATE_NAME",
                format!("Container \"{}\" has two children named \"{}\".", path, name),
            ));
        }
        named.insert(name, child_id);
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn content(&self, id: NodeId) -> Option<&GraphContent> {
        self.nodes.get(id.0).map(|node| &node.content)
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        match self.content(id)? {
            GraphContent::Leaf(leaf) => Some(leaf),
            GraphContent::Container(_) => None,
        }
    }

    pub fn container(&self, id: NodeId) -> Option<&ContainerNode> {
        match self.content(id)? {
            GraphContent::Container(container) => Some(container),
            GraphContent::Leaf(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn path_of(&self, id: NodeId) -> Option<&Path> {
        self.nodes.get(id.0).map(|node| &node.path)
    }

    pub fn metadata(&self, id: NodeId) -> Option<&DebugMetadata> {
        self.nodes.get(id.0).and_then(|node| node.metadata.as_ref())
    }

    pub fn nearest_metadata(&self, id: NodeId) -> Option<&DebugMetadata> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if let Some(metadata) = self.metadata(node_id) {
                return Some(metadata);
            }
            current = self.parent(node_id);
        }
        None
    }

    pub fn content_at(&self, path: &Path) -> Option<NodeId> {
        self.content_at_from(self.root(), path)
    }

    pub fn content_at_from(&self, start: NodeId, path: &Path) -> Option<NodeId> {
        let mut current = start;
        for component in path.components() {
            let container = self.container(current)?;
            current = match component {
                Component::Index(index) => container.child_at(*index)?,
                Component::Name(name) => container.named_child(name)?,
            };
        }
        Some(current)
    }

    /// Path to the next sibling, stepping out of nested containers when the
    /// deepest level is exhausted. A name component stops the search.
    pub fn increment_path(&self, path: &Path) -> Option<Path> {
        let Some(Component::Index(index)) = path.last_component() else {
            return None;
        };
        let parent = path.parent()?;
        let candidate = parent.with_index(index + 1);
        if self.content_at(&candidate).is_some() {
            return Some(candidate);
        }
        if parent.is_empty() {
            return None;
        }
        self.increment_path(&parent)
    }

    pub fn path_to_first_leaf_content(&self, path: &Path) -> Option<Path> {
        let mut current_path = path.clone();
        let mut current = self.content_at(path)?;
        while let Some(container) = self.container(current) {
            current = container.child_at(0)?;
            current_path = current_path.with_index(0);
        }
        Some(current_path)
    }

    pub fn sequence_container_of(&self, id: NodeId) -> Option<NodeId> {
        let immediate = self.parent(id)?;
        let mut current = Some(immediate);
        while let Some(node_id) = current {
            if self
                .container(node_id)
                .is_some_and(|container| container.count_visits_for_sequencing)
            {
                return Some(node_id);
            }
            current = self.parent(node_id);
        }
        Some(immediate)
    }
}
