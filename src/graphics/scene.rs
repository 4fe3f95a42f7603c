use super::engine::NodeId;
use crate::math::{uv, NodeTransform};
use thunderdome as td;

/// A transform in the scene hierarchy that meshes can be parented to.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub label: String,
    pub parent: Option<NodeId>,
    pub transform: NodeTransform,
}

/// Storage for scene nodes shared by the engine implementations.
pub(crate) struct SceneNodes {
    nodes: td::Arena<SceneNode>,
}

impl SceneNodes {
    pub fn new() -> Self {
        Self {
            nodes: td::Arena::new(),
        }
    }

    pub fn insert(&mut self, label: &str) -> NodeId {
        NodeId(self.nodes.insert(SceneNode {
            label: label.to_string(),
            parent: None,
            transform: uv::Mat4::identity(),
        }))
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Set the parent of a node.
    /// Parenting that would create a cycle is refused.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(parent) = parent {
            if self.ancestors(Some(parent)).any(|ancestor| ancestor == id) {
                log::warn!("Refusing to parent node {:?} under its own descendant", id);
                return;
            }
        }
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.parent = parent;
        }
    }

    pub fn set_transform(&mut self, id: NodeId, transform: NodeTransform) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.transform = transform;
        }
    }

    /// Remove a node. Its children are detached and become roots.
    pub fn remove(&mut self, id: NodeId) {
        if self.nodes.remove(id.0).is_none() {
            return;
        }
        for (_, node) in self.nodes.iter_mut() {
            if node.parent == Some(id) {
                node.parent = None;
            }
        }
    }

    /// Transform from the space of `node` to world space.
    /// `None` or a removed node is the world itself.
    pub fn world_transform(&self, node: Option<NodeId>) -> NodeTransform {
        // collected leaf to root, applied root to leaf
        let chain: Vec<NodeTransform> = self
            .ancestors(node)
            .filter_map(|id| self.get(id).map(|n| n.transform))
            .collect();
        chain
            .into_iter()
            .rev()
            .fold(uv::Mat4::identity(), |acc, local| acc * local)
    }

    /// Iterate over `node` and then each of its ancestors.
    fn ancestors(&self, node: Option<NodeId>) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(node.filter(|id| self.nodes.contains(id.0)), |id| {
            self.get(*id).and_then(|n| n.parent)
        })
    }
}
