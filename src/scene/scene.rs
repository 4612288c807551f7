use std::sync::atomic::{AtomicU32, Ordering};

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::{Node, NodeComponent};
use crate::scene::transform_system;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Node hierarchy of one mounted overlay.
///
/// Pure data: nodes live in a slotmap arena, parents and children refer to
/// each other by handle. Removing a node removes its whole subtree and hands
/// the removed nodes back so the caller can release the GPU resources their
/// components reference.
pub struct Scene {
    pub id: u32,
    nodes: SlotMap<NodeHandle, Node>,
    root_nodes: Vec<NodeHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Adds a node as a new root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Adds a node under `parent`. Falls back to a root if the parent is gone.
    pub fn add_child(&mut self, parent: NodeHandle, mut child: Node) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            return self.add_node(child);
        }
        child.parent = Some(parent);
        let handle = self.nodes.insert(child);
        self.nodes[parent].children.push(handle);
        handle
    }

    /// Re-parents `child` under `parent`, detaching it from its previous
    /// parent (or the root list).
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent || !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            return;
        }
        self.detach(child);
        self.root_nodes.retain(|&h| h != child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.nodes[child].transform.mark_dirty();
    }

    /// Detaches `child` from its parent and makes it a root.
    pub fn detach(&mut self, child: NodeHandle) {
        let Some(parent) = self.nodes.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|&h| h != child);
        }
        self.nodes[child].parent = None;
        self.nodes[child].transform.mark_dirty();
        self.root_nodes.push(child);
    }

    /// Removes `handle` and all of its descendants.
    ///
    /// Returns the removed nodes (parents before children) so that the
    /// caller can release the resources their components hold.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Vec<Node> {
        if !self.nodes.contains_key(handle) {
            return Vec::new();
        }

        match self.nodes[handle].parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.retain(|&h| h != handle);
                }
            }
            None => self.root_nodes.retain(|&h| h != handle),
        }

        let mut removed = Vec::new();
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children.iter().copied());
                removed.push(node);
            }
        }
        removed
    }

    /// Removes every child of `handle` but keeps the node itself.
    pub fn clear_children(&mut self, handle: NodeHandle) -> Vec<Node> {
        let children = self
            .nodes
            .get(handle)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        children
            .into_iter()
            .flat_map(|child| self.remove_node(child))
            .collect()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn root_nodes(&self) -> &[NodeHandle] {
        &self.root_nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes.iter()
    }

    /// Depth-first search for a node named `name` below (and including) `root`.
    #[must_use]
    pub fn find_node_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let node = self.nodes.get(current)?;
            if node.name == name {
                return Some(current);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// All handles of the subtree rooted at `root`, parents first.
    #[must_use]
    pub fn subtree(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Number of sprite components in the subtree (live particles + rockets).
    #[must_use]
    pub fn count_sprites(&self, root: NodeHandle) -> usize {
        self.subtree(root)
            .into_iter()
            .filter(|&h| matches!(self.nodes[h].component, Some(NodeComponent::Sprite(_))))
            .count()
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Propagates world matrices through the whole hierarchy.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy(&mut self.nodes, &self.root_nodes);
    }

    /// Recomputes the world matrices of one subtree immediately.
    pub fn update_subtree(&mut self, root: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, root);
    }

    #[must_use]
    pub fn world_matrix(&self, handle: NodeHandle) -> Option<Affine3A> {
        self.nodes.get(handle).map(|n| n.transform.world_matrix)
    }

    /// Transform of `handle` expressed in the space of `ancestor`, built
    /// from the current TRS values (no matrix propagation required).
    ///
    /// Returns `None` if `ancestor` is not on the parent chain of `handle`.
    #[must_use]
    pub fn matrix_relative_to(&self, handle: NodeHandle, ancestor: NodeHandle) -> Option<Affine3A> {
        let mut matrix = Affine3A::IDENTITY;
        let mut current = handle;
        while current != ancestor {
            let node = self.nodes.get(current)?;
            let t = &node.transform;
            matrix = Affine3A::from_scale_rotation_translation(t.scale, t.rotation, t.position) * matrix;
            current = node.parent?;
        }
        Some(matrix)
    }
}
