use crate::{math::*, scene::*};
use parry3d::bounding_volume::Aabb;
use petgraph::prelude::*;

/// One object in a [`PartTree`].
#[derive(Clone, Debug)]
pub struct PartNode<M> {
    pub name: String,
    /// World-space pose.
    pub pose: Pose,
    /// Half extents of the part's box; both the renderer and the collider
    /// bounds are derived from it.
    pub extents: Vector3,
    /// `None` when the part has no renderer.
    pub materials: Option<Vec<M>>,
    pub collider: Option<ColliderFlags>,
    pub body: Option<BodyFlags>,
}

impl<M> PartNode<M> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pose: Pose::default(),
            extents: Vector3::splat(0.5),
            materials: None,
            collider: None,
            body: None,
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_extents(mut self, extents: Vector3) -> Self {
        self.extents = extents;
        self
    }

    pub fn with_materials(mut self, materials: Vec<M>) -> Self {
        self.materials = Some(materials);
        self
    }

    pub fn with_collider(mut self, collider: ColliderFlags) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_body(mut self, body: BodyFlags) -> Self {
        self.body = Some(body);
        self
    }
}

/// In-memory part hierarchy for hosts without a scene graph of their own.
///
/// Edges point from parent to child. Nodes are never removed, so a
/// `NodeIndex` stays valid for the life of the tree.
#[derive(Clone, Debug)]
pub struct PartTree<M> {
    pub graph: DiGraph<PartNode<M>, ()>,
}

impl<M> Default for PartTree<M> {
    fn default() -> Self {
        Self {
            graph: DiGraph::new(),
        }
    }
}

impl<M> PartTree<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, node: PartNode<M>) -> NodeIndex {
        self.graph.add_node(node)
    }

    pub fn add_child(&mut self, parent: NodeIndex, node: PartNode<M>) -> NodeIndex {
        let child = self.graph.add_node(node);
        self.graph.add_edge(parent, child, ());
        child
    }

    pub fn node(&self, id: NodeIndex) -> Option<&PartNode<M>> {
        self.graph.node_weight(id)
    }

    pub fn node_mut(&mut self, id: NodeIndex) -> Option<&mut PartNode<M>> {
        self.graph.node_weight_mut(id)
    }

    pub fn set_pose(&mut self, id: NodeIndex, pose: Pose) {
        if let Some(node) = self.graph.node_weight_mut(id) {
            node.pose = pose;
        }
    }
}

impl<M> PartScene for PartTree<M>
where
    M: Clone + PartialEq + std::fmt::Debug,
{
    type Id = NodeIndex;
    type Material = M;

    fn children(&self, id: NodeIndex) -> Vec<NodeIndex> {
        // petgraph yields the most recently added edge first.
        let mut children: Vec<NodeIndex> = self.graph.neighbors_directed(id, Outgoing).collect();
        children.reverse();
        children
    }

    fn subtree(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut parts = Vec::new();
        let mut dfs = Dfs::new(&self.graph, root);
        while let Some(id) = dfs.next(&self.graph) {
            parts.push(id);
        }
        parts
    }

    fn name(&self, id: NodeIndex) -> Option<&str> {
        self.graph.node_weight(id).map(|n| n.name.as_str())
    }

    fn pose(&self, id: NodeIndex) -> Option<Pose> {
        self.graph.node_weight(id).map(|n| n.pose)
    }

    fn materials(&self, id: NodeIndex) -> Option<Vec<M>> {
        self.graph.node_weight(id)?.materials.clone()
    }

    fn set_materials(&mut self, id: NodeIndex, materials: Vec<M>) {
        if let Some(slots) = self.graph.node_weight_mut(id).and_then(|n| n.materials.as_mut()) {
            *slots = materials;
        }
    }

    fn renderer_bounds(&self, id: NodeIndex) -> Option<Aabb> {
        let node = self.graph.node_weight(id)?;
        node.materials.as_ref()?;
        Some(world_aabb(&node.pose, node.extents))
    }

    fn collider(&self, id: NodeIndex) -> Option<ColliderFlags> {
        self.graph.node_weight(id)?.collider
    }

    fn set_collider(&mut self, id: NodeIndex, flags: ColliderFlags) {
        if let Some(collider) = self.graph.node_weight_mut(id).and_then(|n| n.collider.as_mut()) {
            *collider = flags;
        }
    }

    fn collider_bounds(&self, id: NodeIndex) -> Option<Aabb> {
        let node = self.graph.node_weight(id)?;
        node.collider?;
        Some(world_aabb(&node.pose, node.extents))
    }

    fn body(&self, id: NodeIndex) -> Option<BodyFlags> {
        self.graph.node_weight(id)?.body
    }

    fn set_body(&mut self, id: NodeIndex, flags: BodyFlags) {
        if let Some(body) = self.graph.node_weight_mut(id).and_then(|n| n.body.as_mut()) {
            *body = flags;
        }
    }

    fn insert_body(&mut self, id: NodeIndex, flags: BodyFlags) {
        if let Some(node) = self.graph.node_weight_mut(id) {
            node.body = Some(flags);
        }
    }

    fn remove_body(&mut self, id: NodeIndex) {
        if let Some(node) = self.graph.node_weight_mut(id) {
            node.body = None;
        }
    }
}
