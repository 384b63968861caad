//! The engine surface a placement site talks to.
//!
//! A host engine owns the scene graph, the renderers, the colliders and the
//! rigid bodies. [`PartScene`] is the narrow view of those services this crate
//! needs. Every accessor answers `None` when a part lacks the component in
//! question and every mutator quietly does nothing in that case; missing
//! components are never an error.
use crate::math::*;
use parry3d::bounding_volume::Aabb;
use std::{collections::HashMap, fmt::Debug, hash::Hash};

/// Collider switches of a part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColliderFlags {
    pub enabled: bool,
    pub is_trigger: bool,
}

/// Rigid body switches of a part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BodyFlags {
    /// Moved only by explicit code, never by physics forces.
    pub kinematic: bool,
    pub gravity: bool,
}

pub trait PartScene {
    /// Identity of a part, stable for the part's lifetime.
    type Id: Copy + Eq + Hash + Debug;
    /// Reference to a material asset.
    type Material: Clone + PartialEq + Debug;

    /// Direct children of `id` in hierarchy order.
    fn children(&self, id: Self::Id) -> Vec<Self::Id>;

    /// `root` and all of its descendants, depth-first, parents before
    /// children.
    fn subtree(&self, root: Self::Id) -> Vec<Self::Id> {
        let mut parts = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            parts.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        parts
    }

    fn name(&self, id: Self::Id) -> Option<&str>;

    fn pose(&self, id: Self::Id) -> Option<Pose>;

    /// Material slots of the part's renderer.
    fn materials(&self, id: Self::Id) -> Option<Vec<Self::Material>>;

    fn set_materials(&mut self, id: Self::Id, materials: Vec<Self::Material>);

    /// World-space bounds of the part's renderer.
    fn renderer_bounds(&self, id: Self::Id) -> Option<Aabb>;

    fn collider(&self, id: Self::Id) -> Option<ColliderFlags>;

    fn set_collider(&mut self, id: Self::Id, flags: ColliderFlags);

    /// World-space bounds of the part's collider.
    fn collider_bounds(&self, id: Self::Id) -> Option<Aabb>;

    fn body(&self, id: Self::Id) -> Option<BodyFlags>;

    fn set_body(&mut self, id: Self::Id, flags: BodyFlags);

    /// Give the part a rigid body, replacing any it already has.
    fn insert_body(&mut self, id: Self::Id, flags: BodyFlags);

    fn remove_body(&mut self, id: Self::Id);
}

/// Lookup of material assets by name.
pub trait MaterialSource {
    type Material;

    fn named_material(&self, name: &str) -> Option<Self::Material>;
}

impl<M: Clone> MaterialSource for HashMap<String, M> {
    type Material = M;

    fn named_material(&self, name: &str) -> Option<M> {
        self.get(name).cloned()
    }
}
