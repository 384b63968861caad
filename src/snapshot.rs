use crate::{math::*, scene::*};
use bevy::log::{debug, warn};
use std::{collections::HashMap, hash::Hash};

/// What a part looked like when its site was initialised.
#[derive(Clone, Debug, PartialEq)]
pub struct OriginalState<M> {
    /// `None` when the part had no renderer.
    pub materials: Option<Vec<M>>,
    pub collider: Option<ColliderFlags>,
    pub pose: Option<Pose>,
    /// Centre of the collider bounds, if the part had a collider.
    pub collider_center: Option<Vector3>,
}

/// Per-site record of every part's original state.
///
/// Written once by [`SnapshotStore::capture_all`] and only read afterwards.
/// States are keyed by the scene's stable part identity; names are an alias
/// table on top, used to recognise a replacement part by the name of the
/// outline part it stands in for.
#[derive(Clone, Debug)]
pub struct SnapshotStore<Id, M> {
    parts: Vec<Id>,
    states: HashMap<Id, OriginalState<M>>,
    aliases: HashMap<String, Id>,
}

impl<Id, M> SnapshotStore<Id, M>
where
    Id: Copy + Eq + Hash + std::fmt::Debug,
    M: Clone,
{
    pub fn capture_all<S>(scene: &S, root: Id) -> Self
    where
        S: PartScene<Id = Id, Material = M>,
    {
        let parts = scene.subtree(root);
        let mut states = HashMap::with_capacity(parts.len());
        let mut aliases = HashMap::new();
        for &id in &parts {
            states.insert(
                id,
                OriginalState {
                    materials: scene.materials(id),
                    collider: scene.collider(id),
                    pose: scene.pose(id),
                    collider_center: scene.collider_bounds(id).map(|b| aabb_center(&b)),
                },
            );
            if let Some(name) = scene.name(id) {
                if let Some(first) = aliases.get(name) {
                    warn!("part {id:?} shares the name {name:?} with {first:?}; keeping {first:?}");
                } else {
                    aliases.insert(name.to_owned(), id);
                }
            }
        }
        debug!("captured {} parts below {root:?}", parts.len());
        Self {
            parts,
            states,
            aliases,
        }
    }

    /// Every captured part in traversal order, root first.
    pub fn parts(&self) -> &[Id] {
        &self.parts
    }

    pub fn original(&self, id: Id) -> Option<&OriginalState<M>> {
        self.states.get(&id)
    }

    /// The materials `id` had at capture time, or `None` if it had no
    /// renderer or was not captured at all.
    pub fn restore_materials(&self, id: Id) -> Option<&[M]> {
        self.states.get(&id)?.materials.as_deref()
    }

    /// The captured part whose name is `name`.
    pub fn counterpart(&self, name: &str) -> Option<Id> {
        self.aliases.get(name).copied()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.states.contains_key(&id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::*;
    use bevy::math::Vec3;

    #[test]
    fn capture_records_every_part() {
        let mut tree = PartTree::new();
        let root = tree.add_root(PartNode::new("pump").with_materials(vec!["steel", "rubber"]));
        let shaft = tree.add_child(
            root,
            PartNode::new("shaft").with_collider(ColliderFlags {
                enabled: true,
                is_trigger: false,
            }),
        );
        let store = SnapshotStore::capture_all(&tree, root);
        assert_eq!(store.parts(), &[root, shaft]);
        assert_eq!(store.restore_materials(root), Some(&["steel", "rubber"][..]));
        // No renderer, no snapshot.
        assert_eq!(store.restore_materials(shaft), None);
        assert_eq!(store.original(shaft).unwrap().collider_center, Some(Vec3::ZERO));
        assert_eq!(store.counterpart("shaft"), Some(shaft));
        assert_eq!(store.counterpart("impeller"), None);
    }

    #[test]
    fn snapshot_survives_scene_changes() {
        let mut tree = PartTree::new();
        let root = tree.add_root(PartNode::new("pump").with_materials(vec!["steel"]));
        let store = SnapshotStore::capture_all(&tree, root);
        tree.set_materials(root, vec!["outline"]);
        assert_eq!(store.restore_materials(root), Some(&["steel"][..]));
    }

    #[test]
    fn duplicate_names_keep_first() {
        let mut tree = PartTree::<&str>::new();
        let root = tree.add_root(PartNode::new("pump"));
        let first = tree.add_child(root, PartNode::new("bolt"));
        let second = tree.add_child(root, PartNode::new("bolt"));
        let store = SnapshotStore::capture_all(&tree, root);
        assert_eq!(store.counterpart("bolt"), Some(first));
        assert!(store.contains(second));
    }
}
