use crate::{scene::*, snapshot::SnapshotStore};
use serde::{Deserialize, Serialize};

/// Role a part plays in a maintenance scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartMode {
    /// Leave the part exactly as the scene author set it up.
    #[default]
    Unchanged,
    /// Scenery: no collider, no interaction.
    BackgroundPart,
    /// Scenery that still takes part in the physics simulation.
    BackgroundPartCollider,
    /// Translucent stand-in marking where a replacement part must go.
    OutlinePart,
    /// A part the user grabs and places.
    InteractablePart,
}

/// Which materials a mode puts on a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialSelector {
    /// The materials captured at initialisation.
    Restored,
    /// The default outline material in every slot.
    Outline,
}

/// Knobs where the two historical part components disagreed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModePolicy {
    /// An interactable part keeps an enabled, solid collider so it can be
    /// grabbed and pushed against other parts. When false its collider is
    /// disabled.
    pub solid_grabbable: bool,
    /// An outline part is one compound body: its root gets a kinematic,
    /// gravity-free body and every deeper body is removed.
    pub compound_outline: bool,
}

impl Default for ModePolicy {
    fn default() -> Self {
        Self {
            solid_grabbable: true,
            compound_outline: true,
        }
    }
}

/// Concrete component settings for a mode. `None` means "leave alone".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeConfig {
    pub collider: Option<ColliderFlags>,
    pub body: Option<BodyFlags>,
    pub materials: Option<MaterialSelector>,
}

impl ModeConfig {
    pub fn for_mode(mode: PartMode, policy: &ModePolicy) -> Self {
        let still = BodyFlags {
            kinematic: true,
            gravity: false,
        };
        match mode {
            PartMode::Unchanged => Self {
                collider: None,
                body: None,
                materials: None,
            },
            PartMode::BackgroundPart => Self {
                collider: Some(ColliderFlags::default()),
                body: Some(still),
                materials: Some(MaterialSelector::Restored),
            },
            PartMode::BackgroundPartCollider => Self {
                collider: Some(ColliderFlags::default()),
                body: Some(BodyFlags {
                    kinematic: false,
                    gravity: false,
                }),
                materials: Some(MaterialSelector::Restored),
            },
            PartMode::OutlinePart => Self {
                collider: Some(ColliderFlags {
                    enabled: true,
                    is_trigger: true,
                }),
                body: Some(still),
                materials: Some(MaterialSelector::Outline),
            },
            PartMode::InteractablePart => Self {
                collider: Some(ColliderFlags {
                    enabled: policy.solid_grabbable,
                    is_trigger: false,
                }),
                body: Some(still),
                materials: Some(MaterialSelector::Restored),
            },
        }
    }
}

/// Applies a mode's [`ModeConfig`] to parts of a scene.
pub struct ModeApplier<'a, Id, M> {
    pub snapshot: &'a SnapshotStore<Id, M>,
    pub outline: &'a M,
    pub policy: ModePolicy,
}

impl<'a, Id, M> ModeApplier<'a, Id, M>
where
    Id: Copy + Eq + std::hash::Hash + std::fmt::Debug,
    M: Clone + PartialEq + std::fmt::Debug,
{
    /// Configure a single part. `root` is the top of the part's hierarchy;
    /// it matters only for compound outline bodies.
    pub fn apply<S>(&self, scene: &mut S, id: Id, root: Id, mode: PartMode)
    where
        S: PartScene<Id = Id, Material = M>,
    {
        let config = ModeConfig::for_mode(mode, &self.policy);
        if let Some(flags) = config.collider {
            scene.set_collider(id, flags);
        }
        if let Some(flags) = config.body {
            if mode == PartMode::OutlinePart && self.policy.compound_outline && id != root {
                scene.remove_body(id);
            } else {
                scene.set_body(id, flags);
            }
        }
        match config.materials {
            Some(MaterialSelector::Restored) => {
                if let Some(materials) = self.snapshot.restore_materials(id) {
                    if scene.materials(id).is_some() {
                        scene.set_materials(id, materials.to_vec());
                    }
                }
            }
            Some(MaterialSelector::Outline) => fill_materials(scene, id, self.outline),
            None => {}
        }
    }

    /// Configure `root` and everything below it.
    pub fn apply_subtree<S>(&self, scene: &mut S, root: Id, mode: PartMode)
    where
        S: PartScene<Id = Id, Material = M>,
    {
        if mode == PartMode::OutlinePart
            && self.policy.compound_outline
            && scene.body(root).is_none()
        {
            scene.insert_body(
                root,
                BodyFlags {
                    kinematic: false,
                    gravity: false,
                },
            );
        }
        for id in scene.subtree(root) {
            self.apply(scene, id, root, mode);
        }
    }
}

/// Put `material` into every slot of the renderer on `id`.
pub fn fill_materials<S: PartScene>(scene: &mut S, id: S::Id, material: &S::Material) {
    if let Some(slots) = scene.materials(id) {
        scene.set_materials(id, vec![material.clone(); slots.len()]);
    }
}
