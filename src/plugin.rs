//! Running placement sites inside a bevy app.
//!
//! Parts are entities: `Name` for recognition, `Children` for hierarchy,
//! `GlobalTransform` for pose. Renderer, collider and rigid body state are
//! mirrored in [`PartMaterials`], [`ColliderState`] and [`BodyState`], which
//! the host's rendering and physics glue keep in sync with the real
//! components. The host reports trigger overlaps as [`PlacementOverlap`]
//! events and reads the outcome back as [`PlacementVerdict`] events.
use crate::{config::*, error::PlacementError, evaluator::*, math::*, scene::*};
use bevy::prelude::*;
use parry3d::bounding_volume::Aabb;
use std::collections::HashMap;

pub type MaterialHandle = Handle<StandardMaterial>;

/// Material slots of an entity's renderer.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct PartMaterials(pub Vec<MaterialHandle>);

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColliderState(pub ColliderFlags);

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BodyState(pub BodyFlags);

/// Half extents of the entity's box, used for renderer and collider bounds.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct PartExtents(pub Vector3);

impl Default for PartExtents {
    fn default() -> Self {
        Self(Vector3::splat(0.5))
    }
}

/// A visible, collidable part.
#[derive(Bundle, Clone, Default)]
pub struct PartBundle {
    pub name: Name,
    pub transform: TransformBundle,
    pub materials: PartMaterials,
    pub collider: ColliderState,
    pub extents: PartExtents,
}

impl PartBundle {
    pub fn new(
        name: impl Into<String>,
        transform: Transform,
        materials: Vec<MaterialHandle>,
    ) -> Self {
        Self {
            name: Name::new(name.into()),
            transform: TransformBundle {
                local: transform,
                global: GlobalTransform::from(transform),
            },
            materials: PartMaterials(materials),
            collider: ColliderState(ColliderFlags {
                enabled: true,
                is_trigger: false,
            }),
            extents: PartExtents::default(),
        }
    }
}

/// Materials addressable by name, the fallbacks of every site included.
#[derive(Resource, Clone, Debug, Default)]
pub struct NamedMaterials(pub HashMap<String, MaterialHandle>);

impl MaterialSource for NamedMaterials {
    type Material = MaterialHandle;

    fn named_material(&self, name: &str) -> Option<MaterialHandle> {
        self.0.get(name).cloned()
    }
}

#[derive(Component, Debug)]
pub struct PlacementSiteComponent(pub PlacementSite<Entity, MaterialHandle>);

/// Sent by the host for every trigger callback on a site's volume.
#[derive(Event, Clone, Copy, Debug)]
pub struct PlacementOverlap {
    pub site: Entity,
    pub other: Entity,
    pub phase: OverlapPhase,
}

/// Sent for every evaluated placement.
#[derive(Event, Clone, Copy, Debug)]
pub struct PlacementVerdict {
    pub site: Entity,
    pub other: Entity,
    pub attempt: PlacementAttempt,
}

impl PlacementVerdict {
    pub fn accepted(&self) -> bool {
        self.attempt.accepted()
    }
}

pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NamedMaterials>()
            .add_event::<PlacementOverlap>()
            .add_event::<PlacementVerdict>()
            .add_systems(Update, process_overlaps);
    }
}

/// Build a placement site on `root` and attach it as a component.
pub fn attach_site(
    world: &mut World,
    root: Entity,
    config: &PlacementConfig,
) -> Result<(), PlacementError> {
    let library = world.get_resource::<NamedMaterials>().cloned().unwrap_or_default();
    let site = PlacementSite::with_material_source(world, root, config, &library)?;
    world.entity_mut(root).insert(PlacementSiteComponent(site));
    Ok(())
}

/// Feed this frame's overlaps to their sites, in the order they were sent.
pub fn process_overlaps(world: &mut World) {
    let overlaps: Vec<PlacementOverlap> = world
        .resource_mut::<Events<PlacementOverlap>>()
        .drain()
        .collect();
    for overlap in overlaps {
        // The site is taken out of the world while it works on the world.
        let Some(mut site) = world
            .get_entity_mut(overlap.site)
            .and_then(|mut entity| entity.take::<PlacementSiteComponent>())
        else {
            warn!("overlap on {:?}, which has no placement site", overlap.site);
            continue;
        };
        let result = site.0.handle_overlap(world, overlap.other, overlap.phase);
        world.entity_mut(overlap.site).insert(site);
        match result {
            Ok(Some(attempt)) => {
                world.send_event(PlacementVerdict {
                    site: overlap.site,
                    other: overlap.other,
                    attempt,
                });
            }
            Ok(None) => {}
            Err(e) => error!("placement site {:?}: {e}", overlap.site),
        }
    }
}

fn box_bounds(world: &World, id: Entity) -> Option<Aabb> {
    let pose = Pose::from(world.get::<GlobalTransform>(id)?);
    let extents = world.get::<PartExtents>(id)?;
    Some(world_aabb(&pose, extents.0))
}

impl PartScene for World {
    type Id = Entity;
    type Material = MaterialHandle;

    fn children(&self, id: Entity) -> Vec<Entity> {
        self.get::<Children>(id)
            .map(|children| children.iter().copied().collect())
            .unwrap_or_default()
    }

    fn name(&self, id: Entity) -> Option<&str> {
        self.get::<Name>(id).map(|name| name.as_str())
    }

    fn pose(&self, id: Entity) -> Option<Pose> {
        self.get::<GlobalTransform>(id).map(Pose::from)
    }

    fn materials(&self, id: Entity) -> Option<Vec<MaterialHandle>> {
        self.get::<PartMaterials>(id).map(|m| m.0.clone())
    }

    fn set_materials(&mut self, id: Entity, materials: Vec<MaterialHandle>) {
        if let Some(mut slots) = self.get_mut::<PartMaterials>(id) {
            slots.0 = materials;
        }
    }

    fn renderer_bounds(&self, id: Entity) -> Option<Aabb> {
        self.get::<PartMaterials>(id)?;
        box_bounds(self, id)
    }

    fn collider(&self, id: Entity) -> Option<ColliderFlags> {
        self.get::<ColliderState>(id).map(|c| c.0)
    }

    fn set_collider(&mut self, id: Entity, flags: ColliderFlags) {
        if let Some(mut collider) = self.get_mut::<ColliderState>(id) {
            collider.0 = flags;
        }
    }

    fn collider_bounds(&self, id: Entity) -> Option<Aabb> {
        self.get::<ColliderState>(id)?;
        box_bounds(self, id)
    }

    fn body(&self, id: Entity) -> Option<BodyFlags> {
        self.get::<BodyState>(id).map(|b| b.0)
    }

    fn set_body(&mut self, id: Entity, flags: BodyFlags) {
        if let Some(mut body) = self.get_mut::<BodyState>(id) {
            body.0 = flags;
        }
    }

    fn insert_body(&mut self, id: Entity, flags: BodyFlags) {
        if let Some(mut entity) = self.get_entity_mut(id) {
            entity.insert(BodyState(flags));
        }
    }

    fn remove_body(&mut self, id: Entity) {
        if let Some(mut entity) = self.get_entity_mut(id) {
            entity.remove::<BodyState>();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mode::PartMode;

    const ORANGE: MaterialHandle = Handle::weak_from_u128(0x0e01);
    const GREEN: MaterialHandle = Handle::weak_from_u128(0x0e02);
    const RED: MaterialHandle = Handle::weak_from_u128(0x0e03);
    const STEEL: MaterialHandle = Handle::weak_from_u128(0x0e04);

    struct Rig {
        app: App,
        root: Entity,
        impeller: Entity,
        candidate: Entity,
    }

    fn rig() -> Rig {
        let mut app = App::new();
        app.add_plugins(PlacementPlugin);
        let world = app.world_mut();
        world.insert_resource(NamedMaterials(
            [
                (DEFAULT_OUTLINE_MATERIAL, ORANGE),
                (ACCEPTABLE_MATERIAL, GREEN),
                (UNACCEPTABLE_MATERIAL, RED),
            ]
            .into_iter()
            .map(|(name, handle)| (name.to_owned(), handle))
            .collect(),
        ));
        let root = world
            .spawn(PartBundle::new("pump", Transform::IDENTITY, vec![STEEL]))
            .insert(BodyState(BodyFlags {
                kinematic: false,
                gravity: true,
            }))
            .id();
        let impeller = world
            .spawn(PartBundle::new(
                "impeller",
                Transform::from_xyz(0.0, 1.0, 0.0),
                vec![STEEL, STEEL],
            ))
            .insert(BodyState::default())
            .id();
        world.entity_mut(root).add_child(impeller);
        let candidate = world
            .spawn(PartBundle::new(
                "impeller",
                Transform::from_xyz(0.0, 1.0, 0.0),
                vec![STEEL, STEEL],
            ))
            .id();
        let config = PlacementConfig {
            frame_skip: 1,
            ..PlacementConfig::with_mode(PartMode::OutlinePart)
        };
        attach_site(world, root, &config).unwrap();
        Rig {
            app,
            root,
            impeller,
            candidate,
        }
    }

    fn overlap(rig: &mut Rig, phase: OverlapPhase) -> Vec<PlacementVerdict> {
        let (site, other) = (rig.root, rig.candidate);
        rig.app.world_mut().send_event(PlacementOverlap { site, other, phase });
        rig.app.update();
        rig
            .app
            .world_mut()
            .resource_mut::<Events<PlacementVerdict>>()
            .drain()
            .collect()
    }

    fn materials(rig: &Rig, id: Entity) -> Vec<MaterialHandle> {
        rig.app.world().get::<PartMaterials>(id).unwrap().0.clone()
    }

    #[test]
    fn attach_configures_outline() {
        let rig = rig();
        let world = rig.app.world();
        assert_eq!(materials(&rig, rig.impeller), vec![ORANGE, ORANGE]);
        assert_eq!(
            world.get::<ColliderState>(rig.impeller),
            Some(&ColliderState(ColliderFlags {
                enabled: true,
                is_trigger: true
            }))
        );
        assert_eq!(
            world.get::<BodyState>(rig.root),
            Some(&BodyState(BodyFlags {
                kinematic: true,
                gravity: false
            }))
        );
        assert!(world.get::<BodyState>(rig.impeller).is_none());
        assert!(world.get::<PlacementSiteComponent>(rig.root).is_some());
    }

    #[test]
    fn overlap_produces_verdict() {
        let mut rig = rig();
        let verdicts = overlap(&mut rig, OverlapPhase::Enter);
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts[0].accepted());
        assert_eq!(verdicts[0].other, rig.candidate);
        assert_eq!(materials(&rig, rig.impeller), vec![GREEN, GREEN]);
        let site = rig.app.world().get::<PlacementSiteComponent>(rig.root).unwrap();
        assert_eq!(site.0.state(), PlacementState::Accepted);

        assert!(overlap(&mut rig, OverlapPhase::Exit).is_empty());
        assert_eq!(materials(&rig, rig.impeller), vec![ORANGE, ORANGE]);
    }

    #[test]
    fn misplaced_candidate_rejected() {
        let mut rig = rig();
        let candidate = rig.candidate;
        rig.app.world_mut().entity_mut(candidate).insert(GlobalTransform::from(
            Transform::from_xyz(0.0, 1.0, 0.0).with_rotation(Quat::from_rotation_x(0.5)),
        ));
        let verdicts = overlap(&mut rig, OverlapPhase::Stay);
        assert_eq!(verdicts.len(), 1);
        assert!(!verdicts[0].accepted());
        assert_eq!(materials(&rig, rig.root), vec![RED]);
    }

    #[test]
    fn candidate_without_pose_is_skipped() {
        let mut rig = rig();
        let candidate = rig.candidate;
        rig.app.world_mut().entity_mut(candidate).remove::<GlobalTransform>();
        assert!(overlap(&mut rig, OverlapPhase::Stay).is_empty());
        assert_eq!(materials(&rig, rig.impeller), vec![ORANGE, ORANGE]);
        let site = rig.app.world().get::<PlacementSiteComponent>(rig.root).unwrap();
        assert_eq!(site.0.state(), PlacementState::Idle);
        assert!(site.0.last_attempt().is_none());
    }

    #[test]
    fn overlap_without_site_is_ignored() {
        let mut rig = rig();
        let (candidate, impeller) = (rig.candidate, rig.impeller);
        rig.app.world_mut().send_event(PlacementOverlap {
            site: impeller,
            other: candidate,
            phase: OverlapPhase::Stay,
        });
        rig.app.update();
        assert_eq!(materials(&rig, impeller), vec![ORANGE, ORANGE]);
    }
}
