//! Deciding whether a replacement part sits where its outline says it should.
//!
//! A [`PlacementSite`] lives on the root of an outline part. The host reports
//! every overlap between the outline's trigger volume and another object.
//! When that object carries the name of one of the outline's parts it is a
//! candidate replacement. Every `frame_skip` overlap ticks the candidate's
//! rotation is compared with the one recorded for its counterpart at start up,
//! and its position with where the counterpart's collider is now. The outline
//! then turns green or red and the matching notification fires.
//! Leaving the trigger volume puts the outline back to its default look.
use crate::{
    config::*, error::PlacementError, math::*, mode::*, scene::*, signal::Signal, snapshot::*,
};
use bevy::log::{debug, info, warn};
use parry3d::bounding_volume::Aabb;
use std::{fmt::Debug, hash::Hash, num::NonZeroU32};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlacementState {
    #[default]
    Idle,
    Evaluating,
    Accepted,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapPhase {
    Enter,
    Stay,
    Exit,
}

/// One comparison of a candidate against its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementAttempt {
    pub candidate_pose: Pose,
    pub target_pose: Pose,
    /// Degrees.
    pub rotation_delta: Scalar,
    /// Meters.
    pub position_delta: Scalar,
    pub rotation_acceptable: bool,
    pub position_acceptable: bool,
    pub check_rotation: bool,
    pub check_position: bool,
}

impl PlacementAttempt {
    pub fn accepted(&self) -> bool {
        (!self.check_rotation || self.rotation_acceptable)
            && (!self.check_position || self.position_acceptable)
    }
}

/// Lets one overlap tick in every `frame_skip` through.
#[derive(Clone, Copy, Debug)]
pub struct Throttle {
    frame_skip: NonZeroU32,
    count: u32,
}

impl Throttle {
    pub fn new(frame_skip: NonZeroU32) -> Self {
        Self {
            frame_skip,
            count: 0,
        }
    }

    /// Count a tick. True when this tick should be evaluated.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.frame_skip.get() {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

pub struct PlacementSite<Id, M> {
    root: Id,
    mode: PartMode,
    thresholds: ThresholdConfig,
    metric: PositionMetric,
    policy: ModePolicy,
    materials: SiteMaterials<M>,
    snapshot: SnapshotStore<Id, M>,
    throttle: Throttle,
    state: PlacementState,
    rotation_acceptable: bool,
    position_acceptable: bool,
    last_attempt: Option<PlacementAttempt>,
    /// Grouped bounds of the site itself; `None` when stale.
    group_bounds: Option<Aabb>,
    on_acceptable: Signal<PlacementAttempt>,
    on_unacceptable: Signal<PlacementAttempt>,
}

impl<Id: Debug, M: Debug> Debug for PlacementSite<Id, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementSite")
            .field("root", &self.root)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("thresholds", &self.thresholds)
            .field("last_attempt", &self.last_attempt)
            .finish_non_exhaustive()
    }
}

impl<Id, M> PlacementSite<Id, M>
where
    Id: Copy + Eq + Hash + Debug,
    M: Clone + PartialEq + Debug,
{
    /// Snapshot the hierarchy under `root` and configure it for
    /// `config.part_mode`.
    pub fn new<S>(
        scene: &mut S,
        root: Id,
        config: &PlacementConfig,
        materials: SiteMaterials<M>,
    ) -> Result<Self, PlacementError>
    where
        S: PartScene<Id = Id, Material = M>,
    {
        let thresholds = config.validate()?;
        let snapshot = SnapshotStore::capture_all(scene, root);
        let site = Self {
            root,
            mode: config.part_mode,
            thresholds,
            metric: config.position_metric,
            policy: config.policy,
            materials,
            snapshot,
            throttle: Throttle::new(thresholds.frame_skip),
            state: PlacementState::Idle,
            rotation_acceptable: false,
            position_acceptable: false,
            last_attempt: None,
            group_bounds: None,
            on_acceptable: Signal::default(),
            on_unacceptable: Signal::default(),
        };
        site.applier().apply_subtree(scene, root, site.mode);
        info!(
            "placement site {root:?} ready as {:?} with {} parts",
            site.mode,
            site.snapshot.parts().len()
        );
        Ok(site)
    }

    /// Like [`PlacementSite::new`], resolving the materials by name.
    pub fn with_material_source<S, L>(
        scene: &mut S,
        root: Id,
        config: &PlacementConfig,
        library: &L,
    ) -> Result<Self, PlacementError>
    where
        S: PartScene<Id = Id, Material = M>,
        L: MaterialSource<Material = M> + ?Sized,
    {
        let materials = config.materials.resolve(library)?;
        Self::new(scene, root, config, materials)
    }

    fn applier(&self) -> ModeApplier<'_, Id, M> {
        ModeApplier {
            snapshot: &self.snapshot,
            outline: &self.materials.default_outline,
            policy: self.policy,
        }
    }

    pub fn root(&self) -> Id {
        self.root
    }

    pub fn mode(&self) -> PartMode {
        self.mode
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn snapshot(&self) -> &SnapshotStore<Id, M> {
        &self.snapshot
    }

    pub fn materials(&self) -> &SiteMaterials<M> {
        &self.materials
    }

    pub fn rotation_acceptable(&self) -> bool {
        self.rotation_acceptable
    }

    pub fn position_acceptable(&self) -> bool {
        self.position_acceptable
    }

    pub fn last_attempt(&self) -> Option<&PlacementAttempt> {
        self.last_attempt.as_ref()
    }

    /// Fired after an acceptable placement turned the outline green.
    pub fn on_acceptable_placement(&mut self) -> &mut Signal<PlacementAttempt> {
        &mut self.on_acceptable
    }

    /// Fired after an unacceptable placement turned the outline red.
    pub fn on_unacceptable_placement(&mut self) -> &mut Signal<PlacementAttempt> {
        &mut self.on_unacceptable
    }

    /// Switch the whole site to another mode at runtime.
    pub fn set_mode<S>(&mut self, scene: &mut S, mode: PartMode)
    where
        S: PartScene<Id = Id, Material = M>,
    {
        self.mode = mode;
        self.clear();
        self.applier().apply_subtree(scene, self.root, mode);
        info!("placement site {:?} switched to {mode:?}", self.root);
    }

    /// Put the captured materials back on every part of the site.
    pub fn restore_original_materials<S>(&self, scene: &mut S)
    where
        S: PartScene<Id = Id, Material = M>,
    {
        for &id in self.snapshot.parts() {
            if let Some(materials) = self.snapshot.restore_materials(id) {
                if scene.materials(id).is_some() {
                    scene.set_materials(id, materials.to_vec());
                }
            }
        }
    }

    /// Feed one overlap callback from the host.
    ///
    /// Returns the attempt when this tick ran an evaluation.
    pub fn handle_overlap<S>(
        &mut self,
        scene: &mut S,
        other: Id,
        phase: OverlapPhase,
    ) -> Result<Option<PlacementAttempt>, PlacementError>
    where
        S: PartScene<Id = Id, Material = M>,
    {
        match phase {
            OverlapPhase::Enter | OverlapPhase::Stay => self.overlap_tick(scene, other),
            OverlapPhase::Exit => {
                self.overlap_exit(scene);
                Ok(None)
            }
        }
    }

    fn overlap_tick<S>(
        &mut self,
        scene: &mut S,
        other: Id,
    ) -> Result<Option<PlacementAttempt>, PlacementError>
    where
        S: PartScene<Id = Id, Material = M>,
    {
        if self.mode != PartMode::OutlinePart || self.snapshot.contains(other) {
            return Ok(None);
        }
        let counterpart = scene
            .name(other)
            .and_then(|name| self.snapshot.counterpart(name));
        let Some(counterpart) = counterpart else {
            return Ok(None);
        };
        if !self.throttle.tick() {
            return Ok(None);
        }

        let Some(attempt) = self.evaluate(scene, counterpart, other) else {
            debug!("placement {other:?} vs {counterpart:?}: no pose, skipped");
            return Ok(None);
        };
        self.state = PlacementState::Evaluating;
        self.rotation_acceptable = attempt.rotation_acceptable;
        self.position_acceptable = attempt.position_acceptable;
        self.last_attempt = Some(attempt);
        debug!(
            "placement {other:?} vs {counterpart:?}: {:.2} deg ({}), {:.3} m ({})",
            attempt.rotation_delta,
            attempt.rotation_acceptable,
            attempt.position_delta,
            attempt.position_acceptable
        );

        let accepted = attempt.accepted();
        let material = if accepted {
            &self.materials.acceptable
        } else {
            &self.materials.unacceptable
        };
        for &id in self.snapshot.parts() {
            fill_materials(scene, id, material);
        }
        let next = if accepted {
            PlacementState::Accepted
        } else {
            PlacementState::Rejected
        };
        if next != self.state {
            info!("placement site {:?} -> {next:?}", self.root);
        }
        self.state = next;

        let signal = if accepted {
            &mut self.on_acceptable
        } else {
            &mut self.on_unacceptable
        };
        signal.emit(&attempt).map_err(PlacementError::Listener)?;
        Ok(Some(attempt))
    }

    fn overlap_exit<S>(&mut self, scene: &mut S)
    where
        S: PartScene<Id = Id, Material = M>,
    {
        if self.state != PlacementState::Idle {
            info!("placement site {:?} -> Idle", self.root);
        }
        self.clear();
        if self.mode == PartMode::OutlinePart {
            for &id in self.snapshot.parts() {
                fill_materials(scene, id, &self.materials.default_outline);
            }
        }
    }

    fn clear(&mut self) {
        self.state = PlacementState::Idle;
        self.rotation_acceptable = false;
        self.position_acceptable = false;
        self.group_bounds = None;
    }

    /// Compare `candidate` with `counterpart`.
    ///
    /// Rotation is measured against the pose recorded for `counterpart` at
    /// start up, position against where its collider is now. Returns `None`
    /// when either side has no pose to compare.
    pub fn evaluate<S>(
        &mut self,
        scene: &S,
        counterpart: Id,
        candidate: Id,
    ) -> Option<PlacementAttempt>
    where
        S: PartScene<Id = Id, Material = M>,
    {
        let target = self.snapshot.original(counterpart)?;
        let target_pose = target.pose?;
        let target_center = scene
            .collider_bounds(counterpart)
            .map(|b| aabb_center(&b))
            .or(target.collider_center)
            .or_else(|| scene.pose(counterpart).map(|p| p.position))
            .unwrap_or(target_pose.position);
        let candidate_pose = scene.pose(candidate)?;
        let candidate_center = scene
            .collider_bounds(candidate)
            .map(|b| aabb_center(&b))
            .unwrap_or(candidate_pose.position);

        let max_degrees = self.thresholds.acceptable_degrees;
        let max_meters = self.thresholds.acceptable_meters;
        let rotation_delta = angle_between_degrees(target_pose.rotation, candidate_pose.rotation);
        let position_delta = match self.metric {
            PositionMetric::ColliderCenters => target_center.distance(candidate_center),
            PositionMetric::GroupedBounds => match self.group_center_distance(scene, candidate) {
                Ok(distance) => distance,
                Err(e) => {
                    warn!("{e}; comparing collider centres of {candidate:?} instead");
                    target_center.distance(candidate_center)
                }
            },
        };

        Some(PlacementAttempt {
            candidate_pose,
            target_pose,
            rotation_delta,
            position_delta,
            rotation_acceptable: degrees_within(rotation_delta, max_degrees),
            position_acceptable: position_delta <= max_meters,
            check_rotation: self.thresholds.check_rotation,
            check_position: self.thresholds.check_position,
        })
    }

    /// Distance between the centre of the site's grouped bounds and the
    /// centre of the grouped bounds below `candidate`.
    ///
    /// The site's own bounds are cached until the next overlap exit.
    pub fn group_center_distance<S>(
        &mut self,
        scene: &S,
        candidate: Id,
    ) -> Result<Scalar, PlacementError>
    where
        S: PartScene<Id = Id, Material = M>,
    {
        let own = match self.group_bounds {
            Some(bounds) => bounds,
            None => {
                let bounds = grouped_bounds(
                    self.snapshot
                        .parts()
                        .iter()
                        .filter_map(|&id| scene.renderer_bounds(id)),
                )?;
                self.group_bounds = Some(bounds);
                bounds
            }
        };
        let theirs = grouped_bounds(
            scene
                .subtree(candidate)
                .into_iter()
                .filter_map(|id| scene.renderer_bounds(id)),
        )?;
        Ok(aabb_center(&own).distance(aabb_center(&theirs)))
    }
}
