//! Picking parts up with a VR hand.
//!
//! The VR toolkit owns the hands. A [`Grabbable`] only decides, once per
//! hover update, whether to ask the hovering hand to attach or detach its
//! part.
use crate::{
    haptics::{vibrate_controller, HandId, HapticPulse, HapticSink, TaskQueue},
    mode::PartMode,
};
use bevy::log::debug;

/// How a grab was started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrabType {
    #[default]
    None,
    Trigger,
    Pinch,
    Grip,
    Scripted,
}

/// Options a hand honours when attaching an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentFlags {
    /// Move the object into the hand's attachment point.
    pub snap_on_attach: bool,
    /// Drop anything else the hand holds.
    pub detach_others: bool,
    /// Take the object from any other hand holding it.
    pub detach_from_other_hand: bool,
    pub turn_on_kinematic: bool,
    pub parent_to_hand: bool,
    /// Drive the object through physics velocities instead of moving it.
    pub velocity_movement: bool,
}

impl Default for AttachmentFlags {
    fn default() -> Self {
        Self {
            snap_on_attach: true,
            detach_others: true,
            detach_from_other_hand: true,
            turn_on_kinematic: true,
            parent_to_hand: true,
            velocity_movement: false,
        }
    }
}

impl AttachmentFlags {
    /// Attach where the hand touched the part, alongside anything else held,
    /// following the hand directly.
    pub fn part_grab() -> Self {
        Self {
            snap_on_attach: false,
            detach_others: false,
            velocity_movement: false,
            ..Self::default()
        }
    }
}

/// What this crate needs from a VR hand.
pub trait Hand<Id> {
    fn id(&self) -> HandId;
    /// The grab that began this frame, if any.
    fn grab_starting(&self) -> GrabType;
    fn is_grab_ending(&self, part: Id) -> bool;
    /// Keep hovering `part` exclusively until unlocked.
    fn hover_lock(&mut self, part: Id);
    fn hover_unlock(&mut self, part: Id);
    fn attach(&mut self, part: Id, grab: GrabType, flags: AttachmentFlags);
    fn detach(&mut self, part: Id);
}

/// Hand interaction state of one part.
#[derive(Clone, Debug)]
pub struct Grabbable<Id> {
    part: Id,
    mode: PartMode,
    pub enabled: bool,
    pub highlight_on_hover: bool,
    attached_to: Option<HandId>,
    flags: AttachmentFlags,
}

impl<Id: Copy + std::fmt::Debug> Grabbable<Id> {
    /// Outline parts are markers, not props; they ignore hands.
    pub fn new(part: Id, mode: PartMode) -> Self {
        let interactive = mode != PartMode::OutlinePart;
        Self {
            part,
            mode,
            enabled: interactive,
            highlight_on_hover: interactive,
            attached_to: None,
            flags: AttachmentFlags::part_grab(),
        }
    }

    pub fn part(&self) -> Id {
        self.part
    }

    pub fn attached_to(&self) -> Option<HandId> {
        self.attached_to
    }

    pub fn flags(&self) -> AttachmentFlags {
        self.flags
    }

    /// A hand started hovering over the part: buzz it.
    pub fn on_hover_begin<Q>(&self, hand: HandId, tasks: &mut Q)
    where
        Q: TaskQueue<dyn HapticSink> + ?Sized,
    {
        if self.enabled {
            vibrate_controller(tasks, hand, HapticPulse::HOVER);
        }
    }

    /// Called every frame while `hand` hovers over the part.
    pub fn hover_update<H: Hand<Id> + ?Sized>(&mut self, hand: &mut H) {
        if !self.enabled || self.mode != PartMode::InteractablePart {
            return;
        }
        let starting = hand.grab_starting();
        if self.attached_to.is_none() && starting != GrabType::None {
            hand.hover_lock(self.part);
            hand.attach(self.part, starting, self.flags);
            self.attached_to = Some(hand.id());
            debug!("hand {} grabbed {:?}", hand.id(), self.part);
        } else if hand.is_grab_ending(self.part) {
            hand.detach(self.part);
            hand.hover_unlock(self.part);
            if self.attached_to == Some(hand.id()) {
                self.attached_to = None;
            }
            debug!("hand {} released {:?}", hand.id(), self.part);
        }
    }
}
