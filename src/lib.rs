//! Placement checks for replacement parts in a VR maintenance trainer.
//!
//! An outline part marks where a part must go. The user grabs the real part
//! and moves it into the outline. While the two overlap, a [`PlacementSite`]
//! compares the part's pose with the outline's and recolours the outline:
//! green when the part is close enough, red when it is not.
//!
//! The host engine is reached only through [`PartScene`]; [`PartTree`] is a
//! standalone implementation and [`plugin`] wires everything into bevy.
pub mod config;
pub mod error;
pub mod evaluator;
pub mod grab;
pub mod haptics;
pub mod math;
pub mod mode;
pub mod plugin;
pub mod scene;
pub mod signal;
pub mod snapshot;
pub mod tree;

pub use config::{PlacementConfig, PositionMetric, SiteMaterials, ThresholdConfig};
pub use error::PlacementError;
pub use evaluator::{OverlapPhase, PlacementAttempt, PlacementSite, PlacementState};
pub use math::{position_within_range, rotation_within_range, Pose};
pub use mode::{ModeConfig, ModePolicy, PartMode};
pub use plugin::PlacementPlugin;
pub use scene::{BodyFlags, ColliderFlags, MaterialSource, PartScene};
pub use tree::{PartNode, PartTree};
