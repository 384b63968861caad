use crate::{error::PlacementError, mode::*, scene::MaterialSource};
use serde::{Deserialize, Serialize};
use std::{fs, num::NonZeroU32, path::Path};

pub const DEFAULT_OUTLINE_MATERIAL: &str = "OutlineMatOrange";
pub const ACCEPTABLE_MATERIAL: &str = "OutlineMatGreen";
pub const UNACCEPTABLE_MATERIAL: &str = "OutlineMatRed";

/// How far apart a candidate and its target may be is measured between...
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionMetric {
    /// ...the centres of the two matching colliders.
    #[default]
    ColliderCenters,
    /// ...the centres of the grouped renderer bounds of the whole site and
    /// of the whole candidate.
    GroupedBounds,
}

/// Material names; unset entries fall back to the stock outline materials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialNames {
    pub default_outline: Option<String>,
    pub acceptable: Option<String>,
    pub unacceptable: Option<String>,
}

/// The three outline materials a site switches between.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteMaterials<M> {
    pub default_outline: M,
    pub acceptable: M,
    pub unacceptable: M,
}

impl MaterialNames {
    pub fn resolve<S>(&self, source: &S) -> Result<SiteMaterials<S::Material>, PlacementError>
    where
        S: MaterialSource + ?Sized,
    {
        let lookup = |name: &Option<String>, fallback: &str| {
            let name = name.as_deref().unwrap_or(fallback);
            source
                .named_material(name)
                .ok_or_else(|| PlacementError::MissingMaterial(name.to_owned()))
        };
        Ok(SiteMaterials {
            default_outline: lookup(&self.default_outline, DEFAULT_OUTLINE_MATERIAL)?,
            acceptable: lookup(&self.acceptable, ACCEPTABLE_MATERIAL)?,
            unacceptable: lookup(&self.unacceptable, UNACCEPTABLE_MATERIAL)?,
        })
    }
}

/// Tunable parameters of one placement site, as authored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub part_mode: PartMode,
    pub check_rotation: bool,
    /// Allowed deviation from a perfect rotation match, in degrees.
    pub acceptable_degrees: f32,
    pub check_position: bool,
    /// Allowed deviation from a perfect overlap, in meters.
    pub acceptable_meters: f32,
    /// Overlap ticks between two placement checks.
    pub frame_skip: u32,
    pub position_metric: PositionMetric,
    pub materials: MaterialNames,
    pub policy: ModePolicy,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            part_mode: PartMode::Unchanged,
            check_rotation: true,
            acceptable_degrees: 10.0,
            check_position: true,
            acceptable_meters: 0.1,
            frame_skip: 30,
            position_metric: PositionMetric::default(),
            materials: MaterialNames::default(),
            policy: ModePolicy::default(),
        }
    }
}

/// Validated thresholds, fixed for the life of a site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdConfig {
    pub acceptable_degrees: f32,
    pub acceptable_meters: f32,
    pub check_rotation: bool,
    pub check_position: bool,
    pub frame_skip: NonZeroU32,
}

impl PlacementConfig {
    pub fn with_mode(mode: PartMode) -> Self {
        Self {
            part_mode: mode,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<ThresholdConfig, PlacementError> {
        let non_negative = |name: &'static str, value: f32| {
            // Also rejects NaN.
            if value >= 0.0 {
                Ok(value)
            } else {
                Err(PlacementError::NegativeThreshold { name, value })
            }
        };
        Ok(ThresholdConfig {
            acceptable_degrees: non_negative("acceptable_degrees", self.acceptable_degrees)?,
            acceptable_meters: non_negative("acceptable_meters", self.acceptable_meters)?,
            check_rotation: self.check_rotation,
            check_position: self.check_position,
            frame_skip: NonZeroU32::new(self.frame_skip).ok_or(PlacementError::InvalidFrameSkip)?,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, PlacementError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlacementError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PlacementError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, PlacementError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
