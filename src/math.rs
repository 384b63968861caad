use bevy::prelude::*;
use parry3d::bounding_volume::{Aabb, BoundingVolume};

use crate::error::PlacementError;

pub type Quaternion = Quat;
pub type Vector3 = Vec3;
pub type Scalar = f32;

/// Position and orientation of a part in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector3,
    pub rotation: Quaternion,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            rotation: Quaternion::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vector3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    pub fn from_translation(position: Vector3) -> Self {
        Self {
            position,
            ..default()
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            translation: self.position,
            rotation: self.rotation,
            scale: Vector3::ONE,
        }
    }
}

impl From<Transform> for Pose {
    fn from(t: Transform) -> Self {
        Self {
            position: t.translation,
            rotation: t.rotation,
        }
    }
}

impl From<&GlobalTransform> for Pose {
    fn from(t: &GlobalTransform) -> Self {
        let (_scale, rotation, position) = t.to_scale_rotation_translation();
        Self { position, rotation }
    }
}

/// Slack allowed when comparing an angle with a threshold.
///
/// An orientation authored as exactly `d` degrees comes back from f32
/// quaternion arithmetic a few ten-thousandths of a degree off, so a
/// rotation of exactly the threshold still counts as within range.
pub const ANGLE_TOLERANCE_DEGREES: Scalar = 1e-3;

/// Shortest angle between two orientations in degrees.
///
/// `q` and `-q` describe the same orientation, so the angle never exceeds
/// 180 degrees.
pub fn angle_between_degrees(a: Quaternion, b: Quaternion) -> Scalar {
    // atan2 of the relative rotation stays accurate near zero, where acos of
    // the dot product does not.
    let r = a.conjugate() * b;
    (2.0 * r.xyz().length().atan2(r.w.abs())).to_degrees()
}

/// True iff `delta_degrees` is at most `max_degrees`, within
/// [`ANGLE_TOLERANCE_DEGREES`].
pub fn degrees_within(delta_degrees: Scalar, max_degrees: Scalar) -> bool {
    delta_degrees <= max_degrees + ANGLE_TOLERANCE_DEGREES
}

/// True iff the shortest angle between `a` and `b` is at most `max_degrees`.
pub fn rotation_within_range(a: Quaternion, b: Quaternion, max_degrees: Scalar) -> bool {
    degrees_within(angle_between_degrees(a, b), max_degrees)
}

/// True iff the Euclidean distance between `a` and `b` is at most
/// `max_meters`.
pub fn position_within_range(a: Vector3, b: Vector3, max_meters: Scalar) -> bool {
    a.distance(b) <= max_meters
}

fn point(v: Vector3) -> parry3d::math::Point<Scalar> {
    parry3d::math::Point::new(v.x, v.y, v.z)
}

pub fn aabb_center(aabb: &Aabb) -> Vector3 {
    let c = aabb.center();
    Vector3::new(c.x, c.y, c.z)
}

/// World-space bounds of a box with the given half extents placed at `pose`.
pub fn world_aabb(pose: &Pose, half_extents: Vector3) -> Aabb {
    let m = Mat3::from_quat(pose.rotation);
    let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
    let extents = abs * half_extents.abs();
    Aabb::new(point(pose.position - extents), point(pose.position + extents))
}

/// Union of all the given bounds.
///
/// An empty sequence has no meaningful bounds and is reported as
/// [`PlacementError::EmptySubtree`].
pub fn grouped_bounds(bounds: impl IntoIterator<Item = Aabb>) -> Result<Aabb, PlacementError> {
    let mut iter = bounds.into_iter();
    let first = iter.next().ok_or(PlacementError::EmptySubtree)?;
    Ok(iter.fold(first, |acc, b| acc.merged(&b)))
}

#[cfg(test)]
mod test {
    use super::*;
    use core::f32::consts::PI;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn identical_rotation() {
        let q = Quat::from_axis_angle(Vec3::Y, 0.3);
        assert!(rotation_within_range(q, q, 0.1));
        assert!(rotation_within_range(Quat::IDENTITY, Quat::IDENTITY, 0.0));
    }

    #[test]
    fn rotation_sign_ignored() {
        let q = Quat::from_axis_angle(Vec3::X, PI / 3.0);
        assert!(angle_between_degrees(q, -q) < 0.01);
    }

    #[test]
    fn rotation_boundary_inclusive() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::Z, 10f32.to_radians());
        assert!(rotation_within_range(a, b, 10.0));
        assert!(!rotation_within_range(a, b, 9.99));
    }

    #[test]
    fn authored_angles_at_threshold() {
        let tilt = Quat::from_axis_angle(Vec3::X, 0.3);
        for degrees in 1..180 {
            let degrees = degrees as f32;
            for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
                let b = Quat::from_axis_angle(axis, degrees.to_radians());
                let at = rotation_within_range(Quat::IDENTITY, b, degrees);
                assert!(at, "{degrees} about {axis}");
                assert!(rotation_within_range(tilt, tilt * b, degrees), "{degrees} about {axis}");
                let past = Quat::from_axis_angle(axis, (degrees + 0.01).to_radians());
                let beyond = rotation_within_range(Quat::IDENTITY, past, degrees);
                assert!(!beyond, "{degrees} about {axis}");
            }
        }
    }

    #[test]
    fn rotation_sweep() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let axis =
                Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 1.0).normalize();
            let degrees: f32 = rng.gen_range(0.0..170.0);
            let a = Quat::from_axis_angle(Vec3::Y, rng.gen_range(0.0..PI));
            let b = a * Quat::from_axis_angle(axis, degrees.to_radians());
            let threshold: f32 = rng.gen_range(0.0..180.0);
            if degrees + 0.05 < threshold {
                assert!(rotation_within_range(a, b, threshold), "{degrees} <= {threshold}");
            } else if degrees > threshold + 0.05 {
                assert!(!rotation_within_range(a, b, threshold), "{degrees} > {threshold}");
            }
        }
    }

    #[test]
    fn position_boundary_inclusive() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(1.0, 2.1, 3.0);
        let d = a.distance(b);
        assert!(position_within_range(a, b, d));
        assert!(!position_within_range(a, b, d - 0.001));
        assert!(position_within_range(a, a, 0.0));
    }

    #[test]
    fn rotated_box_bounds() {
        let pose = Pose::new(Vec3::X, Quat::from_axis_angle(Vec3::Y, PI / 2.0));
        let aabb = world_aabb(&pose, Vec3::new(2.0, 1.0, 0.5));
        assert!((aabb.maxs.x - 1.5).abs() < 1e-5);
        assert!((aabb.maxs.z - 2.0).abs() < 1e-5);
        assert!((aabb_center(&aabb) - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn grouped_bounds_union() {
        let a = world_aabb(&Pose::from_translation(Vec3::ZERO), Vec3::splat(0.5));
        let b = world_aabb(&Pose::from_translation(Vec3::new(2.0, 0.0, 0.0)), Vec3::splat(0.5));
        let g = grouped_bounds([a, b]).unwrap();
        assert_eq!(aabb_center(&g), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn grouped_bounds_empty() {
        assert!(matches!(grouped_bounds(Vec::<Aabb>::new()), Err(PlacementError::EmptySubtree)));
    }
}
