//! Linear algebra aliases and small rigid-transform helpers.
//!
//! Rigid transforms are `nalgebra::Isometry3<f64>`: a translation plus a unit
//! quaternion, so the rotation is normalized by construction. Composition is
//! `a * b`, inversion is `a.inverse()`, and "`b` relative to `a`" is
//! `a.inverse() * b`.

use nalgebra::{Isometry3, Point2, Point3, Translation3, UnitQuaternion, Vector3};

/// Rigid 3D transform (translation in meters + rotation).
pub type Pose3 = Isometry3<f64>;
/// Unit quaternion rotation.
pub type Rot3 = UnitQuaternion<f64>;
/// 3D vector.
pub type Vec3 = Vector3<f64>;
/// 2D point (pixels or normalized image coordinates).
pub type Pt2 = Point2<f64>;
/// 3D point.
pub type Pt3 = Point3<f64>;

/// Build a pose from a translation and roll/pitch/yaw angles (radians).
///
/// Angles follow the extrinsic X-Y-Z convention of
/// `UnitQuaternion::from_euler_angles`.
pub fn pose_from_xyz_rpy(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Pose3 {
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(roll, pitch, yaw),
    )
}

/// Euclidean distance between the translation parts of two poses.
#[inline]
pub fn translation_distance(a: &Pose3, b: &Pose3) -> f64 {
    (a.translation.vector - b.translation.vector).norm()
}

/// Angle (radians, `[0, pi]`) of the rotation taking `a` to `b`.
#[inline]
pub fn rotation_angle_between(a: &Rot3, b: &Rot3) -> f64 {
    a.angle_to(b)
}
