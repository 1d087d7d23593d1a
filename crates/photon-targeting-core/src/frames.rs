//! Axis conventions at the solver boundary.
//!
//! Field, robot and camera poses use North-West-Up (NWU): x forward, y left,
//! z up. Image-space solvers use East-Down-North (EDN): x right, y down,
//! z forward along the optical axis. Every translation and rotation crossing
//! that boundary goes through the functions below, and each pair is an exact
//! inverse of the other.

use crate::{Pose3, Rot3, Vec3};
use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion};

/// Rotation mapping NWU coordinates into EDN coordinates.
pub fn nwu_to_edn() -> Rot3 {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(Matrix3::new(
        0.0, -1.0, 0.0, //
        0.0, 0.0, -1.0, //
        1.0, 0.0, 0.0,
    )))
}

/// Rotation mapping EDN coordinates into NWU coordinates.
pub fn edn_to_nwu() -> Rot3 {
    nwu_to_edn().inverse()
}

#[inline]
pub fn translation_nwu_to_edn(t: &Vec3) -> Vec3 {
    nwu_to_edn() * t
}

#[inline]
pub fn translation_edn_to_nwu(t: &Vec3) -> Vec3 {
    edn_to_nwu() * t
}

/// Express a rotation given in NWU axes in EDN axes (`N * R * N^-1`).
#[inline]
pub fn rotation_nwu_to_edn(r: &Rot3) -> Rot3 {
    let n = nwu_to_edn();
    n * r * n.inverse()
}

/// Express a rotation given in EDN axes in NWU axes (`N^-1 * R * N`).
#[inline]
pub fn rotation_edn_to_nwu(r: &Rot3) -> Rot3 {
    let n = nwu_to_edn();
    n.inverse() * r * n
}

/// Change of basis of a whole transform from NWU to EDN axes.
///
/// If `pose` maps points of frame A into frame B (both NWU), the result maps
/// the same points expressed in EDN axes.
pub fn pose_nwu_to_edn(pose: &Pose3) -> Pose3 {
    Isometry3::from_parts(
        Translation3::from(translation_nwu_to_edn(&pose.translation.vector)),
        rotation_nwu_to_edn(&pose.rotation),
    )
}

/// Inverse of [`pose_nwu_to_edn`].
pub fn pose_edn_to_nwu(pose: &Pose3) -> Pose3 {
    Isometry3::from_parts(
        Translation3::from(translation_edn_to_nwu(&pose.translation.vector)),
        rotation_edn_to_nwu(&pose.rotation),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose_from_xyz_rpy;
    use approx::assert_relative_eq;

    #[test]
    fn axes_map_as_expected() {
        // forward -> +z, left -> -x, up -> -y
        assert_relative_eq!(
            translation_nwu_to_edn(&Vec3::x()),
            Vec3::z(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            translation_nwu_to_edn(&Vec3::y()),
            -Vec3::x(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            translation_nwu_to_edn(&Vec3::z()),
            -Vec3::y(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn translation_round_trip_is_identity() {
        for t in [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-0.3, 0.0, 9.1),
            Vec3::new(1e-6, -4e3, 0.25),
        ] {
            assert_relative_eq!(
                translation_nwu_to_edn(&translation_edn_to_nwu(&t)),
                t,
                epsilon = 1e-9
            );
            assert_relative_eq!(
                translation_edn_to_nwu(&translation_nwu_to_edn(&t)),
                t,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn rotation_round_trip_is_identity() {
        for (r, p, y) in [(0.1, 0.2, 0.3), (-1.2, 0.4, 2.9), (0.0, -1.5, 0.0)] {
            let rot = UnitQuaternion::from_euler_angles(r, p, y);
            assert_relative_eq!(
                rotation_nwu_to_edn(&rotation_edn_to_nwu(&rot)),
                rot,
                epsilon = 1e-9
            );
            assert_relative_eq!(
                rotation_edn_to_nwu(&rotation_nwu_to_edn(&rot)),
                rot,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn pose_conversion_commutes_with_point_mapping() {
        let pose = pose_from_xyz_rpy(0.5, -1.0, 2.0, 0.3, -0.1, 1.2);
        let p = Vec3::new(0.2, 0.7, -0.4);
        let mapped_nwu = pose.transform_vector(&p) + pose.translation.vector;
        let edn = pose_nwu_to_edn(&pose);
        let p_edn = translation_nwu_to_edn(&p);
        let mapped_edn = edn.transform_vector(&p_edn) + edn.translation.vector;
        assert_relative_eq!(
            translation_edn_to_nwu(&mapped_edn),
            mapped_nwu,
            epsilon = 1e-12
        );
        assert_relative_eq!(pose_edn_to_nwu(&edn), pose, epsilon = 1e-12);
    }
}
