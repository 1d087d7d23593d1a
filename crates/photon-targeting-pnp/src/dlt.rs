//! Direct linear transform initialization for non-planar point sets.
//!
//! Linear least-squares estimate of `[R | t]` from homogeneous equations;
//! the rotation is projected onto SO(3) afterwards.

use crate::error::PnpError;
use crate::ippe::project_to_so3;
use nalgebra::{DMatrix, Isometry3, Matrix3x4, Matrix4, Translation3, UnitQuaternion};
use photon_targeting_core::{Pose3, Pt2, Pt3};

/// Pose mapping `world` points into the camera frame of `image`
/// (normalized, undistorted coordinates). Needs at least 6 points.
pub(crate) fn dlt(world: &[Pt3], image: &[Pt2]) -> Result<Pose3, PnpError> {
    let n = world.len();
    if image.len() != n {
        return Err(PnpError::LengthMismatch {
            object: n,
            image: image.len(),
        });
    }
    if n < 6 {
        return Err(PnpError::NotEnoughPoints { needed: 6, got: n });
    }

    let nf = n as f64;
    let c = world.iter().fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords) / nf;
    let mean_dist = world.iter().map(|p| (p.coords - c).norm()).sum::<f64>() / nf;
    if mean_dist <= f64::EPSILON {
        return Err(PnpError::Degenerate("coincident 3d points"));
    }

    let scale = 3.0_f64.sqrt() / mean_dist;
    let t_world = Matrix4::new(
        scale, 0.0, 0.0, -scale * c.x, //
        0.0, scale, 0.0, -scale * c.y, //
        0.0, 0.0, scale, -scale * c.z, //
        0.0, 0.0, 0.0, 1.0,
    );

    // 2n x 12 system for P = [R | t] in normalized image coordinates.
    let rows = (2 * n).max(12);
    let mut a = DMatrix::<f64>::zeros(rows, 12);
    for (i, (pw, m)) in world.iter().zip(image).enumerate() {
        let d = (pw.coords - c) * scale;
        let (x, y, z) = (d.x, d.y, d.z);
        let (u, v) = (m.x, m.y);

        let r0 = 2 * i;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = z;
        a[(r0, 3)] = 1.0;
        a[(r0, 8)] = -u * x;
        a[(r0, 9)] = -u * y;
        a[(r0, 10)] = -u * z;
        a[(r0, 11)] = -u;

        let r1 = 2 * i + 1;
        a[(r1, 4)] = x;
        a[(r1, 5)] = y;
        a[(r1, 6)] = z;
        a[(r1, 7)] = 1.0;
        a[(r1, 8)] = -v * x;
        a[(r1, 9)] = -v * y;
        a[(r1, 10)] = -v * z;
        a[(r1, 11)] = -v;
    }

    let svd = a.svd(true, true);
    let v_t = svd.v_t.ok_or(PnpError::Degenerate("svd failed in DLT"))?;
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))
        .ok_or(PnpError::Degenerate("empty DLT system"))?;
    let h = v_t.row(min_idx);
    let p_norm = Matrix3x4::from_row_slice(&[
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8], h[9], h[10], h[11],
    ]);
    let p = p_norm * t_world;

    let mut m = p.fixed_view::<3, 3>(0, 0).into_owned();
    let mut s = (m.row(0).norm() + m.row(1).norm() + m.row(2).norm()) / 3.0;
    if m.determinant() < 0.0 {
        s = -s;
    }
    if s.abs() <= f64::EPSILON {
        return Err(PnpError::Degenerate("vanishing DLT scale"));
    }
    m /= s;
    let r = project_to_so3(m)?;
    let t = p.column(3).into_owned() / s;

    Ok(Isometry3::from_parts(
        Translation3::from(t),
        UnitQuaternion::from_rotation_matrix(&r),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Point3};

    #[test]
    fn dlt_recovers_pose_synthetic() {
        let gt = Isometry3::from_parts(
            Translation3::new(0.1, -0.05, 1.0),
            UnitQuaternion::from_euler_angles(0.1, -0.05, 0.2),
        );

        let mut world = Vec::new();
        let mut image = Vec::new();
        for z in 0..2 {
            for y in 0..3 {
                for x in 0..4 {
                    let pw = Point3::new(x as f64 * 0.1, y as f64 * 0.1, 0.5 + z as f64 * 0.1);
                    let pc = gt.transform_point(&pw);
                    world.push(pw);
                    image.push(Point2::new(pc.x / pc.z, pc.y / pc.z));
                }
            }
        }

        let est = dlt(&world, &image).expect("dlt");
        let dt = (est.translation.vector - gt.translation.vector).norm();
        let ang = est.rotation.angle_to(&gt.rotation);
        assert!(dt < 1e-6, "translation error too large: {dt}");
        assert!(ang < 1e-6, "rotation error too large: {ang}");
    }

    #[test]
    fn too_few_points() {
        let world = vec![Point3::new(0.0, 0.0, 1.0); 5];
        let image = vec![Point2::new(0.0, 0.0); 5];
        assert_eq!(
            dlt(&world, &image),
            Err(PnpError::NotEnoughPoints { needed: 6, got: 5 })
        );
    }
}
