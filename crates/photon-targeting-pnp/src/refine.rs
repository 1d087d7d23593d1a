//! Levenberg-Marquardt pose refinement in normalized image coordinates.

use nalgebra::{Isometry3, Matrix6, Translation3, UnitQuaternion, Vector3, Vector6};
use photon_targeting_core::{Pose3, Pt2, Pt3};

const MAX_ITERS: usize = 50;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e10;

fn squared_error(pose: &Pose3, object: &[Pt3], image: &[Pt2]) -> f64 {
    object
        .iter()
        .zip(image)
        .map(|(x, m)| {
            let p = pose * x;
            let du = m.x - p.x / p.z;
            let dv = m.y - p.y / p.z;
            du * du + dv * dv
        })
        .sum()
}

/// Apply a left-multiplied twist: `R' = exp(w) R`, `t' = exp(w) t + dt`.
fn apply_update(pose: &Pose3, delta: &Vector6<f64>) -> Pose3 {
    let dw = Vector3::new(delta[0], delta[1], delta[2]);
    let dt = Vector3::new(delta[3], delta[4], delta[5]);
    let q = UnitQuaternion::new(dw);
    Isometry3::from_parts(
        Translation3::from(q * pose.translation.vector + dt),
        q * pose.rotation,
    )
}

/// Minimize the squared reprojection error of `object` against `image`.
///
/// Never returns a pose with a larger error than `init`. Points must be in
/// front of the camera at `init`; otherwise `init` is returned untouched.
pub(crate) fn refine_pose(init: &Pose3, object: &[Pt3], image: &[Pt2]) -> Pose3 {
    let mut pose = *init;
    let mut err = squared_error(&pose, object, image);
    if !err.is_finite() {
        return pose;
    }
    let mut lambda = LAMBDA_INIT;

    for _ in 0..MAX_ITERS {
        let mut jtj = Matrix6::<f64>::zeros();
        let mut jtr = Vector6::<f64>::zeros();
        for (x, m) in object.iter().zip(image) {
            let p = (pose * x).coords;
            if p.z <= 1e-9 {
                return pose;
            }
            let iz = 1.0 / p.z;
            let g_u = Vector3::new(iz, 0.0, -p.x * iz * iz);
            let g_v = Vector3::new(0.0, iz, -p.y * iz * iz);
            let r_u = m.x - p.x * iz;
            let r_v = m.y - p.y * iz;

            for (g, r) in [(g_u, r_u), (g_v, r_v)] {
                let dr = p.cross(&g);
                let row = Vector6::new(dr.x, dr.y, dr.z, g.x, g.y, g.z);
                jtj += row * row.transpose();
                jtr += row * r;
            }
        }

        let mut improved = false;
        while lambda < LAMBDA_MAX {
            let mut a = jtj;
            for i in 0..6 {
                a[(i, i)] += lambda * (1.0 + jtj[(i, i)]);
            }
            let Some(delta) = a.cholesky().map(|c| c.solve(&jtr)) else {
                lambda *= 10.0;
                continue;
            };
            let candidate = apply_update(&pose, &delta);
            let cand_err = squared_error(&candidate, object, image);
            if cand_err.is_finite() && cand_err < err {
                let gain = err - cand_err;
                pose = candidate;
                err = cand_err;
                lambda = (lambda / 10.0).max(1e-12);
                improved = true;
                if delta.norm() < 1e-12 || gain <= 1e-15 * err.max(1e-300) {
                    return pose;
                }
                break;
            }
            lambda *= 10.0;
        }
        if !improved {
            break;
        }
    }
    pose
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Point3};

    #[test]
    fn converges_from_perturbed_start() {
        let gt = Isometry3::from_parts(
            Translation3::new(0.2, 0.1, 2.0),
            UnitQuaternion::from_euler_angles(0.2, -0.4, 0.1),
        );
        let object: Vec<Pt3> = [
            (-0.2, -0.2, 0.0),
            (0.2, -0.2, 0.0),
            (0.2, 0.2, 0.0),
            (-0.2, 0.2, 0.0),
            (0.0, 0.0, 0.3),
            (0.1, -0.1, 0.2),
        ]
        .iter()
        .map(|&(x, y, z)| Point3::new(x, y, z))
        .collect();
        let image: Vec<Pt2> = object
            .iter()
            .map(|p| {
                let c = gt * p;
                Point2::new(c.x / c.z, c.y / c.z)
            })
            .collect();

        let start = apply_update(
            &gt,
            &Vector6::new(0.05, -0.03, 0.02, 0.05, -0.04, 0.1),
        );
        let refined = refine_pose(&start, &object, &image);
        assert!((refined.translation.vector - gt.translation.vector).norm() < 1e-8);
        assert!(refined.rotation.angle_to(&gt.rotation) < 1e-8);
    }
}
