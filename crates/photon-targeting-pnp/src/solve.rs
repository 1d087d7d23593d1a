//! Public PnP entry points and projection helpers.
//!
//! Callers work in NWU (x forward, y left, z up); the solvers run in EDN
//! (x right, y down, z along the optical axis). Inputs are converted on the
//! way in and results on the way out.

use crate::calibration::CameraCalibration;
use crate::dlt::dlt;
use crate::error::PnpError;
use crate::ippe::{fit_plane, planar_candidates};
use crate::refine::refine_pose;
use nalgebra::Point3;
use photon_targeting_core::{
    pose_edn_to_nwu, translation_nwu_to_edn, PnpResult, Pose3, Pt2, Pt3, TargetCorner,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pixel offset applied to the first image point when a square solve yields
/// a non-finite error.
pub const PNP_JITTER_PX: f64 = 0.001;
/// Number of jittered retries after the first square solve attempt.
pub const PNP_MAX_RETRIES: usize = 1;

/// Reordered copy of `items` where output `i` is input
/// `((i + shift) * dir) mod n`, `dir = -1` when `reverse`.
///
/// `reorder_circular(&[0, 1, 2, 3], true, -1) == [1, 0, 3, 2]`.
pub fn reorder_circular<T: Clone>(items: &[T], reverse: bool, shift: i32) -> Vec<T> {
    let n = items.len() as i64;
    if n == 0 {
        return Vec::new();
    }
    let dir: i64 = if reverse { -1 } else { 1 };
    (0..n)
        .map(|i| {
            let idx = ((i + shift as i64) * dir).rem_euclid(n);
            items[idx as usize].clone()
        })
        .collect()
}

fn to_edn_points(points: &[Pt3]) -> Vec<Pt3> {
    points
        .iter()
        .map(|p| Point3::from(translation_nwu_to_edn(&p.coords)))
        .collect()
}

/// Pixel-space RMS reprojection error, `sqrt(sum |e|^2 / 2n)`.
fn reprojection_rms(
    camera: &CameraCalibration,
    pose: &Pose3,
    object: &[Pt3],
    pixels: &[Pt2],
) -> f64 {
    let sum: f64 = object
        .iter()
        .zip(pixels)
        .map(|(x, px)| (camera.project_edn(&(pose * x).coords) - px).norm_squared())
        .sum();
    (sum / (2.0 * object.len() as f64)).sqrt()
}

fn square_candidates(
    camera: &CameraCalibration,
    object: &[Pt3],
    pixels: &[Pt2],
) -> Result<[(Pose3, f64); 2], PnpError> {
    let norm: Vec<Pt2> = pixels.iter().map(|p| camera.pixel_to_normalized(*p)).collect();
    let fit = fit_plane(object)?;
    let [a, b] = planar_candidates(&fit, object, &norm)?;
    let mut sols = [
        (a, reprojection_rms(camera, &a, object, pixels)),
        (b, reprojection_rms(camera, &b, object, pixels)),
    ];
    if sols.iter().any(|(_, e)| !e.is_finite()) {
        return Err(PnpError::NonFinite);
    }
    sols.sort_by(|x, y| x.1.total_cmp(&y.1));

    // refine the winner only; the runner-up stays the raw second IPPE root
    let refined = refine_pose(&sols[0].0, object, &norm);
    let refined_err = reprojection_rms(camera, &refined, object, pixels);
    if refined_err.is_finite() && refined_err <= sols[0].1 {
        sols[0] = (refined, refined_err);
    }
    Ok(sols)
}

/// Solve the pose of one square fiducial.
///
/// `model_trls` are the four tag corners in the tag frame (NWU, facing +X)
/// and `image_points` the matching detected pixel corners. Both lists are
/// reordered with `reorder_circular(_, true, -1)` before solving. The result
/// holds camera-to-tag transforms in NWU, best first, with
/// `ambiguity = best_err / alt_err`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(points = image_points.len()))
)]
pub fn solve_pnp_square(
    camera: &CameraCalibration,
    model_trls: &[Pt3],
    image_points: &[TargetCorner],
) -> Option<PnpResult> {
    if model_trls.len() != 4 || image_points.len() != 4 {
        log::debug!(
            "square PnP needs 4 model and 4 image points, got {} and {}",
            model_trls.len(),
            image_points.len()
        );
        return None;
    }

    let object = to_edn_points(&reorder_circular(model_trls, true, -1));
    let mut pixels: Vec<Pt2> = reorder_circular(image_points, true, -1)
        .into_iter()
        .map(TargetCorner::to_point)
        .collect();

    for attempt in 0..=PNP_MAX_RETRIES {
        if attempt > 0 {
            pixels[0].x -= PNP_JITTER_PX;
            pixels[0].y -= PNP_JITTER_PX;
        }
        match square_candidates(camera, &object, &pixels) {
            Ok([(best, best_err), (alt, alt_err)]) => {
                return Some(PnpResult::new(
                    pose_edn_to_nwu(&best),
                    pose_edn_to_nwu(&alt),
                    best_err,
                    alt_err,
                ));
            }
            Err(err) => log::debug!("square PnP attempt {attempt} failed: {err}"),
        }
    }
    None
}

fn multi_solve(
    camera: &CameraCalibration,
    model_trls: &[Pt3],
    image_points: &[TargetCorner],
) -> Result<(Pose3, f64), PnpError> {
    if model_trls.len() != image_points.len() {
        return Err(PnpError::LengthMismatch {
            object: model_trls.len(),
            image: image_points.len(),
        });
    }
    if model_trls.len() < 4 {
        return Err(PnpError::NotEnoughPoints {
            needed: 4,
            got: model_trls.len(),
        });
    }

    let object = to_edn_points(model_trls);
    let pixels: Vec<Pt2> = image_points.iter().map(|c| c.to_point()).collect();
    let norm: Vec<Pt2> = pixels.iter().map(|p| camera.pixel_to_normalized(*p)).collect();

    let fit = fit_plane(&object)?;
    let init = if fit.is_planar() || object.len() < 6 {
        let [a, b] = planar_candidates(&fit, &object, &norm)?;
        let ea = reprojection_rms(camera, &a, &object, &pixels);
        let eb = reprojection_rms(camera, &b, &object, &pixels);
        if eb < ea {
            b
        } else {
            a
        }
    } else {
        dlt(&object, &norm)?
    };

    let pose = refine_pose(&init, &object, &norm);
    let err = reprojection_rms(camera, &pose, &object, &pixels);
    if !err.is_finite() {
        return Err(PnpError::NonFinite);
    }
    Ok((pose, err))
}

/// Solve one pose from an arbitrary set of correspondences.
///
/// `model_trls` are in any NWU frame (usually the field) and the returned
/// `best` maps that frame into the camera frame (camera-to-model-origin).
/// There is no second solution: `alt == best` and `ambiguity == 0`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(points = image_points.len()))
)]
pub fn solve_pnp_multi(
    camera: &CameraCalibration,
    model_trls: &[Pt3],
    image_points: &[TargetCorner],
) -> Option<PnpResult> {
    match multi_solve(camera, model_trls, image_points) {
        Ok((pose, err)) => Some(PnpResult::single(pose_edn_to_nwu(&pose), err)),
        Err(err) => {
            log::debug!("multi-point PnP failed: {err}");
            None
        }
    }
}

/// Project field-frame points into pixels for a camera at `camera_pose`
/// (field-to-camera, NWU).
pub fn project_points(
    camera: &CameraCalibration,
    camera_pose: &Pose3,
    object_trls: &[Pt3],
) -> Vec<Pt2> {
    object_trls
        .iter()
        .map(|p| {
            let local = camera_pose.inverse_transform_point(p);
            camera.project_edn(&translation_nwu_to_edn(&local.coords))
        })
        .collect()
}

/// Pixel coordinates to undistorted normalized image coordinates.
pub fn undistort_points(camera: &CameraCalibration, pixels: &[Pt2]) -> Vec<Pt2> {
    pixels.iter().map(|p| camera.pixel_to_normalized(*p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorder_reverse_shift() {
        assert_eq!(reorder_circular(&[0, 1, 2, 3], true, -1), vec![1, 0, 3, 2]);
        assert_eq!(reorder_circular(&[0, 1, 2, 3], false, 1), vec![1, 2, 3, 0]);
        assert_eq!(reorder_circular(&[0, 1, 2, 3], false, 0), vec![0, 1, 2, 3]);
        assert!(reorder_circular::<u8>(&[], true, 3).is_empty());
    }

    #[test]
    fn square_rejects_wrong_counts() {
        let cam = CameraCalibration::new(500.0, 500.0, 320.0, 240.0);
        let model = [Point3::new(0.0, 0.0, 0.0); 3];
        let corners = [TargetCorner::new(0.0, 0.0); 3];
        assert!(solve_pnp_square(&cam, &model, &corners).is_none());
    }

    #[test]
    fn multi_rejects_collinear_points() {
        let cam = CameraCalibration::new(500.0, 500.0, 320.0, 240.0);
        let model: Vec<Pt3> = (0..4).map(|i| Point3::new(2.0, i as f64 * 0.1, 0.0)).collect();
        let corners: Vec<TargetCorner> = (0..4)
            .map(|i| TargetCorner::new(300.0 - i as f64 * 25.0, 240.0))
            .collect();
        assert!(solve_pnp_multi(&cam, &model, &corners).is_none());
        assert!(solve_pnp_multi(&cam, &model[..3], &corners[..3]).is_none());
    }
}
