//! Camera pose from several fiducials at once.

use crate::layout::{AprilTag, AprilTagFieldLayout};
use photon_targeting_core::{
    MultiTargetPnpResult, PhotonTrackedTarget, PnpResult, Pt3, TargetCorner,
};
use photon_targeting_pnp::{solve_pnp_multi, solve_pnp_square, CameraCalibration, TargetModel};
use std::collections::HashSet;

/// Layout tags matching the detected fiducials, in detection order, without
/// repeats.
pub fn visible_layout_tags(
    targets: &[PhotonTrackedTarget],
    layout: &AprilTagFieldLayout,
) -> Vec<AprilTag> {
    let mut seen = HashSet::new();
    targets
        .iter()
        .filter(|t| t.is_fiducial() && seen.insert(t.fiducial_id))
        .filter_map(|t| {
            layout.tag_pose(t.fiducial_id).map(|pose| AprilTag {
                id: t.fiducial_id,
                pose,
            })
        })
        .collect()
}

/// Estimate the field-to-camera pose from all detected tags the layout knows.
///
/// One known tag goes through the square solver and keeps both solutions;
/// more tags are stacked into a single multi-point solve. Targets whose
/// corner count is not four are skipped.
pub fn estimate_cam_pose_pnp(
    camera: &CameraCalibration,
    targets: &[PhotonTrackedTarget],
    layout: &AprilTagFieldLayout,
    tag_model: &TargetModel,
) -> Option<PnpResult> {
    let mut known: Vec<(AprilTag, &[TargetCorner])> = Vec::new();
    for target in targets.iter().filter(|t| t.is_fiducial()) {
        let Some(pose) = layout.tag_pose(target.fiducial_id) else {
            continue;
        };
        if target.detected_corners.len() != tag_model.vertices.len() {
            log::debug!(
                "tag {} has {} corners, expected {}",
                target.fiducial_id,
                target.detected_corners.len(),
                tag_model.vertices.len()
            );
            continue;
        }
        known.push((
            AprilTag {
                id: target.fiducial_id,
                pose,
            },
            target.detected_corners.as_slice(),
        ));
    }

    match known.as_slice() {
        [] => None,
        [(tag, corners)] => {
            let cam_to_tag = solve_pnp_square(camera, &tag_model.vertices, corners)?;
            Some(PnpResult {
                best: tag.pose * cam_to_tag.best.inverse(),
                alt: tag.pose * cam_to_tag.alt.inverse(),
                ..cam_to_tag
            })
        }
        many => {
            let mut object: Vec<Pt3> = Vec::with_capacity(many.len() * 4);
            let mut image: Vec<TargetCorner> = Vec::with_capacity(many.len() * 4);
            for (tag, corners) in many {
                object.extend(tag_model.field_vertices(&tag.pose));
                image.extend_from_slice(corners);
            }
            let cam_to_field = solve_pnp_multi(camera, &object, &image)?;
            let field_to_cam = cam_to_field.best.inverse();
            Some(PnpResult::single(field_to_cam, cam_to_field.best_reproj_err))
        }
    }
}

/// [`estimate_cam_pose_pnp`] plus the ids of the tags that fed the solve.
pub fn estimate_multi_tag(
    camera: &CameraCalibration,
    targets: &[PhotonTrackedTarget],
    layout: &AprilTagFieldLayout,
    tag_model: &TargetModel,
) -> Option<MultiTargetPnpResult> {
    let pnp = estimate_cam_pose_pnp(camera, targets, layout, tag_model)?;
    let ids = visible_layout_tags(targets, layout)
        .into_iter()
        .filter_map(|tag| i16::try_from(tag.id).ok());
    Some(MultiTargetPnpResult::new(pnp, ids))
}
