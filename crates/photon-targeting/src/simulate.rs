//! Simulate frames along a robot path and run the estimator on them.

use crate::io::{PoseReport, TargetingConfig};
use photon_targeting_estimator::{AprilTagFieldLayout, ManualClock};
use photon_targeting_pnp::TargetModel;
use photon_targeting_sim::{PhotonCameraSim, VisionSystemSim};
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

const CAMERA_NAME: &str = "camera";

/// Visit every pose in `cfg.robot_poses`, one camera frame each, and report
/// the estimate for every frame.
///
/// Time starts at zero and jumps to each frame's due time, so every pose
/// yields exactly one frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(poses = cfg.robot_poses.len()))
)]
pub fn simulate_poses(
    cfg: &TargetingConfig,
    layout: Arc<AprilTagFieldLayout>,
    config_path: &Path,
) -> PoseReport {
    let clock = Arc::new(ManualClock::new(0.0));
    let camera = PhotonCameraSim::from_config(&cfg.camera, clock.clone());
    let calibration = *camera.props().calibration();

    let mut estimator = cfg.estimator.build(layout.clone());
    let mut system = VisionSystemSim::new("robot");
    system.add_camera(CAMERA_NAME, camera, cfg.estimator.robot_to_camera.to_pose());
    system.add_april_tags(layout, &TargetModel::apriltag_36h11());

    let mut report = PoseReport::new(cfg, config_path);
    for spec in &cfg.robot_poses {
        let robot = spec.to_pose();
        let Some(now_us) = system.camera(CAMERA_NAME).map(|c| c.next_entry_time_us()) else {
            break;
        };
        clock.set_seconds(now_us as f64 / 1e6);

        for (_, result) in system.update(robot, now_us) {
            let estimate = estimator.update(&result, Some(&calibration));
            if estimate.is_none() {
                log::debug!(
                    "frame {} with {} targets gave no pose",
                    result.metadata.sequence_id,
                    result.targets.len()
                );
            }
            report.push_frame(
                result.metadata.sequence_id,
                result.timestamp_seconds(),
                &robot,
                result.targets.len(),
                estimate.as_ref(),
            );
        }
    }
    log::info!(
        "estimated {} of {} frames",
        report.num_estimated(),
        report.frames.len()
    );
    report
}
