use std::f64::consts::PI;
use std::sync::Arc;

use photon_targeting_core::{pose_from_xyz_rpy, translation_distance, Pose3};
use photon_targeting_estimator::{
    AprilTag, AprilTagFieldLayout, FieldDimensions, ManualClock, PhotonPoseEstimator, PoseStrategy,
};
use photon_targeting_pnp::TargetModel;
use photon_targeting_sim::{
    PhotonCameraSim, SimCameraConfig, SimCameraProperties, VisionSystemSim,
};

fn layout() -> Arc<AprilTagFieldLayout> {
    let tags = [(1, -1.2, 0.8), (2, -0.4, 1.0), (3, 0.4, 0.6), (4, 1.2, 0.9)]
        .into_iter()
        .map(|(id, y, z)| AprilTag {
            id,
            pose: pose_from_xyz_rpy(6.0, y, z, 0.0, 0.0, PI),
        })
        .collect();
    let field = FieldDimensions {
        length: 16.54,
        width: 8.21,
    };
    Arc::new(AprilTagFieldLayout::new(tags, field).expect("layout"))
}

fn robot_to_camera() -> Pose3 {
    pose_from_xyz_rpy(0.3, 0.0, 0.4, 0.0, -0.1, 0.0)
}

fn system(layout: &Arc<AprilTagFieldLayout>) -> VisionSystemSim {
    let clock = Arc::new(ManualClock::new(1.0));
    let mut props = SimCameraProperties::new();
    props.set_calibration_fov(960, 720, 90.0);
    props.set_fps(30.0);
    let camera = PhotonCameraSim::with_clock(props, clock).with_seed(11);

    let mut system = VisionSystemSim::new("robot");
    system.add_camera("front", camera, robot_to_camera());
    system.add_april_tags(layout.clone(), &TargetModel::apriltag_36h11());
    system
}

#[test]
fn sim_frames_recover_robot_pose() {
    let layout = layout();
    let mut system = system(&layout);
    let robot = pose_from_xyz_rpy(1.5, 0.4, 0.0, 0.0, 0.0, 0.1);

    let frames = system.update(robot, 1_000_000);
    let (_, result) = frames.first().expect("frame");
    assert_eq!(result.targets.len(), 4);
    assert!(result.multi_tag_result.is_some());
    let calibration = *system
        .camera("front")
        .expect("camera")
        .props()
        .calibration();

    for strategy in [
        PoseStrategy::MultiTagPnpOnCoprocessor,
        PoseStrategy::MultiTagPnpOnRio,
        PoseStrategy::LowestAmbiguity,
        PoseStrategy::AverageBestTargets,
    ] {
        let mut estimator = PhotonPoseEstimator::new(layout.clone(), strategy, robot_to_camera());
        let estimate = estimator
            .update(result, Some(&calibration))
            .unwrap_or_else(|| panic!("{strategy:?} produced no pose"));
        let err = translation_distance(&estimate.estimated_pose, &robot);
        assert!(err < 0.02, "{strategy:?} off by {err} m");
        assert_eq!(estimate.strategy, strategy);
        assert!((estimate.timestamp_seconds - 1.0).abs() < 1e-9);
    }
}

#[test]
fn stalled_sim_resyncs_to_now() {
    let layout = layout();
    let mut system = system(&layout);
    let robot = pose_from_xyz_rpy(1.5, 0.0, 0.0, 0.0, 0.0, 0.0);

    assert_eq!(system.update(robot, 1_000_000).len(), 1);
    // far more than the allowed number of missed frames
    let frames = system.update(robot, 11_000_000);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].1.metadata.publish_timestamp_micros, 11_000_000);
    assert!(system.update(robot, 11_010_000).is_empty());
    assert_eq!(system.update(robot, 11_040_000).len(), 1);
}

#[test]
fn config_built_camera_sees_tags() {
    let layout = layout();
    let config: SimCameraConfig = serde_json::from_str(
        r#"{ "width": 1280, "height": 800, "diag_fov_deg": 100.0, "seed": 5 }"#,
    )
    .expect("config");
    let camera = PhotonCameraSim::from_config(&config, Arc::new(ManualClock::new(0.0)));

    let mut system = VisionSystemSim::new("robot");
    system.add_april_tags(layout, &TargetModel::apriltag_36h11());
    system.add_camera("wide", camera, robot_to_camera());
    let frames = system.update(pose_from_xyz_rpy(2.0, 0.0, 0.0, 0.0, 0.0, 0.0), 0);
    assert_eq!(frames[0].1.targets.len(), 4);
    let ids = &frames[0].1.multi_tag_result.as_ref().expect("multi-tag").fiducial_ids_used;
    assert_eq!(ids, &vec![1, 2, 3, 4]);
}
