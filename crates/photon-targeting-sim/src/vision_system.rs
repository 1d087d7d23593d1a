//! A robot carrying several simulated cameras around a field of targets.

use crate::camera_sim::PhotonCameraSim;
use crate::target_sim::VisionTargetSim;
use photon_targeting_core::{PhotonPipelineResult, Pose3};
use photon_targeting_estimator::AprilTagFieldLayout;
use photon_targeting_pnp::TargetModel;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Target group that [`VisionSystemSim::add_april_tags`] fills.
pub const APRILTAG_TARGET_TYPE: &str = "apriltag";

#[derive(Debug)]
struct MountedCamera {
    camera: PhotonCameraSim,
    robot_to_camera: Pose3,
}

/// Named cameras mounted on one robot, plus the targets they can see.
///
/// Cameras are processed in name order and never share state.
#[derive(Debug)]
pub struct VisionSystemSim {
    name: String,
    cameras: BTreeMap<String, MountedCamera>,
    targets: BTreeMap<String, Vec<VisionTargetSim>>,
    tag_layout: Option<Arc<AprilTagFieldLayout>>,
    robot_pose: Pose3,
}

impl VisionSystemSim {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cameras: BTreeMap::new(),
            targets: BTreeMap::new(),
            tag_layout: None,
            robot_pose: Pose3::identity(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mount `camera`; returns the camera previously registered under `name`.
    ///
    /// A camera without a tag layout inherits the one set by
    /// [`Self::add_april_tags`].
    pub fn add_camera(
        &mut self,
        name: impl Into<String>,
        mut camera: PhotonCameraSim,
        robot_to_camera: Pose3,
    ) -> Option<PhotonCameraSim> {
        if camera.tag_layout().is_none() {
            camera.set_tag_layout(self.tag_layout.clone());
        }
        self.cameras
            .insert(
                name.into(),
                MountedCamera {
                    camera,
                    robot_to_camera,
                },
            )
            .map(|old| old.camera)
    }

    pub fn remove_camera(&mut self, name: &str) -> Option<PhotonCameraSim> {
        self.cameras.remove(name).map(|mounted| mounted.camera)
    }

    pub fn clear_cameras(&mut self) {
        self.cameras.clear();
    }

    pub fn camera_names(&self) -> impl Iterator<Item = &str> {
        self.cameras.keys().map(String::as_str)
    }

    pub fn camera(&self, name: &str) -> Option<&PhotonCameraSim> {
        self.cameras.get(name).map(|mounted| &mounted.camera)
    }

    pub fn camera_mut(&mut self, name: &str) -> Option<&mut PhotonCameraSim> {
        self.cameras.get_mut(name).map(|mounted| &mut mounted.camera)
    }

    pub fn robot_to_camera(&self, name: &str) -> Option<Pose3> {
        self.cameras.get(name).map(|mounted| mounted.robot_to_camera)
    }

    /// Move a mounted camera. Returns `false` for an unknown name.
    pub fn adjust_camera(&mut self, name: &str, robot_to_camera: Pose3) -> bool {
        match self.cameras.get_mut(name) {
            Some(mounted) => {
                mounted.robot_to_camera = robot_to_camera;
                true
            }
            None => false,
        }
    }

    /// Field pose of a mounted camera for the current robot pose.
    pub fn camera_pose(&self, name: &str) -> Option<Pose3> {
        self.robot_to_camera(name).map(|rtc| self.robot_pose * rtc)
    }

    pub fn add_vision_targets(
        &mut self,
        target_type: impl Into<String>,
        targets: impl IntoIterator<Item = VisionTargetSim>,
    ) {
        self.targets
            .entry(target_type.into())
            .or_default()
            .extend(targets);
    }

    /// Add one target per layout tag and hand the layout to every camera
    /// for multi-tag solving.
    pub fn add_april_tags(&mut self, layout: Arc<AprilTagFieldLayout>, model: &TargetModel) {
        let tags = VisionTargetSim::from_layout(&layout, model);
        self.add_vision_targets(APRILTAG_TARGET_TYPE, tags);
        for mounted in self.cameras.values_mut() {
            mounted.camera.set_tag_layout(Some(layout.clone()));
            mounted.camera.set_tag_model(model.clone());
        }
        self.tag_layout = Some(layout);
    }

    pub fn remove_vision_targets(&mut self, target_type: &str) -> Vec<VisionTargetSim> {
        self.targets.remove(target_type).unwrap_or_default()
    }

    pub fn clear_vision_targets(&mut self) {
        self.targets.clear();
    }

    pub fn vision_targets(&self) -> impl Iterator<Item = &VisionTargetSim> {
        self.targets.values().flatten()
    }

    pub fn robot_pose(&self) -> Pose3 {
        self.robot_pose
    }

    pub fn reset_robot_pose(&mut self, robot_pose: Pose3) {
        self.robot_pose = robot_pose;
    }

    /// Move the robot to `robot_pose` and run every camera with a frame due
    /// at `now_us`.
    ///
    /// Each frame is published at its due time; the camera pose comes from
    /// the current robot pose.
    pub fn update(
        &mut self,
        robot_pose: Pose3,
        now_us: i64,
    ) -> Vec<(String, PhotonPipelineResult)> {
        self.robot_pose = robot_pose;
        let targets: Vec<VisionTargetSim> = self.vision_targets().cloned().collect();

        let mut results = Vec::new();
        for (name, mounted) in &mut self.cameras {
            let Some(due_us) = mounted.camera.consume_next_entry_time(now_us) else {
                continue;
            };
            let latency_ms = mounted.camera.estimate_latency_ms();
            let camera_pose = robot_pose * mounted.robot_to_camera;
            let result = mounted
                .camera
                .process_at(latency_ms, &camera_pose, &targets, due_us);
            log::trace!("{name}: {} targets", result.targets.len());
            results.push((name.clone(), result));
        }
        results
    }
}
