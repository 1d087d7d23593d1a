//! Robot pose from one camera frame.
//!
//! [`PhotonPoseEstimator`] combines a field layout, the camera mounting
//! transform and a [`PoseStrategy`]. Each new frame (by timestamp) is turned
//! into at most one [`EstimatedRobotPose`]; a frame already seen yields
//! `None`.

use crate::camera::{CameraError, ResultSource};
use crate::layout::AprilTagFieldLayout;
use crate::strategy::PoseStrategy;
use crate::vision_estimation::estimate_cam_pose_pnp;
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use photon_targeting_core::{
    translation_distance, PhotonPipelineResult, PhotonTrackedTarget, Pose3, Vec3,
};
use photon_targeting_pnp::{CameraCalibration, TargetModel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Field-relative robot pose produced from one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimatedRobotPose {
    pub estimated_pose: Pose3,
    /// Capture time in the receiver's time base.
    pub timestamp_seconds: f64,
    pub targets_used: Vec<PhotonTrackedTarget>,
    /// Strategy that produced the pose; the fallback when one was used.
    pub strategy: PoseStrategy,
}

#[derive(Debug, Clone)]
pub struct PhotonPoseEstimator {
    field_layout: Arc<AprilTagFieldLayout>,
    primary_strategy: PoseStrategy,
    multi_tag_fallback_strategy: PoseStrategy,
    robot_to_camera: Pose3,
    reference_pose: Option<Pose3>,
    last_pose: Option<Pose3>,
    pose_cache_timestamp_s: f64,
    reported_missing_tags: HashSet<i32>,
    tag_model: TargetModel,
}

impl PhotonPoseEstimator {
    pub fn new(
        field_layout: Arc<AprilTagFieldLayout>,
        strategy: PoseStrategy,
        robot_to_camera: Pose3,
    ) -> Self {
        Self {
            field_layout,
            primary_strategy: strategy,
            multi_tag_fallback_strategy: PoseStrategy::LowestAmbiguity,
            robot_to_camera,
            reference_pose: None,
            last_pose: None,
            pose_cache_timestamp_s: -1.0,
            reported_missing_tags: HashSet::new(),
            tag_model: TargetModel::apriltag_36h11(),
        }
    }

    pub fn field_layout(&self) -> &Arc<AprilTagFieldLayout> {
        &self.field_layout
    }

    pub fn primary_strategy(&self) -> PoseStrategy {
        self.primary_strategy
    }

    pub fn multi_tag_fallback_strategy(&self) -> PoseStrategy {
        self.multi_tag_fallback_strategy
    }

    pub fn robot_to_camera(&self) -> Pose3 {
        self.robot_to_camera
    }

    pub fn reference_pose(&self) -> Option<Pose3> {
        self.reference_pose
    }

    pub fn last_pose(&self) -> Option<Pose3> {
        self.last_pose
    }

    /// Timestamp of the last accepted frame, `-1` when unset.
    pub fn pose_cache_timestamp_s(&self) -> f64 {
        self.pose_cache_timestamp_s
    }

    pub fn tag_model(&self) -> &TargetModel {
        &self.tag_model
    }

    /// Forget the last processed timestamp so the next frame is evaluated.
    pub fn invalidate_cache(&mut self) {
        self.pose_cache_timestamp_s = -1.0;
    }

    pub fn set_field_layout(&mut self, layout: Arc<AprilTagFieldLayout>) {
        if *self.field_layout == *layout {
            return;
        }
        self.field_layout = layout;
        self.reported_missing_tags.clear();
        self.invalidate_cache();
    }

    pub fn set_primary_strategy(&mut self, strategy: PoseStrategy) {
        if self.primary_strategy == strategy {
            return;
        }
        self.primary_strategy = strategy;
        self.invalidate_cache();
    }

    /// Multi-tag strategies cannot be their own fallback; they are replaced
    /// by [`PoseStrategy::LowestAmbiguity`].
    pub fn set_multi_tag_fallback_strategy(&mut self, strategy: PoseStrategy) {
        let strategy = if strategy.is_multi_tag() {
            log::warn!(
                "fallback strategy {strategy:?} needs several tags; using LowestAmbiguity instead"
            );
            PoseStrategy::LowestAmbiguity
        } else {
            strategy
        };
        if self.multi_tag_fallback_strategy == strategy {
            return;
        }
        self.multi_tag_fallback_strategy = strategy;
        self.invalidate_cache();
    }

    pub fn set_reference_pose(&mut self, pose: Pose3) {
        if self.reference_pose == Some(pose) {
            return;
        }
        self.reference_pose = Some(pose);
        self.invalidate_cache();
    }

    pub fn set_last_pose(&mut self, pose: Pose3) {
        if self.last_pose == Some(pose) {
            return;
        }
        self.last_pose = Some(pose);
        self.invalidate_cache();
    }

    pub fn set_robot_to_camera(&mut self, robot_to_camera: Pose3) {
        if self.robot_to_camera == robot_to_camera {
            return;
        }
        self.robot_to_camera = robot_to_camera;
        self.invalidate_cache();
    }

    pub fn set_tag_model(&mut self, model: TargetModel) {
        if self.tag_model == model {
            return;
        }
        self.tag_model = model;
        self.invalidate_cache();
    }

    /// Estimate the robot pose from a new frame.
    ///
    /// Returns `None` for frames with a negative or already processed
    /// timestamp, frames without targets and frames the strategy cannot
    /// resolve. `camera_calibration` is only needed by
    /// [`PoseStrategy::MultiTagPnpOnRio`].
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip_all,
            fields(strategy = ?self.primary_strategy, targets = result.targets.len())
        )
    )]
    pub fn update(
        &mut self,
        result: &PhotonPipelineResult,
        camera_calibration: Option<&CameraCalibration>,
    ) -> Option<EstimatedRobotPose> {
        let timestamp = result.timestamp_seconds();
        if timestamp < 0.0 {
            log::debug!("dropping frame with negative timestamp {timestamp}");
            return None;
        }
        if timestamp == self.pose_cache_timestamp_s {
            return None;
        }
        if !result.has_targets() {
            return None;
        }
        self.pose_cache_timestamp_s = timestamp;

        let estimate = self.dispatch(self.primary_strategy, result, camera_calibration);
        self.last_pose = estimate.as_ref().map(|e| e.estimated_pose);
        estimate
    }

    /// Pull the newest frame from `source` and run [`Self::update`] on it.
    pub fn update_from_source(
        &mut self,
        source: &mut impl ResultSource,
        camera_calibration: Option<&CameraCalibration>,
    ) -> Result<Option<EstimatedRobotPose>, CameraError> {
        Ok(source
            .latest_result()?
            .and_then(|result| self.update(&result, camera_calibration)))
    }

    fn dispatch(
        &mut self,
        strategy: PoseStrategy,
        result: &PhotonPipelineResult,
        camera_calibration: Option<&CameraCalibration>,
    ) -> Option<EstimatedRobotPose> {
        match strategy {
            PoseStrategy::LowestAmbiguity => self.lowest_ambiguity(result),
            PoseStrategy::ClosestToCameraHeight => self.closest_to_camera_height(result),
            PoseStrategy::ClosestToReferencePose => match self.reference_pose {
                Some(reference) => self.closest_to_reference(result, reference, strategy),
                None => {
                    log::warn!("closest-to-reference strategy used without a reference pose");
                    None
                }
            },
            PoseStrategy::ClosestToLastPose => match self.last_pose {
                Some(last) => self.closest_to_reference(result, last, strategy),
                None => self.lowest_ambiguity(result),
            },
            PoseStrategy::AverageBestTargets => self.average_best_targets(result),
            PoseStrategy::MultiTagPnpOnCoprocessor => {
                self.multi_tag_on_coprocessor(result, camera_calibration)
            }
            PoseStrategy::MultiTagPnpOnRio => self.multi_tag_on_rio(result, camera_calibration),
        }
    }

    fn fallback(
        &mut self,
        result: &PhotonPipelineResult,
        camera_calibration: Option<&CameraCalibration>,
    ) -> Option<EstimatedRobotPose> {
        let strategy = self.multi_tag_fallback_strategy;
        if strategy.is_multi_tag() {
            return None;
        }
        self.dispatch(strategy, result, camera_calibration)
    }

    fn tag_pose(&mut self, id: i32) -> Option<Pose3> {
        let pose = self.field_layout.tag_pose(id);
        if pose.is_none() && self.reported_missing_tags.insert(id) {
            log::warn!("tag {id} is not in the field layout; ignoring it");
        }
        pose
    }

    fn robot_pose(&self, field_to_tag: &Pose3, camera_to_tag: &Pose3) -> Pose3 {
        field_to_tag * camera_to_tag.inverse() * self.robot_to_camera.inverse()
    }

    fn estimate(
        &self,
        pose: Pose3,
        result: &PhotonPipelineResult,
        strategy: PoseStrategy,
    ) -> EstimatedRobotPose {
        EstimatedRobotPose {
            estimated_pose: pose,
            timestamp_seconds: result.timestamp_seconds(),
            targets_used: result.targets.clone(),
            strategy,
        }
    }

    fn lowest_ambiguity(&mut self, result: &PhotonPipelineResult) -> Option<EstimatedRobotPose> {
        let mut lowest: Option<&PhotonTrackedTarget> = None;
        let mut lowest_score = f64::INFINITY;
        for target in result.targets.iter().filter(|t| t.is_fiducial()) {
            let ambiguity = target.pose_ambiguity;
            if ambiguity != -1.0 && ambiguity < lowest_score {
                lowest = Some(target);
                lowest_score = ambiguity;
            }
        }
        let target = lowest?;
        let field_to_tag = self.tag_pose(target.fiducial_id)?;
        let pose = self.robot_pose(&field_to_tag, &target.best_camera_to_target);
        Some(self.estimate(pose, result, PoseStrategy::LowestAmbiguity))
    }

    fn closest_to_camera_height(
        &mut self,
        result: &PhotonPipelineResult,
    ) -> Option<EstimatedRobotPose> {
        let camera_height = self.robot_to_camera.translation.vector.z;
        let mut best: Option<Pose3> = None;
        let mut smallest = f64::INFINITY;
        for target in result.targets.iter().filter(|t| t.is_fiducial()) {
            let Some(field_to_tag) = self.tag_pose(target.fiducial_id) else {
                continue;
            };
            for camera_to_tag in [&target.alt_camera_to_target, &target.best_camera_to_target] {
                let field_to_camera = field_to_tag * camera_to_tag.inverse();
                let delta = (camera_height - field_to_camera.translation.vector.z).abs();
                if delta < smallest {
                    smallest = delta;
                    best = Some(field_to_camera * self.robot_to_camera.inverse());
                }
            }
        }
        best.map(|pose| self.estimate(pose, result, PoseStrategy::ClosestToCameraHeight))
    }

    fn closest_to_reference(
        &mut self,
        result: &PhotonPipelineResult,
        reference: Pose3,
        strategy: PoseStrategy,
    ) -> Option<EstimatedRobotPose> {
        let mut best: Option<Pose3> = None;
        let mut smallest = f64::INFINITY;
        for target in result.targets.iter().filter(|t| t.is_fiducial()) {
            let Some(field_to_tag) = self.tag_pose(target.fiducial_id) else {
                continue;
            };
            for camera_to_tag in [&target.alt_camera_to_target, &target.best_camera_to_target] {
                let candidate = self.robot_pose(&field_to_tag, camera_to_tag);
                let delta = translation_distance(&reference, &candidate);
                if delta < smallest {
                    smallest = delta;
                    best = Some(candidate);
                }
            }
        }
        best.map(|pose| self.estimate(pose, result, strategy))
    }

    fn average_best_targets(
        &mut self,
        result: &PhotonPipelineResult,
    ) -> Option<EstimatedRobotPose> {
        let mut weighted: Vec<(Pose3, f64)> = Vec::new();
        for target in result.targets.iter().filter(|t| t.is_fiducial()) {
            let Some(field_to_tag) = self.tag_pose(target.fiducial_id) else {
                continue;
            };
            let pose = self.robot_pose(&field_to_tag, &target.best_camera_to_target);
            if target.pose_ambiguity == 0.0 {
                return Some(self.estimate(pose, result, PoseStrategy::AverageBestTargets));
            }
            if target.pose_ambiguity < 0.0 {
                continue;
            }
            weighted.push((pose, 1.0 / target.pose_ambiguity));
        }
        let pose = weighted_average(&weighted)?;
        Some(self.estimate(pose, result, PoseStrategy::AverageBestTargets))
    }

    fn multi_tag_on_coprocessor(
        &mut self,
        result: &PhotonPipelineResult,
        camera_calibration: Option<&CameraCalibration>,
    ) -> Option<EstimatedRobotPose> {
        match &result.multi_tag_result {
            Some(multi) => {
                // the coprocessor solves in the layout's native frame
                let origin = self.field_layout.origin();
                let field_to_camera = origin.inverse() * multi.estimated_pose.best;
                let pose = field_to_camera * self.robot_to_camera.inverse();
                Some(self.estimate(pose, result, PoseStrategy::MultiTagPnpOnCoprocessor))
            }
            None => self.fallback(result, camera_calibration),
        }
    }

    fn multi_tag_on_rio(
        &mut self,
        result: &PhotonPipelineResult,
        camera_calibration: Option<&CameraCalibration>,
    ) -> Option<EstimatedRobotPose> {
        let Some(camera) = camera_calibration else {
            log::warn!("local multi-tag estimation needs a camera calibration; using fallback");
            return self.fallback(result, None);
        };
        if result.targets.len() < 2 {
            return self.fallback(result, camera_calibration);
        }
        match estimate_cam_pose_pnp(camera, &result.targets, &self.field_layout, &self.tag_model) {
            Some(pnp) => {
                let pose = pnp.best * self.robot_to_camera.inverse();
                Some(self.estimate(pose, result, PoseStrategy::MultiTagPnpOnRio))
            }
            None => self.fallback(result, camera_calibration),
        }
    }
}

/// Weighted mean of poses. Translations average linearly; rotations as a
/// normalized weighted quaternion sum with every quaternion flipped into
/// the first one's hemisphere.
fn weighted_average(poses: &[(Pose3, f64)]) -> Option<Pose3> {
    let (first, _) = poses.first()?;
    let total: f64 = poses.iter().map(|(_, w)| w).sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let anchor = *first.rotation.quaternion();
    let mut trl = Vec3::zeros();
    let mut quat = Quaternion::new(0.0, 0.0, 0.0, 0.0);
    for (pose, w) in poses {
        let w = w / total;
        trl += pose.translation.vector * w;
        let mut q = *pose.rotation.quaternion();
        if q.dot(&anchor) < 0.0 {
            q = -q;
        }
        quat += q * w;
    }
    let rotation = UnitQuaternion::try_new(quat, 1e-12).unwrap_or(first.rotation);
    Some(Isometry3::from_parts(Translation3::from(trl), rotation))
}
