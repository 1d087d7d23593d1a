//! JSON configuration and report helpers for simulated pose-estimation runs.

use crate::estimator::{
    AprilTagFieldLayout, EstimatedRobotPose, FieldLayoutError, PhotonPoseEstimator, PoseStrategy,
};
use crate::sim::SimCameraConfig;
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use photon_targeting_core::{translation_distance, Pose3};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Layout(#[from] FieldLayoutError),
}

/// Pose written as translation (meters) plus roll/pitch/yaw (radians, NWU).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseXyzRpy {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl PoseXyzRpy {
    pub fn to_pose(&self) -> Pose3 {
        Isometry3::from_parts(
            Translation3::new(self.x, self.y, self.z),
            UnitQuaternion::from_euler_angles(self.roll, self.pitch, self.yaw),
        )
    }
}

impl From<Pose3> for PoseXyzRpy {
    fn from(pose: Pose3) -> Self {
        let t = pose.translation.vector;
        let (roll, pitch, yaw) = pose.rotation.euler_angles();
        Self {
            x: t.x,
            y: t.y,
            z: t.z,
            roll,
            pitch,
            yaw,
        }
    }
}

/// Settings for a [`PhotonPoseEstimator`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub strategy: PoseStrategy,
    pub fallback_strategy: PoseStrategy,
    pub robot_to_camera: PoseXyzRpy,
    /// Used by [`PoseStrategy::ClosestToReferencePose`].
    pub reference_pose: Option<PoseXyzRpy>,
}

impl EstimatorConfig {
    pub fn build(&self, layout: Arc<AprilTagFieldLayout>) -> PhotonPoseEstimator {
        let mut estimator =
            PhotonPoseEstimator::new(layout, self.strategy, self.robot_to_camera.to_pose());
        estimator.set_multi_tag_fallback_strategy(self.fallback_strategy);
        if let Some(reference) = &self.reference_pose {
            estimator.set_reference_pose(reference.to_pose());
        }
        estimator
    }
}

/// Configuration for a simulate-then-estimate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingConfig {
    pub layout_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub camera: SimCameraConfig,
    /// Robot poses to visit, one frame each.
    #[serde(default)]
    pub robot_poses: Vec<PoseXyzRpy>,
}

impl TargetingConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("pose_report.json"))
    }

    /// Load the field layout, resolving a relative path against `base_dir`.
    pub fn load_layout(&self, base_dir: &Path) -> Result<Arc<AprilTagFieldLayout>, ConfigError> {
        let path = Path::new(&self.layout_path);
        let path = if path.is_relative() {
            base_dir.join(path)
        } else {
            path.to_path_buf()
        };
        Ok(Arc::new(AprilTagFieldLayout::load_json(path)?))
    }
}

/// One simulated frame and what the estimator made of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub sequence_id: i64,
    pub timestamp_seconds: f64,
    pub true_pose: PoseXyzRpy,
    pub num_targets: usize,
    #[serde(default)]
    pub estimated_pose: Option<PoseXyzRpy>,
    #[serde(default)]
    pub strategy: Option<PoseStrategy>,
    #[serde(default)]
    pub fiducial_ids_used: Vec<i32>,
    #[serde(default)]
    pub translation_error_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseReport {
    pub config_path: String,
    pub layout_path: String,
    pub strategy: PoseStrategy,
    pub frames: Vec<FrameReport>,
}

impl PoseReport {
    pub fn new(cfg: &TargetingConfig, config_path: &Path) -> Self {
        Self {
            config_path: config_path.to_string_lossy().into_owned(),
            layout_path: cfg.layout_path.clone(),
            strategy: cfg.estimator.strategy,
            frames: Vec::new(),
        }
    }

    /// Record one frame; `estimate` is `None` when the estimator had nothing.
    pub fn push_frame(
        &mut self,
        sequence_id: i64,
        timestamp_seconds: f64,
        true_pose: &Pose3,
        num_targets: usize,
        estimate: Option<&EstimatedRobotPose>,
    ) {
        self.frames.push(FrameReport {
            sequence_id,
            timestamp_seconds,
            true_pose: (*true_pose).into(),
            num_targets,
            estimated_pose: estimate.map(|e| e.estimated_pose.into()),
            strategy: estimate.map(|e| e.strategy),
            fiducial_ids_used: estimate
                .map(|e| e.targets_used.iter().map(|t| t.fiducial_id).collect())
                .unwrap_or_default(),
            translation_error_m: estimate
                .map(|e| translation_distance(&e.estimated_pose, true_pose)),
        });
    }

    /// Frames that produced a pose.
    pub fn num_estimated(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.estimated_pose.is_some())
            .count()
    }

    /// Largest translation error over all estimated frames.
    pub fn max_translation_error_m(&self) -> Option<f64> {
        self.frames
            .iter()
            .filter_map(|f| f.translation_error_m)
            .max_by(f64::total_cmp)
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pose_xyz_rpy_round_trip() {
        let spec = PoseXyzRpy {
            x: 1.0,
            y: -2.0,
            z: 0.5,
            roll: 0.1,
            pitch: -0.2,
            yaw: 2.5,
        };
        let back = PoseXyzRpy::from(spec.to_pose());
        assert_relative_eq!(back.x, spec.x, epsilon = 1e-12);
        assert_relative_eq!(back.roll, spec.roll, epsilon = 1e-12);
        assert_relative_eq!(back.pitch, spec.pitch, epsilon = 1e-12);
        assert_relative_eq!(back.yaw, spec.yaw, epsilon = 1e-12);
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: TargetingConfig =
            serde_json::from_str(r#"{ "layout_path": "field.json" }"#).expect("config");
        assert_eq!(cfg.estimator.strategy, PoseStrategy::LowestAmbiguity);
        assert_eq!(cfg.camera, SimCameraConfig::default());
        assert!(cfg.robot_poses.is_empty());
        assert_eq!(cfg.output_path(), PathBuf::from("pose_report.json"));
    }

    #[test]
    fn estimator_config_applies_settings() {
        let layout = AprilTagFieldLayout::new(
            Vec::new(),
            crate::estimator::FieldDimensions {
                length: 16.54,
                width: 8.21,
            },
        )
        .expect("layout");
        let cfg: EstimatorConfig = serde_json::from_str(
            r#"{
                "strategy": "multi_tag_pnp_on_rio",
                "fallback_strategy": "multi_tag_pnp_on_coprocessor",
                "robot_to_camera": { "x": 0.3, "z": 0.5 },
                "reference_pose": { "x": 2.0 }
            }"#,
        )
        .expect("estimator config");
        let estimator = cfg.build(Arc::new(layout));
        assert_eq!(estimator.primary_strategy(), PoseStrategy::MultiTagPnpOnRio);
        // a multi-tag fallback is corrected
        assert_eq!(
            estimator.multi_tag_fallback_strategy(),
            PoseStrategy::LowestAmbiguity
        );
        assert_relative_eq!(estimator.robot_to_camera().translation.vector.z, 0.5);
        let reference = estimator.reference_pose().expect("reference");
        assert_relative_eq!(reference.translation.vector.x, 2.0);
    }

    #[test]
    fn report_summaries() {
        let cfg: TargetingConfig =
            serde_json::from_str(r#"{ "layout_path": "field.json" }"#).expect("config");
        let mut report = PoseReport::new(&cfg, Path::new("run.json"));
        let truth = Pose3::translation(1.0, 2.0, 0.0);
        let estimate = EstimatedRobotPose {
            estimated_pose: Pose3::translation(1.0, 2.03, 0.0),
            timestamp_seconds: 0.5,
            targets_used: Vec::new(),
            strategy: PoseStrategy::LowestAmbiguity,
        };
        report.push_frame(1, 0.5, &truth, 2, Some(&estimate));
        report.push_frame(2, 0.6, &truth, 0, None);

        assert_eq!(report.num_estimated(), 1);
        let worst = report.max_translation_error_m().expect("error");
        assert_relative_eq!(worst, 0.03, epsilon = 1e-12);
        assert_eq!(report.frames[1].strategy, None);
    }

    #[test]
    fn report_on_disk_is_bit_exact() {
        let cfg: TargetingConfig =
            serde_json::from_str(r#"{ "layout_path": "field.json" }"#).expect("config");
        let mut report = PoseReport::new(&cfg, Path::new("run.json"));
        let truth = PoseXyzRpy {
            x: 1.5,
            y: -0.2,
            yaw: 0.1,
            ..Default::default()
        }
        .to_pose();
        let estimate = EstimatedRobotPose {
            estimated_pose: truth * Pose3::translation(1e-3 / 3.0, -1.7025270082626778e-13, 0.0),
            timestamp_seconds: 1.0 / 3.0,
            targets_used: Vec::new(),
            strategy: PoseStrategy::MultiTagPnpOnCoprocessor,
        };
        report.push_frame(4, 1.0 / 3.0, &truth, 3, Some(&estimate));

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        report.write_json(&path).expect("write");
        let back = PoseReport::load_json(&path).expect("read");
        assert_eq!(back, report);
    }
}
