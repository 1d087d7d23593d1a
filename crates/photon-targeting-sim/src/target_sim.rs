use photon_targeting_core::{Pose3, Pt3};
use photon_targeting_estimator::AprilTagFieldLayout;
use photon_targeting_pnp::TargetModel;
use serde::{Deserialize, Serialize};

/// A physical target placed on the field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisionTargetSim {
    pub pose: Pose3,
    pub model: TargetModel,
    /// `-1` for non-fiducial targets.
    pub fiducial_id: i32,
    pub obj_detect_id: i32,
    pub obj_detect_conf: f32,
}

impl VisionTargetSim {
    pub fn new(pose: Pose3, model: TargetModel) -> Self {
        Self {
            pose,
            model,
            fiducial_id: -1,
            obj_detect_id: -1,
            obj_detect_conf: -1.0,
        }
    }

    pub fn fiducial(pose: Pose3, model: TargetModel, id: i32) -> Self {
        Self {
            fiducial_id: id,
            ..Self::new(pose, model)
        }
    }

    pub fn with_object_detection(mut self, class_id: i32, confidence: f32) -> Self {
        self.obj_detect_id = class_id;
        self.obj_detect_conf = confidence;
        self
    }

    /// Model vertices in field coordinates.
    pub fn field_vertices(&self) -> Vec<Pt3> {
        self.model.field_vertices(&self.pose)
    }

    /// One fiducial target per layout tag.
    pub fn from_layout(layout: &AprilTagFieldLayout, model: &TargetModel) -> Vec<Self> {
        layout
            .tags()
            .iter()
            .filter_map(|tag| {
                let pose = layout.tag_pose(tag.id)?;
                Some(Self::fiducial(pose, model.clone(), tag.id))
            })
            .collect()
    }
}
