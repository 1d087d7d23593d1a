//! Known fiducial poses on the field.
//!
//! JSON uses the common AprilTag field layout format:
//!
//! ```json
//! {
//!   "tags": [
//!     { "ID": 1, "pose": {
//!         "translation": { "x": 15.08, "y": 0.25, "z": 1.36 },
//!         "rotation": { "quaternion": { "W": 0.5, "X": 0.0, "Y": 0.0, "Z": 0.87 } } } }
//!   ],
//!   "field": { "length": 16.54, "width": 8.21 }
//! }
//! ```

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use photon_targeting_core::Pose3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum FieldLayoutError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("tag id {0} appears more than once")]
    DuplicateTag(i32),
}

/// One fiducial with its pose in the layout's native frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AprilTag {
    #[serde(rename = "ID")]
    pub id: i32,
    #[serde(with = "pose_json")]
    pub pose: Pose3,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDimensions {
    pub length: f64,
    pub width: f64,
}

/// Named field origins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginPosition {
    /// Native layout frame.
    BlueAllianceWallRightSide,
    /// Far corner, rotated half a turn.
    RedAllianceWallRightSide,
}

#[derive(Serialize, Deserialize)]
struct RawLayout {
    tags: Vec<AprilTag>,
    field: FieldDimensions,
    #[serde(default = "Pose3::identity", with = "pose_json")]
    origin: Pose3,
}

/// Read-only mapping from fiducial id to field pose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLayout", into = "RawLayout")]
pub struct AprilTagFieldLayout {
    tags: Vec<AprilTag>,
    field: FieldDimensions,
    origin: Pose3,
    index: HashMap<i32, usize>,
}

impl TryFrom<RawLayout> for AprilTagFieldLayout {
    type Error = FieldLayoutError;

    fn try_from(raw: RawLayout) -> Result<Self, Self::Error> {
        let mut layout = Self::new(raw.tags, raw.field)?;
        layout.origin = raw.origin;
        Ok(layout)
    }
}

impl From<AprilTagFieldLayout> for RawLayout {
    fn from(layout: AprilTagFieldLayout) -> Self {
        Self {
            tags: layout.tags,
            field: layout.field,
            origin: layout.origin,
        }
    }
}

impl AprilTagFieldLayout {
    /// Validate and index a tag list. Duplicate ids are rejected.
    pub fn new(tags: Vec<AprilTag>, field: FieldDimensions) -> Result<Self, FieldLayoutError> {
        let mut index = HashMap::with_capacity(tags.len());
        for (i, tag) in tags.iter().enumerate() {
            if index.insert(tag.id, i).is_some() {
                return Err(FieldLayoutError::DuplicateTag(tag.id));
            }
        }
        Ok(Self {
            tags,
            field,
            origin: Pose3::identity(),
            index,
        })
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, FieldLayoutError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), FieldLayoutError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn tags(&self) -> &[AprilTag] {
        &self.tags
    }

    pub fn field(&self) -> FieldDimensions {
        self.field
    }

    pub fn origin(&self) -> Pose3 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Pose3) {
        self.origin = origin;
    }

    pub fn set_origin_position(&mut self, position: OriginPosition) {
        self.origin = match position {
            OriginPosition::BlueAllianceWallRightSide => Pose3::identity(),
            OriginPosition::RedAllianceWallRightSide => Isometry3::from_parts(
                Translation3::new(self.field.length, self.field.width, 0.0),
                UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::PI),
            ),
        };
    }

    /// Tag pose relative to the current origin.
    pub fn tag_pose(&self, id: i32) -> Option<Pose3> {
        let &i = self.index.get(&id)?;
        Some(self.origin.inverse() * self.tags[i].pose)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.index.contains_key(&id)
    }
}

mod pose_json {
    use super::*;
    use serde::{Deserializer, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Translation {
        x: f64,
        y: f64,
        z: f64,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    struct Quat {
        w: f64,
        x: f64,
        y: f64,
        z: f64,
    }

    #[derive(Serialize, Deserialize)]
    struct Rotation {
        quaternion: Quat,
    }

    #[derive(Serialize, Deserialize)]
    struct PoseJson {
        translation: Translation,
        rotation: Rotation,
    }

    pub fn serialize<S: Serializer>(pose: &Pose3, s: S) -> Result<S::Ok, S::Error> {
        let t = &pose.translation.vector;
        let q = pose.rotation.quaternion();
        PoseJson {
            translation: Translation {
                x: t.x,
                y: t.y,
                z: t.z,
            },
            rotation: Rotation {
                quaternion: Quat {
                    w: q.w,
                    x: q.i,
                    y: q.j,
                    z: q.k,
                },
            },
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Pose3, D::Error> {
        let raw = PoseJson::deserialize(d)?;
        let q = raw.rotation.quaternion;
        let quat = Quaternion::new(q.w, q.x, q.y, q.z);
        let rotation = if quat.norm() > f64::EPSILON {
            UnitQuaternion::from_quaternion(quat)
        } else {
            UnitQuaternion::identity()
        };
        Ok(Isometry3::from_parts(
            Translation3::new(raw.translation.x, raw.translation.y, raw.translation.z),
            rotation,
        ))
    }
}
