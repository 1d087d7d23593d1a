use crate::{Packet, PacketSerde, Pose3, TargetCorner};
use serde::{Deserialize, Serialize};

/// One detection in a processed frame.
///
/// Angles are degrees, `area` is percent of the image. Poses are
/// camera-to-target in NWU axes. Unset ids, confidences and ambiguity are
/// `-1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotonTrackedTarget {
    pub yaw: f64,
    pub pitch: f64,
    pub area: f64,
    pub skew: f64,
    pub fiducial_id: i32,
    pub obj_detect_id: i32,
    pub obj_detect_conf: f32,
    pub best_camera_to_target: Pose3,
    pub alt_camera_to_target: Pose3,
    pub pose_ambiguity: f64,
    /// Corners of the minimum-area rectangle (at most four).
    pub min_area_rect_corners: Vec<TargetCorner>,
    /// Raw detected corners; four per tag for fiducials.
    pub detected_corners: Vec<TargetCorner>,
}

impl Default for PhotonTrackedTarget {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            area: 0.0,
            skew: 0.0,
            fiducial_id: -1,
            obj_detect_id: -1,
            obj_detect_conf: -1.0,
            best_camera_to_target: Pose3::identity(),
            alt_camera_to_target: Pose3::identity(),
            pose_ambiguity: -1.0,
            min_area_rect_corners: Vec::new(),
            detected_corners: Vec::new(),
        }
    }
}

impl PhotonTrackedTarget {
    pub fn is_fiducial(&self) -> bool {
        self.fiducial_id >= 0
    }
}

impl PacketSerde for PhotonTrackedTarget {
    const TYPE_NAME: &'static str = "PhotonTrackedTarget";
    const MESSAGE_VERSION: &'static str = "cc6dbb5c5c1e0fa808108019b20863f1";

    fn pack(&self, packet: &mut Packet) {
        packet.encode_f64(self.yaw);
        packet.encode_f64(self.pitch);
        packet.encode_f64(self.area);
        packet.encode_f64(self.skew);
        packet.encode_i32(self.fiducial_id);
        packet.encode_i32(self.obj_detect_id);
        packet.encode_f32(self.obj_detect_conf);
        packet.encode_pose(&self.best_camera_to_target);
        packet.encode_pose(&self.alt_camera_to_target);
        packet.encode_f64(self.pose_ambiguity);
        let rect = self.min_area_rect_corners.len().min(4);
        packet.encode_list(&self.min_area_rect_corners[..rect]);
        packet.encode_list(&self.detected_corners);
    }

    fn unpack(packet: &mut Packet) -> Self {
        Self {
            yaw: packet.decode_f64(),
            pitch: packet.decode_f64(),
            area: packet.decode_f64(),
            skew: packet.decode_f64(),
            fiducial_id: packet.decode_i32(),
            obj_detect_id: packet.decode_i32(),
            obj_detect_conf: packet.decode_f32(),
            best_camera_to_target: packet.decode_pose(),
            alt_camera_to_target: packet.decode_pose(),
            pose_ambiguity: packet.decode_f64(),
            min_area_rect_corners: packet.decode_list(),
            detected_corners: packet.decode_list(),
        }
    }
}
