use crate::{MultiTargetPnpResult, Packet, PacketSerde, PhotonTrackedTarget};
use serde::{Deserialize, Serialize};

/// Frame bookkeeping in the producer's clock domain (microseconds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotonPipelineMetadata {
    pub sequence_id: i64,
    pub capture_timestamp_micros: i64,
    pub publish_timestamp_micros: i64,
    pub time_since_last_pong_micros: i64,
}

impl PhotonPipelineMetadata {
    pub fn latency_micros(&self) -> i64 {
        self.publish_timestamp_micros - self.capture_timestamp_micros
    }
}

impl PacketSerde for PhotonPipelineMetadata {
    const TYPE_NAME: &'static str = "PhotonPipelineMetadata";
    const MESSAGE_VERSION: &'static str = "ac0a45f686457856fb30af77699ea356";

    fn pack(&self, packet: &mut Packet) {
        packet.encode_i64(self.sequence_id);
        packet.encode_i64(self.capture_timestamp_micros);
        packet.encode_i64(self.publish_timestamp_micros);
        packet.encode_i64(self.time_since_last_pong_micros);
    }

    fn unpack(packet: &mut Packet) -> Self {
        Self {
            sequence_id: packet.decode_i64(),
            capture_timestamp_micros: packet.decode_i64(),
            publish_timestamp_micros: packet.decode_i64(),
            time_since_last_pong_micros: packet.decode_i64(),
        }
    }
}

/// Everything one processed frame produced.
///
/// `received_timestamp_s` is stamped by the receiver and never goes on the
/// wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotonPipelineResult {
    pub metadata: PhotonPipelineMetadata,
    pub targets: Vec<PhotonTrackedTarget>,
    pub multi_tag_result: Option<MultiTargetPnpResult>,
    #[serde(skip)]
    pub received_timestamp_s: Option<f64>,
}

impl PhotonPipelineResult {
    pub fn new(
        metadata: PhotonPipelineMetadata,
        targets: Vec<PhotonTrackedTarget>,
        multi_tag_result: Option<MultiTargetPnpResult>,
    ) -> Self {
        Self {
            metadata,
            targets,
            multi_tag_result,
            received_timestamp_s: None,
        }
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// First target; producers sort targets best-first.
    pub fn best_target(&self) -> Option<&PhotonTrackedTarget> {
        self.targets.first()
    }

    pub fn latency_millis(&self) -> f64 {
        self.metadata.latency_micros() as f64 / 1e3
    }

    /// Capture time of the frame.
    ///
    /// With a receive stamp this is `received - latency` in the receiver's
    /// time base; otherwise the producer's capture timestamp.
    pub fn timestamp_seconds(&self) -> f64 {
        match self.received_timestamp_s {
            Some(received) => received - self.latency_millis() / 1e3,
            None => self.metadata.capture_timestamp_micros as f64 / 1e6,
        }
    }

    pub fn with_received_timestamp(mut self, received_s: f64) -> Self {
        self.received_timestamp_s = Some(received_s);
        self
    }
}

impl PacketSerde for PhotonPipelineResult {
    const TYPE_NAME: &'static str = "PhotonPipelineResult";
    const MESSAGE_VERSION: &'static str = "4b2ff16a964b5e2bf04be0c1454d91c4";

    fn pack(&self, packet: &mut Packet) {
        self.metadata.pack(packet);
        packet.encode_list(&self.targets);
        packet.encode_optional(self.multi_tag_result.as_ref());
    }

    fn unpack(packet: &mut Packet) -> Self {
        let metadata = PhotonPipelineMetadata::unpack(packet);
        let targets = packet.decode_list();
        let multi_tag_result = packet.decode_optional();
        Self::new(metadata, targets, multi_tag_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(capture: i64, publish: i64) -> PhotonPipelineMetadata {
        PhotonPipelineMetadata {
            sequence_id: 3,
            capture_timestamp_micros: capture,
            publish_timestamp_micros: publish,
            time_since_last_pong_micros: 0,
        }
    }

    #[test]
    fn timestamp_uses_receive_time_minus_latency() {
        let r = PhotonPipelineResult::new(meta(1_000_000, 1_025_000), Vec::new(), None);
        assert_eq!(r.latency_millis(), 25.0);
        assert_eq!(r.timestamp_seconds(), 1.0);

        let r = r.with_received_timestamp(10.0);
        assert!((r.timestamp_seconds() - 9.975).abs() < 1e-12);
    }

    #[test]
    fn best_target_is_first() {
        let mut r = PhotonPipelineResult::default();
        assert!(!r.has_targets());
        assert!(r.best_target().is_none());
        r.targets.push(PhotonTrackedTarget {
            fiducial_id: 4,
            ..PhotonTrackedTarget::default()
        });
        r.targets.push(PhotonTrackedTarget::default());
        assert_eq!(r.best_target().map(|t| t.fiducial_id), Some(4));
    }
}
