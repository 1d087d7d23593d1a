use crate::{Packet, PacketSerde, Pose3};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of fiducial ids carried by a multi-tag result.
pub const MAX_FIDUCIAL_IDS: usize = 32;

/// Outcome of a perspective-n-point solve.
///
/// `best` and `alt` are the two candidate transforms. For planar single-tag
/// solves `ambiguity = best_reproj_err / alt_reproj_err` lies in `[0, 1]`;
/// when only one solution exists `alt == best` and `ambiguity == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PnpResult {
    pub best: Pose3,
    pub alt: Pose3,
    pub best_reproj_err: f64,
    pub alt_reproj_err: f64,
    pub ambiguity: f64,
}

impl PnpResult {
    pub fn new(best: Pose3, alt: Pose3, best_reproj_err: f64, alt_reproj_err: f64) -> Self {
        let ambiguity = if alt_reproj_err > f64::EPSILON {
            best_reproj_err / alt_reproj_err
        } else {
            0.0
        };
        Self {
            best,
            alt,
            best_reproj_err,
            alt_reproj_err,
            ambiguity,
        }
    }

    /// Single unambiguous solution.
    pub fn single(best: Pose3, reproj_err: f64) -> Self {
        Self {
            best,
            alt: best,
            best_reproj_err: reproj_err,
            alt_reproj_err: reproj_err,
            ambiguity: 0.0,
        }
    }
}

impl Default for PnpResult {
    fn default() -> Self {
        Self::single(Pose3::identity(), 0.0)
    }
}

impl PacketSerde for PnpResult {
    const TYPE_NAME: &'static str = "PnpResult";
    const MESSAGE_VERSION: &'static str = "ae4d655c0a3104d88df4f5db144c1e86";

    fn pack(&self, packet: &mut Packet) {
        packet.encode_pose(&self.best);
        packet.encode_pose(&self.alt);
        packet.encode_f64(self.best_reproj_err);
        packet.encode_f64(self.alt_reproj_err);
        packet.encode_f64(self.ambiguity);
    }

    fn unpack(packet: &mut Packet) -> Self {
        let best = packet.decode_pose();
        let alt = packet.decode_pose();
        let best_reproj_err = packet.decode_f64();
        let alt_reproj_err = packet.decode_f64();
        let ambiguity = packet.decode_f64();
        Self {
            best,
            alt,
            best_reproj_err,
            alt_reproj_err,
            ambiguity,
        }
    }
}

/// Joint solve over several tags plus the ids that contributed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiTargetPnpResult {
    pub estimated_pose: PnpResult,
    pub fiducial_ids_used: Vec<i16>,
}

impl MultiTargetPnpResult {
    /// Ids are sorted, deduplicated and capped at [`MAX_FIDUCIAL_IDS`].
    pub fn new(estimated_pose: PnpResult, ids: impl IntoIterator<Item = i16>) -> Self {
        let mut fiducial_ids_used: Vec<i16> = ids.into_iter().collect();
        fiducial_ids_used.sort_unstable();
        fiducial_ids_used.dedup();
        if fiducial_ids_used.len() > MAX_FIDUCIAL_IDS {
            log::warn!(
                "multi-tag result uses {} ids, keeping the first {MAX_FIDUCIAL_IDS}",
                fiducial_ids_used.len()
            );
            fiducial_ids_used.truncate(MAX_FIDUCIAL_IDS);
        }
        Self {
            estimated_pose,
            fiducial_ids_used,
        }
    }
}

impl PacketSerde for MultiTargetPnpResult {
    const TYPE_NAME: &'static str = "MultiTargetPNPResult";
    const MESSAGE_VERSION: &'static str = "541096947e9f3ca2d3f425ff7b04aa7b";

    fn pack(&self, packet: &mut Packet) {
        self.estimated_pose.pack(packet);
        let n = self.fiducial_ids_used.len().min(MAX_FIDUCIAL_IDS);
        packet.encode_i16_list(&self.fiducial_ids_used[..n]);
    }

    fn unpack(packet: &mut Packet) -> Self {
        let estimated_pose = PnpResult::unpack(packet);
        let ids = packet.decode_i16_list();
        Self::new(estimated_pose, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose_from_xyz_rpy;

    #[test]
    fn ambiguity_is_error_ratio() {
        let a = pose_from_xyz_rpy(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let b = pose_from_xyz_rpy(1.0, 0.1, 0.0, 0.0, 0.2, 0.0);
        let r = PnpResult::new(a, b, 0.5, 2.0);
        assert_eq!(r.ambiguity, 0.25);
        assert_eq!(PnpResult::new(a, b, 0.5, 0.0).ambiguity, 0.0);
        assert_eq!(PnpResult::single(a, 0.3).alt, a);
    }

    #[test]
    fn ids_are_sorted_deduplicated_and_bounded() {
        let r = MultiTargetPnpResult::new(PnpResult::default(), [7, 3, 7, 1]);
        assert_eq!(r.fiducial_ids_used, vec![1, 3, 7]);

        let many = MultiTargetPnpResult::new(PnpResult::default(), (0..50).rev());
        assert_eq!(many.fiducial_ids_used.len(), MAX_FIDUCIAL_IDS);
        assert_eq!(many.fiducial_ids_used[0], 0);
    }
}
