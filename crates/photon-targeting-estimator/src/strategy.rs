use serde::{Deserialize, Serialize};

/// How [`crate::PhotonPoseEstimator`] turns a frame into a robot pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseStrategy {
    /// Single tag with the lowest pose ambiguity.
    #[default]
    LowestAmbiguity,
    /// Candidate whose camera height best matches the mounting height.
    ClosestToCameraHeight,
    /// Candidate nearest a user-supplied reference pose.
    ClosestToReferencePose,
    /// Candidate nearest the previous estimate.
    ClosestToLastPose,
    /// Ambiguity-weighted average of every tag's best candidate.
    AverageBestTargets,
    /// Multi-tag solution computed on the coprocessor.
    MultiTagPnpOnCoprocessor,
    /// Multi-tag solution computed locally from corners.
    MultiTagPnpOnRio,
}

impl PoseStrategy {
    /// Strategies that need several tags and therefore a fallback.
    pub fn is_multi_tag(self) -> bool {
        matches!(
            self,
            PoseStrategy::MultiTagPnpOnCoprocessor | PoseStrategy::MultiTagPnpOnRio
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_are_snake_case() {
        let json = serde_json::to_string(&PoseStrategy::MultiTagPnpOnRio).expect("ser");
        assert_eq!(json, "\"multi_tag_pnp_on_rio\"");
        let back: PoseStrategy = serde_json::from_str("\"closest_to_last_pose\"").expect("de");
        assert_eq!(back, PoseStrategy::ClosestToLastPose);
        assert!(PoseStrategy::MultiTagPnpOnCoprocessor.is_multi_tag());
        assert!(!PoseStrategy::AverageBestTargets.is_multi_tag());
    }
}
