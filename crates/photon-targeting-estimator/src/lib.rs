//! Field-relative pose estimation from fiducial detections.
//!
//! - [`AprilTagFieldLayout`]: where every tag sits on the field,
//! - [`estimate_cam_pose_pnp`] / [`estimate_multi_tag`]: one camera pose
//!   from all visible tags,
//! - [`PhotonPoseEstimator`]: per-frame robot pose with a selectable
//!   [`PoseStrategy`],
//! - [`PhotonCamera`] and [`ClientContext`]: reading results off a
//!   transport with version checks.
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use photon_targeting_core::Pose3;
//! use photon_targeting_estimator::{
//!     AprilTagFieldLayout, ClientContext, InMemoryTransport, PhotonCamera,
//!     PhotonPoseEstimator, PoseStrategy,
//! };
//!
//! let layout = Arc::new(AprilTagFieldLayout::load_json("field.json").unwrap());
//! let ctx = Arc::new(ClientContext::default());
//! let mut camera = PhotonCamera::new("front", InMemoryTransport::new(), ctx);
//! let mut estimator =
//!     PhotonPoseEstimator::new(layout, PoseStrategy::LowestAmbiguity, Pose3::identity());
//!
//! if let Some(pose) = estimator.update_from_source(&mut camera, None).unwrap() {
//!     println!("robot at {:?}", pose.estimated_pose.translation);
//! }
//! ```

mod camera;
mod context;
mod estimator;
mod layout;
mod strategy;
mod vision_estimation;

pub use camera::{
    versions_match, CameraError, InMemoryTransport, PhotonCamera, ResultSource,
    TimestampedBytes, TransportSubscriber, CLIENT_VERSION, HEARTBEAT_DEBOUNCE_S,
};
pub use context::{
    ClientContext, ManualClock, MonotonicClock, TimeSource, VERSION_CHECK_INTERVAL_S,
};
pub use estimator::{EstimatedRobotPose, PhotonPoseEstimator};
pub use layout::{
    AprilTag, AprilTagFieldLayout, FieldDimensions, FieldLayoutError, OriginPosition,
};
pub use strategy::PoseStrategy;
pub use vision_estimation::{estimate_cam_pose_pnp, estimate_multi_tag, visible_layout_tags};
