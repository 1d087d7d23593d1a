//! Synthetic detections for testing pose estimation without hardware.
//!
//! [`SimCameraProperties`] models a camera's intrinsics, noise and timing;
//! [`PhotonCameraSim`] projects [`VisionTargetSim`]s into the frames a
//! coprocessor would publish, and [`VisionSystemSim`] drives several
//! cameras mounted on a moving robot.
//!
//! ```
//! use std::sync::Arc;
//! use photon_targeting_core::{pose_from_xyz_rpy, Pose3};
//! use photon_targeting_estimator::ManualClock;
//! use photon_targeting_pnp::TargetModel;
//! use photon_targeting_sim::{PhotonCameraSim, SimCameraProperties, VisionTargetSim};
//!
//! let clock = Arc::new(ManualClock::new(0.0));
//! let mut camera =
//!     PhotonCameraSim::with_clock(SimCameraProperties::perfect_90deg(), clock).with_seed(1);
//! let tag = VisionTargetSim::fiducial(
//!     pose_from_xyz_rpy(3.0, 0.0, 0.0, 0.0, 0.0, std::f64::consts::PI),
//!     TargetModel::apriltag_36h11(),
//!     7,
//! );
//! let frame = camera.process_at(0.0, &Pose3::identity(), &[tag], 0);
//! assert_eq!(frame.targets.len(), 1);
//! ```

mod camera_sim;
mod properties;
mod target_sim;
mod vision_system;

pub use camera_sim::{PhotonCameraSim, DEFAULT_MIN_AREA_PX, MAX_MISSED_FRAMES};
pub use properties::{SimCameraConfig, SimCameraProperties};
pub use target_sim::VisionTargetSim;
pub use vision_system::{VisionSystemSim, APRILTAG_TARGET_TYPE};
