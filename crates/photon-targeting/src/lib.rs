//! High-level facade crate for the `photon-targeting-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the underlying crates,
//! - JSON configuration and report types ([`io`]),
//! - a simulate-then-estimate driver ([`simulate::simulate_poses`]).
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::path::Path;
//! use photon_targeting::io::TargetingConfig;
//! use photon_targeting::simulate::simulate_poses;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config_path = Path::new("run.json");
//! let cfg = TargetingConfig::load_json(config_path)?;
//! let layout = cfg.load_layout(Path::new("."))?;
//! let report = simulate_poses(&cfg, layout, config_path);
//! report.write_json(cfg.output_path())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `photon_targeting::core`: poses, frame conversion, result types, wire codec.
//! - `photon_targeting::pnp`: camera calibration, target models, PnP solvers.
//! - `photon_targeting::estimator`: field layout, pose strategies, camera client.
//! - `photon_targeting::sim`: simulated cameras and targets.

pub use photon_targeting_core as core;
pub use photon_targeting_estimator as estimator;
pub use photon_targeting_pnp as pnp;
pub use photon_targeting_sim as sim;

pub use photon_targeting_core::{
    PhotonPipelineResult, PhotonTrackedTarget, PnpResult, Pose3, TargetCorner,
};
pub use photon_targeting_estimator::{
    AprilTagFieldLayout, EstimatedRobotPose, PhotonPoseEstimator, PoseStrategy,
};

pub mod io;
pub mod simulate;
