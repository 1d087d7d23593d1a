//! Core types and utilities for fiducial targeting.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any solver, transport or image type. It provides:
//! - geometry aliases over `nalgebra` (`Pose3`, `Vec3`, ...) and the
//!   NWU <-> EDN frame conventions used at the solver boundary,
//! - homography estimation from point correspondences,
//! - the per-frame result model (`PhotonPipelineResult` and friends),
//! - the big-endian wire codec used to ship results between processes.

mod corner;
mod frames;
mod geometry;
mod homography;
mod logger;
mod packet;
mod pipeline;
mod pnp_result;
mod target;

pub use corner::TargetCorner;
pub use frames::{
    edn_to_nwu, nwu_to_edn, pose_edn_to_nwu, pose_nwu_to_edn, rotation_edn_to_nwu,
    rotation_nwu_to_edn, translation_edn_to_nwu, translation_nwu_to_edn,
};
pub use geometry::{
    pose_from_xyz_rpy, rotation_angle_between, translation_distance, Pose3, Pt2, Pt3, Rot3, Vec3,
};
pub use homography::{estimate_homography, Homography};
pub use packet::{Packet, PacketSerde};
pub use pipeline::{PhotonPipelineMetadata, PhotonPipelineResult};
pub use pnp_result::{MultiTargetPnpResult, PnpResult, MAX_FIDUCIAL_IDS};
pub use target::PhotonTrackedTarget;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
