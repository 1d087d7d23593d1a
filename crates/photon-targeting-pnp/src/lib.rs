//! Camera model and perspective-n-point solvers.
//!
//! - [`CameraCalibration`]: pinhole intrinsics plus OpenCV-style distortion,
//! - [`TargetModel`]: vertex models of fiducials and other targets,
//! - [`solve_pnp_square`]: two-solution planar solve for one square tag,
//! - [`solve_pnp_multi`]: single-solution solve over any point set,
//! - 2D contour helpers used to summarize projected targets.
//!
//! All public poses are NWU. The solvers never panic on bad geometry; they
//! return `None`.

mod calibration;
mod contour;
mod dlt;
mod error;
mod ippe;
mod model;
mod refine;
mod solve;

pub use calibration::{CameraCalibration, DISTORTION_COEFFS};
pub use contour::{
    avg_point, get_contour_area_pixels, get_convex_hull, min_area_rect, RotatedRect,
};
pub use model::{TargetModel, APRILTAG_16H5_SIZE_M, APRILTAG_36H11_SIZE_M};
pub use solve::{
    project_points, reorder_circular, solve_pnp_multi, solve_pnp_square, undistort_points,
    PNP_JITTER_PX, PNP_MAX_RETRIES,
};
