//! Pinhole intrinsics with the OpenCV radial/tangential distortion model.

use nalgebra::{Matrix3, Point2, Vector3};
use photon_targeting_core::{Pt2, Vec3};
use serde::{Deserialize, Serialize};

/// Number of distortion coefficients kept: `k1 k2 p1 p2 k3 k4 k5 k6`.
pub const DISTORTION_COEFFS: usize = 8;

const UNDISTORT_ITERS: usize = 20;

/// Camera matrix plus distortion coefficients in OpenCV order.
///
/// Five-coefficient calibrations leave `k4..k6` at zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraCalibration {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    #[serde(default)]
    pub distortion: [f64; DISTORTION_COEFFS],
}

impl Default for CameraCalibration {
    fn default() -> Self {
        Self::new(1.0, 1.0, 0.0, 0.0)
    }
}

impl CameraCalibration {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            distortion: [0.0; DISTORTION_COEFFS],
        }
    }

    /// Build from a 3x3 camera matrix and 5 or 8 distortion coefficients.
    ///
    /// Extra coefficients are ignored with a warning; missing ones are zero.
    pub fn from_matrix(k: &Matrix3<f64>, distortion: &[f64]) -> Self {
        Self::new(k[(0, 0)], k[(1, 1)], k[(0, 2)], k[(1, 2)]).with_distortion(distortion)
    }

    pub fn with_distortion(mut self, coeffs: &[f64]) -> Self {
        if coeffs.len() > DISTORTION_COEFFS {
            log::warn!(
                "got {} distortion coefficients, only the first {DISTORTION_COEFFS} are used",
                coeffs.len()
            );
        }
        self.distortion = [0.0; DISTORTION_COEFFS];
        for (dst, src) in self.distortion.iter_mut().zip(coeffs) {
            *dst = *src;
        }
        self
    }

    pub fn k_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    pub fn has_distortion(&self) -> bool {
        self.distortion.iter().any(|&d| d != 0.0)
    }

    /// Apply lens distortion to an undistorted normalized coordinate.
    pub fn distort(&self, n: Pt2) -> Pt2 {
        if !self.has_distortion() {
            return n;
        }
        let (radial, dx, dy) = self.distortion_terms(n.x, n.y);
        Point2::new(n.x * radial + dx, n.y * radial + dy)
    }

    /// Iteratively invert [`Self::distort`].
    pub fn undistort(&self, nd: Pt2) -> Pt2 {
        if !self.has_distortion() {
            return nd;
        }
        let mut x = nd.x;
        let mut y = nd.y;
        for _ in 0..UNDISTORT_ITERS {
            let (radial, dx, dy) = self.distortion_terms(x, y);
            if radial.abs() < 1e-12 {
                break;
            }
            x = (nd.x - dx) / radial;
            y = (nd.y - dy) / radial;
        }
        Point2::new(x, y)
    }

    fn distortion_terms(&self, x: f64, y: f64) -> (f64, f64, f64) {
        let [k1, k2, p1, p2, k3, k4, k5, k6] = self.distortion;
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let num = 1.0 + k1 * r2 + k2 * r4 + k3 * r6;
        let den = 1.0 + k4 * r2 + k5 * r4 + k6 * r6;
        let radial = if den.abs() > 1e-12 { num / den } else { num };
        let dx = 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
        let dy = p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;
        (radial, dx, dy)
    }

    #[inline]
    pub fn normalized_to_pixel(&self, n: Pt2) -> Pt2 {
        Point2::new(self.fx * n.x + self.cx, self.fy * n.y + self.cy)
    }

    #[inline]
    pub fn pixel_to_normalized_distorted(&self, p: Pt2) -> Pt2 {
        Point2::new((p.x - self.cx) / self.fx, (p.y - self.cy) / self.fy)
    }

    /// Pixel to undistorted normalized image coordinate.
    pub fn pixel_to_normalized(&self, p: Pt2) -> Pt2 {
        self.undistort(self.pixel_to_normalized_distorted(p))
    }

    /// Project a point given in the EDN camera frame to pixels.
    ///
    /// Points behind the camera are projected as-is (mirrored), matching
    /// OpenCV's `projectPoints`.
    pub fn project_edn(&self, p: &Vec3) -> Pt2 {
        let n = Point2::new(p.x / p.z, p.y / p.z);
        self.normalized_to_pixel(self.distort(n))
    }

    /// Unit-free ray through a pixel in the EDN camera frame (`z = 1`).
    pub fn pixel_ray_edn(&self, p: Pt2) -> Vec3 {
        let n = self.pixel_to_normalized(p);
        Vector3::new(n.x, n.y, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn distorted() -> CameraCalibration {
        CameraCalibration::new(600.0, 605.0, 320.0, 240.0)
            .with_distortion(&[-0.12, 0.05, 0.001, -0.0005, 0.01])
    }

    #[test]
    fn undistort_inverts_distort() {
        let cam = distorted();
        for n in [
            Point2::new(0.0, 0.0),
            Point2::new(0.2, -0.1),
            Point2::new(-0.35, 0.28),
        ] {
            let back = cam.undistort(cam.distort(n));
            assert_relative_eq!(back, n, epsilon = 1e-9);
        }
    }

    #[test]
    fn pixel_round_trip() {
        let cam = distorted();
        let p = Point2::new(101.5, 377.25);
        let n = cam.pixel_to_normalized(p);
        let back = cam.normalized_to_pixel(cam.distort(n));
        assert_relative_eq!(back, p, epsilon = 1e-6);
    }

    #[test]
    fn center_ray_projects_to_principal_point() {
        let cam = distorted();
        let px = cam.project_edn(&Vector3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(px, Point2::new(320.0, 240.0), epsilon = 1e-12);
    }

    #[test]
    fn five_coefficients_pad_with_zero() {
        let cam = distorted();
        assert_eq!(cam.distortion[5..], [0.0, 0.0, 0.0]);
        let k = cam.k_matrix();
        let again = CameraCalibration::from_matrix(&k, &cam.distortion);
        assert_eq!(again, cam);
    }
}
