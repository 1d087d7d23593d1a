use crate::Pt2;
use nalgebra::{DMatrix, Matrix2, Matrix3, Point2, Vector3};

/// Planar projective map `dst ~ H * src`, normalized so `h[(2, 2)] == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Pt2) -> Pt2 {
        let v = self.h * p.to_homogeneous();
        Point2::new(v.x / v.z, v.y / v.z)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().and_then(unit_scale).map(Self::new)
    }

    /// 2x2 derivative of [`Self::apply`] at `p`.
    pub fn jacobian_at(&self, p: Pt2) -> Matrix2<f64> {
        let h = &self.h;
        let v = h * p.to_homogeneous();
        let (u, w) = (Point2::new(v.x / v.z, v.y / v.z), v.z);
        Matrix2::new(
            h[(0, 0)] - u.x * h[(2, 0)],
            h[(0, 1)] - u.x * h[(2, 1)],
            h[(1, 0)] - u.y * h[(2, 0)],
            h[(1, 1)] - u.y * h[(2, 1)],
        ) / w
    }
}

/// Similarity that moves the centroid to the origin and the mean distance
/// from it to `sqrt(2)`.
fn conditioner(points: &[Pt2]) -> Matrix3<f64> {
    let n = points.len() as f64;
    let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.to_homogeneous()) / n;
    let spread = points
        .iter()
        .map(|p| (p.x - centroid.x).hypot(p.y - centroid.y))
        .sum::<f64>()
        / n;
    let s = if spread > 1e-12 {
        std::f64::consts::SQRT_2 / spread
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * centroid.x, 0.0, s, -s * centroid.y, 0.0, 0.0, 1.0)
}

fn unit_scale(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if !s.is_finite() || s.abs() < 1e-12 {
        return None;
    }
    let h = h / s;
    h.iter().all(|v| v.is_finite()).then_some(h)
}

/// Least-squares `H` with `dst ~ H * src` from four or more correspondences.
///
/// Both point sets are conditioned before the DLT; the solution is the right
/// singular vector of the smallest singular value.
pub fn estimate_homography(src: &[Pt2], dst: &[Pt2]) -> Option<Homography> {
    let n = src.len();
    if n != dst.len() || n < 4 {
        return None;
    }
    let t_src = conditioner(src);
    let t_dst = conditioner(dst);

    // a square system keeps V^T complete for the four-point case
    let mut a = DMatrix::<f64>::zeros((2 * n).max(9), 9);
    for (k, (s, d)) in src.iter().zip(dst).enumerate() {
        let p = t_src * s.to_homogeneous();
        let q = t_dst * d.to_homogeneous();
        let (x, y, u, v) = (p.x, p.y, q.x, q.y);
        let rows = [
            [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, -u],
            [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, -v],
        ];
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                a[(2 * k + r, c)] = *value;
            }
        }
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let (smallest, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|l, r| l.1.total_cmp(r.1))?;
    let h = v_t.row(smallest);
    let conditioned = Matrix3::from_fn(|r, c| h[3 * r + c]);

    let h = t_dst.try_inverse()? * conditioned * t_src;
    unit_scale(h).map(Homography::new)
}
