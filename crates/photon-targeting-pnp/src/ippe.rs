//! Infinitesimal plane-based pose estimation (IPPE).
//!
//! Recovers both physically valid poses of a planar point set from the
//! homography between the plane and normalized image coordinates. The two
//! rotations come from the first-order expansion of that homography at the
//! plane's centroid; translations are then solved by linear least squares.
//!
//! Reference: T. Collins and A. Bartoli, "Infinitesimal Plane-based Pose
//! Estimation", IJCV 2014.

use crate::error::PnpError;
use nalgebra::{
    Isometry3, Matrix2, Matrix2x3, Matrix3, Point2, Rotation3, Translation3, UnitQuaternion,
    Vector3,
};
use photon_targeting_core::{estimate_homography, Pose3, Pt2, Pt3, Vec3};

/// Scatter eigenvalue ratio under which a point set counts as planar.
const PLANAR_RATIO: f64 = 1e-10;

/// Best-fit plane of a point set.
#[derive(Clone, Debug)]
pub(crate) struct PlaneFit {
    pub center: Vec3,
    /// Columns: in-plane axes `e1`, `e2` and the normal; a proper rotation.
    pub basis: Matrix3<f64>,
    /// Smallest over largest scatter eigenvalue.
    pub flatness: f64,
}

impl PlaneFit {
    pub fn is_planar(&self) -> bool {
        self.flatness <= PLANAR_RATIO
    }

    fn to_plane(&self, p: &Pt3) -> Pt2 {
        let d = self.basis.transpose() * (p.coords - self.center);
        Point2::new(d.x, d.y)
    }
}

pub(crate) fn fit_plane(points: &[Pt3]) -> Result<PlaneFit, PnpError> {
    if points.len() < 3 {
        return Err(PnpError::NotEnoughPoints {
            needed: 3,
            got: points.len(),
        });
    }
    let n = points.len() as f64;
    let center = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / n;
    let mut scatter = Matrix3::zeros();
    for p in points {
        let d = p.coords - center;
        scatter += d * d.transpose();
    }

    let eig = scatter.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));
    let [i_min, i_mid, i_max] = order;
    let l_max = eig.eigenvalues[i_max];
    if !(l_max > 1e-18) {
        return Err(PnpError::Degenerate("coincident points"));
    }
    if eig.eigenvalues[i_mid] / l_max <= PLANAR_RATIO {
        return Err(PnpError::Degenerate("collinear points"));
    }

    let e1: Vec3 = eig.eigenvectors.column(i_max).into_owned();
    let normal: Vec3 = eig.eigenvectors.column(i_min).into_owned();
    let e2 = normal.cross(&e1);
    Ok(PlaneFit {
        center,
        basis: Matrix3::from_columns(&[e1, e2, normal]),
        flatness: eig.eigenvalues[i_min].max(0.0) / l_max,
    })
}

/// Both IPPE candidates for object points on (or near) `fit`'s plane.
///
/// Returned poses map object points into the camera frame of `image`
/// (normalized, undistorted coordinates).
pub(crate) fn planar_candidates(
    fit: &PlaneFit,
    object: &[Pt3],
    image: &[Pt2],
) -> Result<[Pose3; 2], PnpError> {
    let plane: Vec<Pt2> = object.iter().map(|p| fit.to_plane(p)).collect();
    let [a, b] = ippe(&plane, image)?;
    let basis_t = Rotation3::from_matrix_unchecked(fit.basis.transpose());
    let lift = |(r, t): (Rotation3<f64>, Vec3)| {
        let rot = r * basis_t;
        let trans = t - rot * fit.center;
        Isometry3::from_parts(
            Translation3::from(trans),
            UnitQuaternion::from_rotation_matrix(&rot),
        )
    };
    Ok([lift(a), lift(b)])
}

/// IPPE on plane coordinates (`z = 0`). Returns `(R, t)` pairs.
pub(crate) fn ippe(plane: &[Pt2], image: &[Pt2]) -> Result<[(Rotation3<f64>, Vec3); 2], PnpError> {
    if plane.len() != image.len() {
        return Err(PnpError::LengthMismatch {
            object: plane.len(),
            image: image.len(),
        });
    }
    if plane.len() < 4 {
        return Err(PnpError::NotEnoughPoints {
            needed: 4,
            got: plane.len(),
        });
    }

    let n = plane.len() as f64;
    let c = plane
        .iter()
        .fold(Vector3::zeros(), |acc: Vec3, p| acc + Vector3::new(p.x, p.y, 0.0))
        / n;
    let centered: Vec<Pt2> = plane
        .iter()
        .map(|p| Point2::new(p.x - c.x, p.y - c.y))
        .collect();

    let h = estimate_homography(&centered, image).ok_or(PnpError::Degenerate("homography"))?;
    let h22 = h.h[(2, 2)];
    if h22.abs() < 1e-12 {
        return Err(PnpError::Degenerate("plane through the camera center"));
    }
    let p = h.h[(0, 2)] / h22;
    let q = h.h[(1, 2)] / h22;
    let j = h.jacobian_at(Point2::origin());

    let [r1, r2] = ippe_rotations(&j, p, q)?;
    let t1 = translation_lsq(&r1, &centered, image)? - r1 * c;
    let t2 = translation_lsq(&r2, &centered, image)? - r2 * c;
    Ok([(r1, t1), (r2, t2)])
}

fn ippe_rotations(j: &Matrix2<f64>, p: f64, q: f64) -> Result<[Rotation3<f64>; 2], PnpError> {
    // rotation taking the optical axis onto the ray through the centroid
    let ray = Vector3::new(p, q, 1.0);
    let rv = Rotation3::rotation_between(&Vector3::z(), &ray).unwrap_or_else(Rotation3::identity);
    let rv = rv.matrix();

    let b = Matrix2::new(
        rv[(0, 0)] - p * rv[(2, 0)],
        rv[(0, 1)] - p * rv[(2, 1)],
        rv[(1, 0)] - q * rv[(2, 0)],
        rv[(1, 1)] - q * rv[(2, 1)],
    );
    let b_inv = b
        .try_inverse()
        .ok_or(PnpError::Degenerate("singular IPPE basis"))?;
    let a = b_inv * j;

    // largest singular value of A
    let aat = a * a.transpose();
    let tr = aat[(0, 0)] + aat[(1, 1)];
    let disc = ((aat[(0, 0)] - aat[(1, 1)]).powi(2) + 4.0 * aat[(0, 1)].powi(2)).sqrt();
    let gamma = (0.5 * (tr + disc)).sqrt();
    if !(gamma > 1e-12) {
        return Err(PnpError::Degenerate("vanishing homography Jacobian"));
    }

    let rt = a / gamma;
    let b0 = (1.0 - rt[(0, 0)].powi(2) - rt[(1, 0)].powi(2)).max(0.0).sqrt();
    let mut b1 = (1.0 - rt[(0, 1)].powi(2) - rt[(1, 1)].powi(2)).max(0.0).sqrt();
    let sp = -(rt[(0, 0)] * rt[(0, 1)] + rt[(1, 0)] * rt[(1, 1)]);
    if sp < 0.0 {
        b1 = -b1;
    }

    let build = |sign: f64| -> Result<Rotation3<f64>, PnpError> {
        let c0 = Vector3::new(rt[(0, 0)], rt[(1, 0)], sign * b0);
        let c1 = Vector3::new(rt[(0, 1)], rt[(1, 1)], sign * b1);
        let c2 = c0.cross(&c1);
        project_to_so3(rv * Matrix3::from_columns(&[c0, c1, c2]))
    };
    Ok([build(1.0)?, build(-1.0)?])
}

/// Nearest rotation matrix (SVD projection).
pub(crate) fn project_to_so3(m: Matrix3<f64>) -> Result<Rotation3<f64>, PnpError> {
    let svd = m.svd(true, true);
    let u = svd.u.ok_or(PnpError::Degenerate("svd failed"))?;
    let v_t = svd.v_t.ok_or(PnpError::Degenerate("svd failed"))?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fix = u;
        u_fix.column_mut(2).neg_mut();
        r = u_fix * v_t;
    }
    Ok(Rotation3::from_matrix_unchecked(r))
}

/// Least-squares translation given the rotation: each point contributes
/// `[I | -m] (R X + t) = 0`.
fn translation_lsq(r: &Rotation3<f64>, plane: &[Pt2], image: &[Pt2]) -> Result<Vec3, PnpError> {
    let mut ata = Matrix3::zeros();
    let mut atb = Vector3::zeros();
    for (x, m) in plane.iter().zip(image) {
        let rx = r * Vector3::new(x.x, x.y, 0.0);
        let a = Matrix2x3::new(1.0, 0.0, -m.x, 0.0, 1.0, -m.y);
        let rhs = -(a * rx);
        ata += a.transpose() * a;
        atb += a.transpose() * rhs;
    }
    let inv = ata
        .try_inverse()
        .ok_or(PnpError::Degenerate("translation system is singular"))?;
    Ok(inv * atb)
}
