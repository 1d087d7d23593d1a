use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};
use photon_targeting_core::{Pose3, Pt3, Vec3};
use serde::{Deserialize, Serialize};

const INCH_M: f64 = 0.0254;

/// Edge length of a 36h11 AprilTag (outer black border), meters.
pub const APRILTAG_36H11_SIZE_M: f64 = 6.5 * INCH_M;
/// Edge length of a 16h5 AprilTag, meters.
pub const APRILTAG_16H5_SIZE_M: f64 = 6.0 * INCH_M;

/// 3D shape of a target in its own frame.
///
/// The frame is NWU with the target facing +X. Planar targets lie in the
/// `x = 0` plane and list their vertices counter-clockwise as seen from the
/// front, starting bottom-left.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetModel {
    pub vertices: Vec<Pt3>,
    pub is_planar: bool,
    pub is_spherical: bool,
}

impl TargetModel {
    /// Flat rectangle, `width` along Y and `height` along Z.
    pub fn planar_rect(width_m: f64, height_m: f64) -> Self {
        let w = width_m / 2.0;
        let h = height_m / 2.0;
        Self {
            vertices: vec![
                Point3::new(0.0, -w, -h),
                Point3::new(0.0, w, -h),
                Point3::new(0.0, w, h),
                Point3::new(0.0, -w, h),
            ],
            is_planar: true,
            is_spherical: false,
        }
    }

    /// Rectangular box centered on the origin.
    pub fn cuboid(length_m: f64, width_m: f64, height_m: f64) -> Self {
        let l = length_m / 2.0;
        let w = width_m / 2.0;
        let h = height_m / 2.0;
        Self {
            vertices: vec![
                Point3::new(l, w, -h),
                Point3::new(l, -w, -h),
                Point3::new(l, -w, h),
                Point3::new(l, w, h),
                Point3::new(-l, w, h),
                Point3::new(-l, -w, h),
                Point3::new(-l, -w, -h),
                Point3::new(-l, w, -h),
            ],
            is_planar: false,
            is_spherical: false,
        }
    }

    /// Sphere; the four vertices trace its silhouette when the model is
    /// turned toward the camera with [`TargetModel::oriented_pose`].
    pub fn sphere(diameter_m: f64) -> Self {
        let r = diameter_m / 2.0;
        Self {
            vertices: vec![
                Point3::new(0.0, -r, 0.0),
                Point3::new(0.0, 0.0, -r),
                Point3::new(0.0, r, 0.0),
                Point3::new(0.0, 0.0, r),
            ],
            is_planar: false,
            is_spherical: true,
        }
    }

    /// Arbitrary point cloud. Treated as non-planar.
    pub fn from_vertices(vertices: Vec<Pt3>) -> Self {
        Self {
            vertices,
            is_planar: false,
            is_spherical: false,
        }
    }

    pub fn apriltag_36h11() -> Self {
        Self::planar_rect(APRILTAG_36H11_SIZE_M, APRILTAG_36H11_SIZE_M)
    }

    pub fn apriltag_16h5() -> Self {
        Self::planar_rect(APRILTAG_16H5_SIZE_M, APRILTAG_16H5_SIZE_M)
    }

    /// Vertices expressed in the frame `target_pose` is given in.
    pub fn field_vertices(&self, target_pose: &Pose3) -> Vec<Pt3> {
        self.vertices
            .iter()
            .map(|v| target_pose.transform_point(v))
            .collect()
    }

    /// Pose at `target_trl` whose +X axis points at `camera_trl`.
    pub fn oriented_pose(target_trl: &Vec3, camera_trl: &Vec3) -> Pose3 {
        let rel = camera_trl - target_trl;
        let pitch = (-rel.z).atan2(rel.x.hypot(rel.y));
        let yaw = rel.y.atan2(rel.x);
        Isometry3::from_parts(
            Translation3::from(*target_trl),
            UnitQuaternion::from_euler_angles(0.0, pitch, yaw),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use photon_targeting_core::pose_from_xyz_rpy;

    #[test]
    fn apriltag_is_square_in_the_yz_plane() {
        let m = TargetModel::apriltag_36h11();
        assert!(m.is_planar && !m.is_spherical);
        assert_eq!(m.vertices.len(), 4);
        for v in &m.vertices {
            assert_eq!(v.x, 0.0);
            assert_relative_eq!(v.y.abs(), APRILTAG_36H11_SIZE_M / 2.0);
            assert_relative_eq!(v.z.abs(), APRILTAG_36H11_SIZE_M / 2.0);
        }
    }

    #[test]
    fn field_vertices_follow_pose() {
        let m = TargetModel::planar_rect(0.2, 0.1);
        let pose = pose_from_xyz_rpy(3.0, 1.0, 0.5, 0.0, 0.0, std::f64::consts::PI);
        let verts = m.field_vertices(&pose);
        // turned around: +Y in the target frame is -Y in the field
        assert_relative_eq!(verts[0], Point3::new(3.0, 1.1, 0.45), epsilon = 1e-12);
    }

    #[test]
    fn oriented_pose_faces_camera() {
        let target = Vec3::new(2.0, 1.0, 0.5);
        let camera = Vec3::new(0.0, 3.0, 1.5);
        let pose = TargetModel::oriented_pose(&target, &camera);
        let forward = pose.rotation * Vec3::x();
        let to_cam = (camera - target).normalize();
        assert_relative_eq!(forward, to_cam, epsilon = 1e-12);
    }
}
