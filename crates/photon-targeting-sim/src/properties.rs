//! Intrinsics, noise and timing of a simulated camera.

use nalgebra::{UnitQuaternion, Vector3};
use photon_targeting_core::{Pose3, Pt2, Pt3, Rot3, Vec3};
use photon_targeting_pnp::{get_contour_area_pixels, get_convex_hull, CameraCalibration};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

const MIN_FOV_DEG: f64 = 1.0;
const MAX_FOV_DEG: f64 = 179.0;
/// Points closer than this to a view plane count as on it.
const PLANE_TOLERANCE: f64 = 1e-4;

/// Everything a simulated camera needs besides its pose: resolution,
/// calibration, detection noise and frame timing.
///
/// Setting a calibration recomputes the four frustum planes.
#[derive(Clone, Debug, PartialEq)]
pub struct SimCameraProperties {
    width: u32,
    height: u32,
    calibration: CameraCalibration,
    avg_error_px: f64,
    error_std_dev_px: f64,
    frame_period_ms: f64,
    exposure_time_ms: f64,
    avg_latency_ms: f64,
    latency_std_dev_ms: f64,
    /// Inward normals of the left, right, top and bottom frustum planes
    /// (camera frame, NWU).
    viewplanes: [Vec3; 4],
}

impl Default for SimCameraProperties {
    /// 960x720 with a 90 degree diagonal FOV, no distortion, no noise.
    fn default() -> Self {
        let mut props = Self {
            width: 0,
            height: 0,
            calibration: CameraCalibration::default(),
            avg_error_px: 0.0,
            error_std_dev_px: 0.0,
            frame_period_ms: 0.0,
            exposure_time_ms: 0.0,
            avg_latency_ms: 0.0,
            latency_std_dev_ms: 0.0,
            viewplanes: [Vec3::x(); 4],
        };
        props.set_calibration_fov(960, 720, 90.0);
        props
    }
}

impl SimCameraProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ideal pinhole camera from a diagonal field of view in degrees.
    ///
    /// The FOV is clamped to (1, 179) degrees; the principal point sits at
    /// the image center.
    pub fn set_calibration_fov(&mut self, width: u32, height: u32, diag_fov_deg: f64) {
        let mut fov = diag_fov_deg;
        if !(MIN_FOV_DEG..=MAX_FOV_DEG).contains(&fov) {
            fov = fov.clamp(MIN_FOV_DEG, MAX_FOV_DEG);
            log::warn!("diagonal FOV {diag_fov_deg} deg out of range; clamped to {fov}");
        }
        let (w, h) = (width as f64, height as f64);
        let diag = w.hypot(h);
        let diag_ratio = (fov.to_radians() / 2.0).tan();
        let hfov = (diag_ratio * (w / diag)).atan() * 2.0;
        let vfov = (diag_ratio * (h / diag)).atan() * 2.0;
        let cx = w / 2.0 - 0.5;
        let cy = h / 2.0 - 0.5;
        let fx = cx / (hfov / 2.0).tan();
        let fy = cy / (vfov / 2.0).tan();
        self.set_calibration(width, height, CameraCalibration::new(fx, fy, cx, cy));
    }

    pub fn set_calibration(&mut self, width: u32, height: u32, calibration: CameraCalibration) {
        self.width = width;
        self.height = height;
        self.calibration = calibration;

        let (w, h) = (width as f64, height as f64);
        let plane = |pitch: f64, yaw: f64| -> Vec3 {
            (UnitQuaternion::from_euler_angles(0.0, pitch, yaw) * Vector3::x()).normalize()
        };
        self.viewplanes = [
            plane(0.0, self.pixel_yaw(0.0) - FRAC_PI_2),
            plane(0.0, self.pixel_yaw(w) + FRAC_PI_2),
            plane(self.pixel_pitch(0.0) + FRAC_PI_2, 0.0),
            plane(self.pixel_pitch(h) - FRAC_PI_2, 0.0),
        ];
    }

    /// Mean and standard deviation of the per-corner pixel error.
    pub fn set_calib_error(&mut self, avg_error_px: f64, error_std_dev_px: f64) {
        self.avg_error_px = avg_error_px;
        self.error_std_dev_px = error_std_dev_px;
    }

    /// Frame rate; the frame period never drops below the exposure time.
    pub fn set_fps(&mut self, fps: f64) {
        self.frame_period_ms = (1000.0 / fps).max(self.exposure_time_ms);
    }

    pub fn set_exposure_time_ms(&mut self, exposure_time_ms: f64) {
        self.exposure_time_ms = exposure_time_ms;
        self.frame_period_ms = self.frame_period_ms.max(exposure_time_ms);
    }

    pub fn set_avg_latency_ms(&mut self, avg_latency_ms: f64) {
        self.avg_latency_ms = avg_latency_ms;
    }

    pub fn set_latency_std_dev_ms(&mut self, latency_std_dev_ms: f64) {
        self.latency_std_dev_ms = latency_std_dev_ms;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn res_area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn calibration(&self) -> &CameraCalibration {
        &self.calibration
    }

    pub fn avg_error_px(&self) -> f64 {
        self.avg_error_px
    }

    pub fn error_std_dev_px(&self) -> f64 {
        self.error_std_dev_px
    }

    pub fn fps(&self) -> f64 {
        1000.0 / self.frame_period_ms
    }

    pub fn frame_period_ms(&self) -> f64 {
        self.frame_period_ms
    }

    pub fn exposure_time_ms(&self) -> f64 {
        self.exposure_time_ms
    }

    pub fn avg_latency_ms(&self) -> f64 {
        self.avg_latency_ms
    }

    pub fn latency_std_dev_ms(&self) -> f64 {
        self.latency_std_dev_ms
    }

    pub fn viewplanes(&self) -> &[Vec3; 4] {
        &self.viewplanes
    }

    /// Percentage of the image covered by the convex hull of `points`.
    pub fn contour_area_percent(&self, points: &[Pt2]) -> f64 {
        get_contour_area_pixels(&get_convex_hull(points)) / self.res_area() * 100.0
    }

    /// Yaw (radians, NWU, left positive) of the ray through pixel column `x`.
    pub fn pixel_yaw(&self, x: f64) -> f64 {
        (self.calibration.cx - x).atan2(self.calibration.fx)
    }

    /// Pitch (radians, NWU, down positive) of the ray through pixel row `y`.
    pub fn pixel_pitch(&self, y: f64) -> f64 {
        (y - self.calibration.cy).atan2(self.calibration.fy)
    }

    /// Rotation from the optical axis to the ray through `p`; yaw and pitch
    /// computed independently.
    pub fn pixel_rot(&self, p: Pt2) -> Rot3 {
        UnitQuaternion::from_euler_angles(0.0, self.pixel_pitch(p.y), self.pixel_yaw(p.x))
    }

    /// Like [`Self::pixel_rot`] but with pitch corrected for the yaw.
    pub fn corrected_pixel_rot(&self, p: Pt2) -> Rot3 {
        let c = &self.calibration;
        let x_offset = c.cx - p.x;
        let y_offset = c.cy - p.y;
        let yaw = x_offset.atan2(c.fx);
        let pitch = (-y_offset).atan2(c.fy / (x_offset / c.fx).atan().cos());
        UnitQuaternion::from_euler_angles(0.0, pitch, yaw)
    }

    pub fn horiz_fov(&self) -> f64 {
        self.pixel_yaw(0.0) - self.pixel_yaw(self.width as f64)
    }

    pub fn vert_fov(&self) -> f64 {
        self.pixel_pitch(self.height as f64) - self.pixel_pitch(0.0)
    }

    pub fn diag_fov(&self) -> f64 {
        self.horiz_fov().hypot(self.vert_fov())
    }

    /// Visible part of the segment `a -> b` (field frame) for a camera at
    /// `camera_pose`, as parameters in `[0, 1]` along the segment.
    ///
    /// `(None, None)` means nothing is visible. A single `Some` lower bound
    /// with `None` upper bound is returned when the segment only touches the
    /// frustum at one point.
    pub fn get_visible_line(
        &self,
        camera_pose: &Pose3,
        a: &Pt3,
        b: &Pt3,
    ) -> (Option<f64>, Option<f64>) {
        let av = camera_pose.inverse_transform_point(a).coords;
        let bv = camera_pose.inverse_transform_point(b).coords;
        if av.x <= 0.0 && bv.x <= 0.0 {
            return (None, None);
        }
        let ab = bv - av;

        let mut a_visible = true;
        let mut b_visible = true;
        for normal in &self.viewplanes {
            let da = av.dot(normal);
            let db = bv.dot(normal);
            if da < 0.0 {
                a_visible = false;
            }
            if db < 0.0 {
                b_visible = false;
            }
            if da <= 0.0 && db <= 0.0 {
                return (None, None);
            }
        }
        if a_visible && b_visible {
            return (Some(0.0), Some(1.0));
        }

        let mut hits: Vec<(f64, Vec3)> = Vec::with_capacity(2);
        for (i, normal) in self.viewplanes.iter().enumerate() {
            let denom = ab.dot(normal);
            if denom.abs() < 1e-12 {
                continue;
            }
            let t = -av.dot(normal) / denom;
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let point = av + ab * t;
            let outside = self
                .viewplanes
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && point.dot(other) < -PLANE_TOLERANCE);
            if outside {
                continue;
            }
            if hits.iter().any(|(_, p)| (p - point).amax() < PLANE_TOLERANCE) {
                continue;
            }
            hits.push((t, point));
            if hits.len() == 2 {
                break;
            }
        }

        match hits.as_slice() {
            [] => (None, None),
            [(t, _)] => {
                if a_visible {
                    (Some(0.0), Some(*t))
                } else if b_visible {
                    (Some(*t), Some(1.0))
                } else {
                    (Some(*t), None)
                }
            }
            [(t1, _), (t2, _), ..] => {
                let lo = if a_visible { 0.0 } else { t1.min(*t2) };
                let hi = if b_visible { 1.0 } else { t1.max(*t2) };
                (Some(lo), Some(hi))
            }
        }
    }

    /// Move each point by `N(avg, std)` pixels in a uniformly random
    /// direction. Noise-free properties return the points unchanged.
    pub fn estimate_pixel_noise<R: Rng>(&self, rng: &mut R, points: &[Pt2]) -> Vec<Pt2> {
        if self.avg_error_px == 0.0 && self.error_std_dev_px == 0.0 {
            return points.to_vec();
        }
        points
            .iter()
            .map(|p| {
                let z: f64 = rng.sample(StandardNormal);
                let error = self.avg_error_px + z * self.error_std_dev_px;
                let angle = rng.gen_range(-PI..PI);
                Pt2::new(p.x + error * angle.cos(), p.y + error * angle.sin())
            })
            .collect()
    }

    /// Sampled processing latency, never negative.
    pub fn estimate_latency_ms<R: Rng>(&self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        (self.avg_latency_ms + z * self.latency_std_dev_ms).max(0.0)
    }

    /// Time until the next frame; a slow frame delays the one after it.
    pub fn estimate_ms_until_next_frame<R: Rng>(&self, rng: &mut R) -> f64 {
        self.frame_period_ms + (self.estimate_latency_ms(rng) - self.frame_period_ms).max(0.0)
    }

    /// Ideal 960x720 camera with a 90 degree diagonal FOV.
    pub fn perfect_90deg() -> Self {
        Self::default()
    }

    pub fn pi4_lifecam_320_240() -> Self {
        Self::calibrated(
            320,
            240,
            [328.2733242048587, 318.0609794305216, 164.8190261141906, 123.8633838438093],
            &[
                0.09957946553445934,
                -0.9166265114485799,
                0.0019519890627236526,
                -0.0036071725380870333,
                1.5627234622420942,
            ],
            (0.21, 0.0124),
            30.0,
            (30.0, 10.0),
        )
    }

    pub fn pi4_lifecam_640_480() -> Self {
        Self::calibrated(
            640,
            480,
            [669.1428078983059, 646.9843137061716, 322.53377249329213, 241.26567383784163],
            &[
                0.12788470750464645,
                -1.2350335805796528,
                0.0024990767286192732,
                -0.0026958287600230705,
                2.2951386729115537,
            ],
            (0.26, 0.046),
            15.0,
            (65.0, 15.0),
        )
    }

    pub fn ll2_640_480() -> Self {
        Self::calibrated(
            640,
            480,
            [511.22843367007755, 514.5452336723849, 323.62049380211096, 261.8827920543568],
            &[
                0.1917469998873756,
                -0.5142936883324216,
                0.012461562046896614,
                0.0014084973492408186,
                0.35160648971214437,
            ],
            (0.25, 0.05),
            15.0,
            (35.0, 8.0),
        )
    }

    pub fn ll2_960_720() -> Self {
        Self::calibrated(
            960,
            720,
            [769.6873145148892, 773.8164483705323, 486.1096609458122, 384.66071662358354],
            &[
                0.189462064814501,
                -0.49903003669627627,
                0.007468423590519429,
                0.002496885298683693,
                0.3443122090208624,
            ],
            (0.35, 0.10),
            10.0,
            (50.0, 15.0),
        )
    }

    pub fn ll2_1280_720() -> Self {
        Self::calibrated(
            1280,
            720,
            [1011.3749416937393, 1008.5391755084075, 645.4955139388737, 508.32877656020196],
            &[
                0.13730101577061535,
                -0.2904345656989261,
                8.32475714507539e-4,
                -3.694397782014239e-4,
                0.09487962227027584,
            ],
            (0.37, 0.06),
            7.0,
            (60.0, 20.0),
        )
    }

    pub fn op7251_1280_800() -> Self {
        Self::calibrated(
            1280,
            800,
            [935.3590815289085, 935.1226567753917, 650.5203893426366, 415.7641211213582],
            &[
                0.049718154024913785,
                -0.0837536618373574,
                0.0004016405669924839,
                -0.0009453463520286367,
                0.02553281154574853,
            ],
            (0.35, 0.10),
            60.0,
            (20.0, 5.0),
        )
    }

    /// `k` is `[fx, fy, cx, cy]`, `latency` is `(avg, std)` in ms.
    fn calibrated(
        width: u32,
        height: u32,
        k: [f64; 4],
        distortion: &[f64],
        calib_error: (f64, f64),
        fps: f64,
        latency: (f64, f64),
    ) -> Self {
        let mut props = Self::default();
        let calibration =
            CameraCalibration::new(k[0], k[1], k[2], k[3]).with_distortion(distortion);
        props.set_calibration(width, height, calibration);
        props.set_calib_error(calib_error.0, calib_error.1);
        props.set_fps(fps);
        props.set_avg_latency_ms(latency.0);
        props.set_latency_std_dev_ms(latency.1);
        props
    }
}

/// Serializable description of a simulated camera.
///
/// A `calibration` overrides `diag_fov_deg`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimCameraConfig {
    pub width: u32,
    pub height: u32,
    pub diag_fov_deg: f64,
    pub calibration: Option<CameraCalibration>,
    pub avg_error_px: f64,
    pub error_std_dev_px: f64,
    pub fps: f64,
    pub exposure_time_ms: f64,
    pub avg_latency_ms: f64,
    pub latency_std_dev_ms: f64,
    pub min_target_area_px: f64,
    pub max_sight_range_m: Option<f64>,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimCameraConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
            diag_fov_deg: 90.0,
            calibration: None,
            avg_error_px: 0.0,
            error_std_dev_px: 0.0,
            fps: 30.0,
            exposure_time_ms: 0.0,
            avg_latency_ms: 0.0,
            latency_std_dev_ms: 0.0,
            min_target_area_px: crate::camera_sim::DEFAULT_MIN_AREA_PX,
            max_sight_range_m: None,
            seed: None,
        }
    }
}

impl SimCameraConfig {
    pub fn to_properties(&self) -> SimCameraProperties {
        let mut props = SimCameraProperties::default();
        match &self.calibration {
            Some(calibration) => props.set_calibration(self.width, self.height, *calibration),
            None => props.set_calibration_fov(self.width, self.height, self.diag_fov_deg),
        }
        props.set_calib_error(self.avg_error_px, self.error_std_dev_px);
        props.set_exposure_time_ms(self.exposure_time_ms);
        if self.fps > 0.0 {
            props.set_fps(self.fps);
        }
        props.set_avg_latency_ms(self.avg_latency_ms);
        props.set_latency_std_dev_ms(self.latency_std_dev_ms);
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fov80() -> SimCameraProperties {
        let mut props = SimCameraProperties::new();
        props.set_calibration_fov(640, 480, 80.0);
        props
    }

    #[test]
    fn fov_calibration_matches_requested_diagonal() {
        let props = fov80();
        let c = props.calibration();
        assert_relative_eq!(c.cx, 319.5);
        assert_relative_eq!(c.cy, 239.5);
        // horizontal and vertical halves measured to the pixel-center edges
        let hfov = 2.0 * (319.5 / c.fx).atan();
        let vfov = 2.0 * (239.5 / c.fy).atan();
        let diag_ratio = 40f64.to_radians().tan();
        assert_relative_eq!((hfov / 2.0).tan(), diag_ratio * 0.8, epsilon = 1e-12);
        assert_relative_eq!((vfov / 2.0).tan(), diag_ratio * 0.6, epsilon = 1e-12);
        assert!(!c.has_distortion());
    }

    #[test]
    fn fov_is_clamped() {
        let mut props = SimCameraProperties::new();
        props.set_calibration_fov(640, 480, 200.0);
        assert!(props.horiz_fov().to_degrees() < 180.0);
        assert!(props.calibration().fx.is_finite());
    }

    #[test]
    fn viewplanes_point_inward() {
        let props = fov80();
        for n in props.viewplanes() {
            assert!(Vec3::x().dot(n) > 0.0);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        }
        // far to the left is outside the left plane only
        let left = Vec3::new(1.0, 5.0, 0.0);
        assert!(left.dot(&props.viewplanes()[0]) < 0.0);
        assert!(left.dot(&props.viewplanes()[1]) > 0.0);
        // far up is outside the top plane
        let up = Vec3::new(1.0, 0.0, 5.0);
        assert!(up.dot(&props.viewplanes()[2]) < 0.0);
    }

    #[test]
    fn visible_line_fully_inside() {
        let props = fov80();
        let cam = Pose3::identity();
        let a = Pt3::new(3.0, -0.2, 0.0);
        let b = Pt3::new(3.0, 0.2, 0.1);
        assert_eq!(props.get_visible_line(&cam, &a, &b), (Some(0.0), Some(1.0)));
    }

    #[test]
    fn visible_line_behind_or_off_axis() {
        let props = fov80();
        let cam = Pose3::identity();
        let yaw = 95f64.to_radians();
        let dir = Vec3::new(yaw.cos(), yaw.sin(), 0.0);
        let a = Pt3::from(dir * 2.0);
        let b = Pt3::from(dir * 4.0 + Vec3::new(0.0, 0.0, 0.3));
        assert_eq!(props.get_visible_line(&cam, &a, &b), (None, None));

        // both ends left of the frustum
        let a = Pt3::new(1.0, 3.0, 0.0);
        let b = Pt3::new(2.0, 5.0, 0.0);
        assert_eq!(props.get_visible_line(&cam, &a, &b), (None, None));
    }

    #[test]
    fn visible_line_straddling_one_plane() {
        let props = fov80();
        let cam = Pose3::identity();
        let a = Pt3::new(2.0, 0.0, 0.0);
        let b = Pt3::new(2.0, -6.0, 0.0);
        let (lo, hi) = props.get_visible_line(&cam, &a, &b);
        assert_eq!(lo, Some(0.0));
        let t = hi.expect("upper bound");
        // the right plane passes through the ray of pixel column `width`
        let c = props.calibration();
        let expected = 2.0 * (640.0 - c.cx) / c.fx / 6.0;
        assert_relative_eq!(t, expected, epsilon = 1e-3);

        let (lo, hi) = props.get_visible_line(&cam, &b, &a);
        assert_relative_eq!(lo.expect("lower"), 1.0 - expected, epsilon = 1e-3);
        assert_eq!(hi, Some(1.0));
    }

    #[test]
    fn noise_free_properties_keep_points() {
        let props = fov80();
        let mut rng = StdRng::seed_from_u64(7);
        let pts = [Pt2::new(1.0, 2.0), Pt2::new(3.0, 4.0)];
        assert_eq!(props.estimate_pixel_noise(&mut rng, &pts), pts.to_vec());
        assert_eq!(props.estimate_latency_ms(&mut rng), 0.0);
    }

    #[test]
    fn noise_magnitude_follows_mean() {
        let mut props = fov80();
        props.set_calib_error(0.5, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let pts = vec![Pt2::new(100.0, 100.0); 16];
        for (p, q) in pts.iter().zip(props.estimate_pixel_noise(&mut rng, &pts)) {
            assert_relative_eq!((q - p).norm(), 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn frame_timing() {
        let mut props = fov80();
        props.set_fps(50.0);
        assert_relative_eq!(props.frame_period_ms(), 20.0);
        props.set_exposure_time_ms(35.0);
        assert_relative_eq!(props.frame_period_ms(), 35.0);
        props.set_fps(100.0);
        assert_relative_eq!(props.frame_period_ms(), 35.0);

        props.set_avg_latency_ms(50.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_relative_eq!(props.estimate_ms_until_next_frame(&mut rng), 50.0);
    }

    #[test]
    fn pixel_rotation_signs() {
        let props = fov80();
        let c = *props.calibration();
        // left of center is positive yaw, below center is positive pitch
        assert!(props.pixel_yaw(c.cx - 50.0) > 0.0);
        assert!(props.pixel_pitch(c.cy + 50.0) > 0.0);
        let rot = props.pixel_rot(Pt2::new(c.cx - 50.0, c.cy + 50.0));
        let (_, pitch, yaw) = rot.euler_angles();
        assert_relative_eq!(yaw, (50.0 / c.fx).atan(), epsilon = 1e-12);
        assert_relative_eq!(pitch, (50.0 / c.fy).atan(), epsilon = 1e-12);
        let hfov = (319.5 / c.fx).atan() + (320.5 / c.fx).atan();
        assert_relative_eq!(props.horiz_fov(), hfov, epsilon = 1e-12);
    }

    #[test]
    fn presets_have_sane_shapes() {
        for props in [
            SimCameraProperties::perfect_90deg(),
            SimCameraProperties::pi4_lifecam_320_240(),
            SimCameraProperties::pi4_lifecam_640_480(),
            SimCameraProperties::ll2_640_480(),
            SimCameraProperties::ll2_960_720(),
            SimCameraProperties::ll2_1280_720(),
            SimCameraProperties::op7251_1280_800(),
        ] {
            let c = props.calibration();
            assert!(c.cx > 0.0 && c.cx < props.width() as f64);
            assert!(c.cy > 0.0 && c.cy < props.height() as f64);
            let hfov = props.horiz_fov().to_degrees();
            assert!((30.0..120.0).contains(&hfov), "hfov {hfov}");
        }
    }

    #[test]
    fn config_builds_properties() {
        let cfg = SimCameraConfig {
            width: 640,
            height: 480,
            diag_fov_deg: 80.0,
            fps: 50.0,
            ..SimCameraConfig::default()
        };
        let props = cfg.to_properties();
        assert_eq!(props, {
            let mut p = fov80();
            p.set_fps(50.0);
            p
        });
        let json = serde_json::to_string(&cfg).expect("ser");
        let back: SimCameraConfig = serde_json::from_str(&json).expect("de");
        assert_eq!(back, cfg);
        let partial: SimCameraConfig = serde_json::from_str(r#"{"fps": 15}"#).expect("partial");
        assert_eq!(partial.width, 960);
    }
}
