//! One simulated camera: frame pacing, projection and detection.

use crate::properties::{SimCameraConfig, SimCameraProperties};
use crate::target_sim::VisionTargetSim;
use photon_targeting_core::{
    PhotonPipelineMetadata, PhotonPipelineResult, PhotonTrackedTarget, Pose3, Pt2, TargetCorner,
};
use photon_targeting_estimator::{
    estimate_multi_tag, visible_layout_tags, AprilTagFieldLayout, MonotonicClock, TimeSource,
};
use photon_targeting_pnp::{
    avg_point, min_area_rect, project_points, solve_pnp_square, RotatedRect, TargetModel,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smallest detectable contour, in pixels, before a custom minimum is set.
pub const DEFAULT_MIN_AREA_PX: f64 = 100.0;
/// Frames the pacing loop may skip before it gives up and resyncs.
pub const MAX_MISSED_FRAMES: u32 = 50;

pub struct PhotonCameraSim {
    props: SimCameraProperties,
    min_target_area_percent: f64,
    max_sight_range_m: f64,
    rng: StdRng,
    tag_layout: Option<Arc<AprilTagFieldLayout>>,
    tag_model: TargetModel,
    next_entry_time_us: i64,
    sequence_id: i64,
    clock: Arc<dyn TimeSource>,
}

impl std::fmt::Debug for PhotonCameraSim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotonCameraSim")
            .field("props", &self.props)
            .field("min_target_area_percent", &self.min_target_area_percent)
            .field("max_sight_range_m", &self.max_sight_range_m)
            .field("next_entry_time_us", &self.next_entry_time_us)
            .field("sequence_id", &self.sequence_id)
            .finish_non_exhaustive()
    }
}

fn now_us(clock: &dyn TimeSource) -> i64 {
    (clock.now_seconds() * 1e6).round() as i64
}

impl PhotonCameraSim {
    pub fn new(props: SimCameraProperties) -> Self {
        Self::with_clock(props, Arc::new(MonotonicClock::default()))
    }

    /// Camera whose frame schedule starts at the clock's current time.
    pub fn with_clock(props: SimCameraProperties, clock: Arc<dyn TimeSource>) -> Self {
        let min_target_area_percent = DEFAULT_MIN_AREA_PX / props.res_area() * 100.0;
        Self {
            props,
            min_target_area_percent,
            max_sight_range_m: f64::MAX,
            rng: StdRng::from_entropy(),
            tag_layout: None,
            tag_model: TargetModel::apriltag_36h11(),
            next_entry_time_us: now_us(clock.as_ref()),
            sequence_id: 0,
            clock,
        }
    }

    /// Camera built from a serialized description.
    pub fn from_config(config: &SimCameraConfig, clock: Arc<dyn TimeSource>) -> Self {
        let mut camera = Self::with_clock(config.to_properties(), clock);
        camera.set_min_target_area_pixels(config.min_target_area_px);
        if let Some(range_m) = config.max_sight_range_m {
            camera.max_sight_range_m = range_m;
        }
        match config.seed {
            Some(seed) => camera.with_seed(seed),
            None => camera,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Layout used for the per-frame multi-tag solve; `None` disables it.
    pub fn with_tag_layout(mut self, layout: Option<Arc<AprilTagFieldLayout>>) -> Self {
        self.tag_layout = layout;
        self
    }

    pub fn tag_layout(&self) -> Option<&Arc<AprilTagFieldLayout>> {
        self.tag_layout.as_ref()
    }

    pub fn set_tag_layout(&mut self, layout: Option<Arc<AprilTagFieldLayout>>) {
        self.tag_layout = layout;
    }

    pub fn props(&self) -> &SimCameraProperties {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut SimCameraProperties {
        &mut self.props
    }

    pub fn min_target_area_percent(&self) -> f64 {
        self.min_target_area_percent
    }

    pub fn set_min_target_area_percent(&mut self, percent: f64) {
        self.min_target_area_percent = percent;
    }

    pub fn set_min_target_area_pixels(&mut self, pixels: f64) {
        self.min_target_area_percent = pixels / self.props.res_area() * 100.0;
    }

    pub fn max_sight_range_m(&self) -> f64 {
        self.max_sight_range_m
    }

    pub fn set_max_sight_range_m(&mut self, range_m: f64) {
        self.max_sight_range_m = range_m;
    }

    pub fn tag_model(&self) -> &TargetModel {
        &self.tag_model
    }

    pub fn set_tag_model(&mut self, model: TargetModel) {
        self.tag_model = model;
    }

    pub fn next_entry_time_us(&self) -> i64 {
        self.next_entry_time_us
    }

    /// Whether the target's origin is inside the FOV, in range and, for
    /// planar targets, facing the camera.
    pub fn can_see_target_pose(&self, camera_pose: &Pose3, target: &VisionTargetSim) -> bool {
        let cam_to_target = (camera_pose.inverse() * target.pose).translation.vector;
        let yaw = cam_to_target.y.atan2(cam_to_target.x);
        let pitch = (-cam_to_target.z).atan2(cam_to_target.x.hypot(cam_to_target.y));

        let target_to_cam = (target.pose.inverse() * camera_pose).translation.vector;
        let facing = target_to_cam.y.hypot(target_to_cam.z).atan2(target_to_cam.x);

        yaw.abs() < self.props.horiz_fov() / 2.0
            && pitch.abs() < self.props.vert_fov() / 2.0
            && (!target.model.is_planar || facing.abs() <= std::f64::consts::FRAC_PI_2)
            && cam_to_target.norm() <= self.max_sight_range_m
    }

    /// All points inside the image bounds.
    pub fn can_see_corners(&self, points: &[Pt2]) -> bool {
        let (w, h) = (self.props.width() as f64, self.props.height() as f64);
        points
            .iter()
            .all(|p| (0.0..=w).contains(&p.x) && (0.0..=h).contains(&p.y))
    }

    /// Due frame time when a frame is ready at `now_us`, else `None`.
    ///
    /// The schedule advances by sampled frame periods; once more than
    /// `MAX_MISSED_FRAMES + 1` frames are due at once it resyncs to `now_us`.
    pub fn consume_next_entry_time(&mut self, now_us: i64) -> Option<i64> {
        let mut due = None;
        let mut steps = 0;
        while now_us >= self.next_entry_time_us {
            due = Some(self.next_entry_time_us);
            let frame_us = (self.props.estimate_ms_until_next_frame(&mut self.rng) * 1e3) as i64;
            self.next_entry_time_us += frame_us;
            if steps > MAX_MISSED_FRAMES {
                log::debug!("camera sim fell {steps} frames behind; resyncing");
                due = Some(now_us);
                self.next_entry_time_us = now_us + frame_us;
                break;
            }
            steps += 1;
        }
        due
    }

    pub fn estimate_latency_ms(&mut self) -> f64 {
        self.props.estimate_latency_ms(&mut self.rng)
    }

    /// Simulate one frame published now (per the camera's clock).
    pub fn process(
        &mut self,
        latency_ms: f64,
        camera_pose: &Pose3,
        targets: &[VisionTargetSim],
    ) -> PhotonPipelineResult {
        let publish_us = now_us(self.clock.as_ref());
        self.process_at(latency_ms, camera_pose, targets, publish_us)
    }

    /// Simulate the frame a camera at `camera_pose` publishes at
    /// `publish_us`, captured `latency_ms` earlier.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(targets = targets.len()))
    )]
    pub fn process_at(
        &mut self,
        latency_ms: f64,
        camera_pose: &Pose3,
        targets: &[VisionTargetSim],
        publish_us: i64,
    ) -> PhotonPipelineResult {
        let calibration = *self.props.calibration();
        let mut detected: Vec<PhotonTrackedTarget> = Vec::new();

        for target in targets {
            if !self.can_see_target_pose(camera_pose, target) {
                continue;
            }
            let field_pts = if target.model.is_spherical {
                let facing = TargetModel::oriented_pose(
                    &target.pose.translation.vector,
                    &camera_pose.translation.vector,
                );
                target.model.field_vertices(&facing)
            } else {
                target.field_vertices()
            };
            let mut image = project_points(&calibration, camera_pose, &field_pts);
            if target.model.is_spherical {
                let Some(outline) = sphere_outline(&image) else {
                    continue;
                };
                image = outline.to_vec();
            }

            let noisy = self.props.estimate_pixel_noise(&mut self.rng, &image);
            let Some(rect) = min_area_rect(&noisy) else {
                continue;
            };
            let area = self.props.contour_area_percent(&noisy);
            if !self.can_see_corners(&noisy) || area < self.min_target_area_percent {
                continue;
            }

            let corners: Vec<TargetCorner> =
                noisy.iter().copied().map(TargetCorner::from).collect();
            let (roll, pitch, yaw) = self.props.pixel_rot(rect.center).euler_angles();
            let mut tracked = PhotonTrackedTarget {
                yaw: -yaw.to_degrees(),
                pitch: -pitch.to_degrees(),
                area,
                skew: roll.to_degrees(),
                fiducial_id: target.fiducial_id,
                obj_detect_id: target.obj_detect_id,
                obj_detect_conf: target.obj_detect_conf,
                min_area_rect_corners: rect.corners().into_iter().map(TargetCorner::from).collect(),
                ..Default::default()
            };
            if target.fiducial_id >= 0 && field_pts.len() == 4 {
                let pnp = solve_pnp_square(&calibration, &target.model.vertices, &corners);
                if let Some(pnp) = pnp {
                    tracked.best_camera_to_target = pnp.best;
                    tracked.alt_camera_to_target = pnp.alt;
                    tracked.pose_ambiguity = pnp.ambiguity;
                }
            }
            tracked.detected_corners = corners;
            detected.push(tracked);
        }

        let multi_tag_result = self.tag_layout.as_ref().and_then(|layout| {
            if visible_layout_tags(&detected, layout).len() < 2 {
                return None;
            }
            // published in the layout's native frame, as a coprocessor would
            let mut multi = estimate_multi_tag(&calibration, &detected, layout, &self.tag_model)?;
            let origin = layout.origin();
            multi.estimated_pose.best = origin * multi.estimated_pose.best;
            multi.estimated_pose.alt = origin * multi.estimated_pose.alt;
            Some(multi)
        });

        detected.sort_by(|a, b| b.area.total_cmp(&a.area));

        self.sequence_id += 1;
        let latency_us = (latency_ms * 1e3).round() as i64;
        PhotonPipelineResult::new(
            PhotonPipelineMetadata {
                sequence_id: self.sequence_id,
                capture_timestamp_micros: publish_us - latency_us,
                publish_timestamp_micros: publish_us,
                time_since_last_pong_micros: 0,
            },
            detected,
            multi_tag_result,
        )
    }
}

/// Rectangle through the left, top, right and bottom silhouette points of a
/// camera-facing sphere.
fn sphere_outline(points: &[Pt2]) -> Option<[Pt2; 4]> {
    if points.len() != 4 {
        return None;
    }
    let center = avg_point(points)?;
    let l = (1..4).fold(0, |l, i| if points[i].x < points[l].x { i } else { l });
    let lc = points[l];
    // upward angle of every other point as seen from the left one
    let angle = |i: usize| (lc.y - points[i].y).atan2(points[i].x - lc.x);
    let others: Vec<usize> = (0..4).filter(|&i| i != l).collect();
    let t = *others
        .iter()
        .max_by(|&&a, &&b| angle(a).total_cmp(&angle(b)))?;
    let b = *others
        .iter()
        .min_by(|&&a, &&b| angle(a).total_cmp(&angle(b)))?;
    let r = *others.iter().find(|&&i| i != t && i != b)?;
    let rect = RotatedRect::new(
        center,
        points[r].x - lc.x,
        points[b].y - points[t].y,
        -angle(r).to_degrees(),
    );
    Some(rect.corners())
}
