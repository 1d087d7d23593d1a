use criterion::{black_box, criterion_group, criterion_main, Criterion};
use photon_targeting_core::{pose_from_xyz_rpy, Pose3, TargetCorner};
use photon_targeting_pnp::{
    project_points, solve_pnp_multi, solve_pnp_square, CameraCalibration, TargetModel,
};

fn bench_square(c: &mut Criterion) {
    let cam = CameraCalibration::new(900.0, 900.0, 639.5, 399.5);
    let model = TargetModel::apriltag_36h11();
    let tag = pose_from_xyz_rpy(3.0, 0.4, 0.3, 0.0, 0.15, std::f64::consts::PI - 0.3);
    let image: Vec<TargetCorner> =
        project_points(&cam, &Pose3::identity(), &model.field_vertices(&tag))
            .into_iter()
            .map(TargetCorner::from)
            .collect();

    c.bench_function("solve_pnp_square", |b| {
        b.iter(|| solve_pnp_square(black_box(&cam), black_box(&model.vertices), black_box(&image)))
    });
}

fn bench_multi(c: &mut Criterion) {
    let cam = CameraCalibration::new(900.0, 900.0, 639.5, 399.5);
    let model = TargetModel::apriltag_36h11();
    let mut field = Vec::new();
    for k in 0..4 {
        let tag = pose_from_xyz_rpy(6.0, -1.5 + k as f64, 1.0, 0.0, 0.0, std::f64::consts::PI);
        field.extend(model.field_vertices(&tag));
    }
    let camera_pose = pose_from_xyz_rpy(1.0, 0.0, 0.5, 0.0, -0.05, 0.0);
    let image: Vec<TargetCorner> = project_points(&cam, &camera_pose, &field)
        .into_iter()
        .map(TargetCorner::from)
        .collect();

    c.bench_function("solve_pnp_multi_4_tags", |b| {
        b.iter(|| solve_pnp_multi(black_box(&cam), black_box(&field), black_box(&image)))
    });
}

criterion_group!(benches, bench_square, bench_multi);
criterion_main!(benches);
