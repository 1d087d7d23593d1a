use photon_targeting::core::pose_from_xyz_rpy;
use photon_targeting::estimator::{AprilTag, FieldDimensions, FieldLayoutError};
use photon_targeting::io::{ConfigError, PoseReport, PoseXyzRpy, TargetingConfig};
use photon_targeting::simulate::simulate_poses;
use photon_targeting::{AprilTagFieldLayout, PoseStrategy};
use std::f64::consts::PI;

fn write_layout(dir: &std::path::Path) {
    let tags = [(1, -0.8), (2, 0.0), (3, 0.8)]
        .into_iter()
        .map(|(id, y)| AprilTag {
            id,
            pose: pose_from_xyz_rpy(6.0, y, 0.9, 0.0, 0.0, PI),
        })
        .collect();
    let field = FieldDimensions {
        length: 16.54,
        width: 8.21,
    };
    AprilTagFieldLayout::new(tags, field)
        .expect("layout")
        .write_json(dir.join("field.json"))
        .expect("write layout");
}

#[test]
fn config_to_report_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_layout(dir.path());
    let report_path = dir.path().join("report.json");
    let config_path = dir.path().join("run.json");
    std::fs::write(
        &config_path,
        format!(
            r#"{{
                "layout_path": "field.json",
                "output_path": "{}",
                "estimator": {{
                    "strategy": "multi_tag_pnp_on_coprocessor",
                    "robot_to_camera": {{ "x": 0.25, "z": 0.4, "pitch": -0.15 }}
                }},
                "camera": {{ "width": 1280, "height": 720, "diag_fov_deg": 95.0, "seed": 9 }},
                "robot_poses": [
                    {{ "x": 1.0, "y": 0.3 }},
                    {{ "x": 1.5, "y": -0.2, "yaw": 0.1 }},
                    {{ "x": 2.0, "yaw": -0.1 }}
                ]
            }}"#,
            report_path.display()
        ),
    )
    .expect("write config");

    let cfg = TargetingConfig::load_json(&config_path).expect("config");
    assert_eq!(cfg.estimator.strategy, PoseStrategy::MultiTagPnpOnCoprocessor);
    assert_eq!(
        cfg.robot_poses[1],
        PoseXyzRpy {
            x: 1.5,
            y: -0.2,
            yaw: 0.1,
            ..Default::default()
        }
    );
    let layout = cfg.load_layout(dir.path()).expect("layout");
    assert_eq!(layout.tags().len(), 3);

    let report = simulate_poses(&cfg, layout, &config_path);
    assert_eq!(report.num_estimated(), 3);
    assert!(report.max_translation_error_m().expect("errors") < 0.02);
    for frame in &report.frames {
        assert_eq!(frame.fiducial_ids_used.len(), 3);
        assert_eq!(frame.strategy, Some(PoseStrategy::MultiTagPnpOnCoprocessor));
    }

    report.write_json(cfg.output_path()).expect("write report");
    let back = PoseReport::load_json(&report_path).expect("read report");
    assert_eq!(back, report);
}

#[test]
fn missing_layout_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg: TargetingConfig =
        serde_json::from_str(r#"{ "layout_path": "nope.json" }"#).expect("config");
    let err = cfg.load_layout(dir.path()).expect_err("no layout file");
    assert!(matches!(err, ConfigError::Layout(FieldLayoutError::Io(_))));
}
