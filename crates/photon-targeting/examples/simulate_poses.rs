use photon_targeting::io::TargetingConfig;
use photon_targeting::simulate::simulate_poses;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    photon_targeting::core::init_tracing(false);
    #[cfg(not(feature = "tracing"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(config_path) = std::env::args().nth(1) else {
        eprintln!("Usage: simulate_poses <config.json>");
        return Ok(());
    };
    let config_path = Path::new(&config_path);

    let cfg = TargetingConfig::load_json(config_path)?;
    let base_dir = config_path.parent().unwrap_or(Path::new("."));
    let layout = cfg.load_layout(base_dir)?;

    let report = simulate_poses(&cfg, layout, config_path);
    let out = cfg.output_path();
    report.write_json(&out)?;
    println!(
        "estimated {}/{} frames, worst error {:.4} m -> {}",
        report.num_estimated(),
        report.frames.len(),
        report.max_translation_error_m().unwrap_or(f64::NAN),
        out.display()
    );
    Ok(())
}
