//! DrishtiMCL - Monte Carlo Localization demo daemon
//!
//! Loads a configuration and an occupancy map, drives a simulated robot
//! through the map and localizes it from its range scans and odometry.
//!
//! # Usage
//!
//! ```bash
//! # With default config (drishti-mcl.toml, then /etc/drishti-mcl.toml)
//! cargo run --release
//!
//! # With custom config file
//! cargo run --release -- --config drishti-mcl.toml --steps 500
//!
//! # Without a map file
//! cargo run --release -- --synthetic-map
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use drishti_mcl::core::random::derive_seed;
use drishti_mcl::harness::{SimulatedRobot, demo_map};
use drishti_mcl::{EngineConfig, EngineError, GridMap, HypothesisSet, LocalizationEngine, Pose};

/// Simulation clock step (seconds).
const SIM_STEP: f64 = 0.05;

/// Robot travel per simulation step (native units).
const ROBOT_SPEED: f64 = 40.0;

/// Turn applied when the robot is blocked (degrees).
const BLOCKED_TURN: f64 = 67.0;

/// Seed stream of the simulated robot, relative to the filter seed.
const ROBOT_SEED_STREAM: u64 = 2;

// ============================================================================
// Command line
// ============================================================================

struct Args {
    config_path: Option<PathBuf>,
    steps: usize,
    synthetic_map: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args {
        config_path: None,
        steps: 300,
        synthetic_map: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--steps" | "-n" => {
                if let Some(steps) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    result.steps = steps;
                    i += 1;
                } else {
                    eprintln!("--steps needs a non-negative integer");
                    std::process::exit(1);
                }
            }
            "--synthetic-map" => result.synthetic_map = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("drishti-mcl - Monte Carlo Localization on a known occupancy map");
    println!();
    println!("USAGE:");
    println!("    drishti-mcl [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: drishti-mcl.toml)");
    println!("    -n, --steps <N>         Simulation steps to run (default: 300)");
    println!("        --synthetic-map     Use the built-in test room instead of [map] file");
    println!("    -h, --help              Print help information");
    println!();
    println!("CONFIGURATION:");
    println!("    All settings are configured via the TOML config file:");
    println!("    - [filter] num_particles, update_frequency, seed");
    println!("    - [sensor] type (sonar|laser), max_range, num_ranges, num_samples");
    println!("    - [map] file, pixels_per_unit, occupancy_threshold");
    println!("    - [sensor_model], [motion_model], [clustering]: model constants");
}

fn load_config(args: &Args) -> EngineConfig {
    match &args.config_path {
        Some(path) => match EngineConfig::load(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("Failed to load config {}: {}", path.display(), e);
                EngineConfig::default()
            }
        },
        None => {
            // Try default paths
            for path in ["drishti-mcl.toml", "/etc/drishti-mcl.toml"] {
                let path = Path::new(path);
                if !path.exists() {
                    continue;
                }
                match EngineConfig::load(path) {
                    Ok(cfg) => {
                        log::info!("Loaded config from {}", path.display());
                        return cfg;
                    }
                    Err(e) => log::warn!("Failed to load config {}: {}", path.display(), e),
                }
            }
            log::info!("Using default configuration");
            EngineConfig::default()
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// First free cell centre, scanning outwards from the middle row.
fn start_pose(map: &GridMap) -> Option<Pose> {
    let (width, height) = (map.width() as i64, map.height() as i64);
    let mid = height / 2;
    (0..height)
        .map(|k| if k % 2 == 0 { mid + k / 2 } else { mid - (k + 1) / 2 })
        .filter(|j| (0..height).contains(j))
        .flat_map(|j| (width / 4..width).map(move |i| (i, j)))
        .find(|&(i, j)| !map.is_occupied(i, j))
        .map(|(i, j)| {
            let cell = map.cell_size();
            Pose::new(i as f64 * cell, j as f64 * cell, 0.0)
        })
}

fn log_hypotheses(step: usize, truth: &Pose, set: &HypothesisSet) {
    let Some(best) = set.best() else {
        log::info!("step {:4}: no hypotheses", step);
        return;
    };
    let error = (best.mean.x - truth.x).hypot(best.mean.y - truth.y);
    log::info!(
        "step {:4}: {} hypotheses, best ({:.0}, {:.0}, {:.0}°) w={:.2}, truth ({:.0}, {:.0}, {:.0}°), error {:.0}",
        step,
        set.len(),
        best.mean.x,
        best.mean.y,
        best.mean.heading,
        best.weight,
        truth.x,
        truth.y,
        truth.heading,
        error
    );
}

fn run(args: &Args, config: EngineConfig) -> drishti_mcl::Result<()> {
    let map = if args.synthetic_map {
        log::info!("Using synthetic test room");
        demo_map(config.sensor.max_range)?
    } else {
        GridMap::load(
            &config.map.file,
            config.map.pixels_per_unit,
            config.map.occupancy_threshold,
            config.sensor.max_range,
        )?
    };

    let Some(start) = start_pose(&map) else {
        log::error!("Map has no free cell to start from");
        return Ok(());
    };

    let seed = config.filter.seed;
    let mut engine = LocalizationEngine::with_map(config, map)?;
    let mut robot = SimulatedRobot::new(
        start,
        engine.sensor().clone(),
        derive_seed(seed, ROBOT_SEED_STREAM),
    )
    .with_range_noise(20.0)
    .with_odometry_noise(0.02);
    log::info!("Robot starts at ({:.0}, {:.0})", start.x, start.y);

    for step in 0..args.steps {
        robot.wander(engine.map(), ROBOT_SPEED, BLOCKED_TURN);
        if !engine.is_due(step as f64 * SIM_STEP) {
            continue;
        }

        let scan = robot.scan(engine.map());
        match engine.tick(&scan, &robot.odometry()) {
            Ok(set) => log_hypotheses(step, &robot.pose(), &set),
            Err(EngineError::Filter(e)) => {
                log::warn!("step {:4}: {}; resetting", step, e);
                engine.reset();
            }
            Err(e) => return Err(e),
        }
    }

    let state = engine.filter().state();
    log::info!(
        "Finished {} steps: {} generations, neff {:.1}",
        args.steps,
        state.generations,
        state.neff
    );
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = parse_args();
    let config = load_config(&args);

    log::info!("drishti-mcl starting");
    log::info!("  Particles: {}", config.filter.num_particles);
    log::info!(
        "  Sensor: {} x{} (max range {})",
        config.range_sensor().kind(),
        config.range_sensor().num_ranges(),
        config.sensor.max_range
    );
    if !args.synthetic_map {
        log::info!("  Map: {}", config.map.file.display());
    }

    if let Err(e) = run(&args, config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
