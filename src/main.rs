//! PrahariIO daemon entry point

use crossbeam_channel::unbounded;
use parking_lot::Mutex;
use prahari_io::attitude::AttitudeEstimator;
use prahari_io::config::AppConfig;
use prahari_io::control::ControlLoop;
use prahari_io::devices;
use prahari_io::dispatch::CommandDispatcher;
use prahari_io::state::SharedState;
use prahari_io::streaming::{CommandReceiver, TelemetryPublisher};
use prahari_io::Result;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

const DEFAULT_CONFIG_PATH: &str = "/etc/prahari.toml";

fn main() {
    if let Err(e) = run() {
        eprintln!("Fatal: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config_path = parse_config_path();
    let config = load_config(&config_path);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .init();
    log::info!(
        "PrahariIO {} starting (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    let device = devices::create_device(&config)?;
    let state = Arc::new(SharedState::new(config.robot.turn_inner_ratio));

    // Bias calibration before anything can move the robot
    let mut attitude = AttitudeEstimator::new(device.imu);
    attitude.calibrate(config.control.calibration_samples);

    let (cmd_tx, cmd_rx) = unbounded();
    let (feedback_tx, feedback_rx) = unbounded();
    let env = Arc::new(Mutex::new(device.env));

    let mut publisher = TelemetryPublisher::start(
        &config,
        Arc::clone(&state),
        Arc::clone(&env),
        device.battery,
        feedback_rx,
    )?;
    let mut receiver = CommandReceiver::start(&config, Arc::clone(&state), cmd_tx)?;

    let mut dispatcher = CommandDispatcher::new(
        &config,
        Arc::clone(&state),
        device.gpio,
        env,
        feedback_tx,
        cmd_rx,
    );
    let dispatcher_thread = thread::Builder::new()
        .name("dispatcher".to_string())
        .spawn(move || dispatcher.run())?;

    let mut control = ControlLoop::new(&config, Arc::clone(&state), device.motor, attitude);
    let control_thread = thread::Builder::new()
        .name("control".to_string())
        .spawn(move || control.run())?;

    // Block until SIGINT or SIGTERM
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        log::info!("Received signal {}, shutting down", signal);
    }
    state.shutdown();

    let _ = control_thread.join();
    let _ = dispatcher_thread.join();
    receiver.join();
    publisher.join();

    log::info!("PrahariIO stopped");
    Ok(())
}

/// Resolve the config path from `--config <path>` / `-c <path>`, falling
/// back to the system default
fn parse_config_path() -> PathBuf {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        } else if !arg.starts_with('-') {
            return PathBuf::from(arg);
        }
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load the config file, falling back to built-in defaults when missing
/// or invalid
fn load_config(path: &Path) -> AppConfig {
    match AppConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: could not load {} ({}), using default configuration",
                path.display(),
                e
            );
            AppConfig::default()
        }
    }
}
