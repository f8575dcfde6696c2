//! Orientation publisher - host daemon
//!
//! Wires the `DeviceSensor` component to a simulated sensor service and a
//! logging messaging client, then publishes one accel event per second until
//! Ctrl-C (or the configured duration) ends the run.
//!
//! Usage:
//! - `orientation-publisher` (built-in defaults)
//! - `orientation-publisher <path>` / `--config <path>` / `-c <path>`

mod config;
mod sim;

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use config::SystemConfig;
use log::info;
use orientation_telemetry::{AppContext, DeviceSensor, LogNotifier, LogPublisher};
use sim::SimulatedSensorService;

const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// Config path from `--config <path>`, `-c <path>` or the first positional
/// argument
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match parse_config_path() {
        Some(path) => SystemConfig::from_file(&path)?,
        None => SystemConfig::default(),
    }
    .with_env_overrides()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let connection_type = config.connection_type()?;
    info!("=== Orientation Publisher ===");
    info!(
        "Connection: {:?}, heading rate: {} deg/s",
        connection_type, config.simulation.heading_rate_dps
    );

    let context = Arc::new(AppContext::new(connection_type));
    context.set_current_location(config.location.location());
    context.set_current_screen(config.ui.screen.as_deref());

    let sensors = Arc::new(SimulatedSensorService::new(config.simulation.clone()));
    let device = DeviceSensor::new(
        Arc::clone(&context),
        sensors.clone(),
        Arc::new(LogPublisher),
        Arc::new(LogNotifier),
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })?;

    device.enable()?;
    info!(
        "Publishing with {} sensor subscription(s). Press Ctrl-C to stop.",
        sensors.subscription_count()
    );

    let started = Instant::now();
    let deadline = config.simulation.duration_secs.map(Duration::from_secs);
    let mut last_stats = Instant::now();

    while running.load(Ordering::Relaxed) {
        if deadline.is_some_and(|d| started.elapsed() >= d) {
            info!("Configured duration reached");
            break;
        }
        if last_stats.elapsed() >= STATS_INTERVAL {
            let (sent, failed) = device.stats();
            let orientation = device.orientation();
            info!(
                "Sent {} / failed {} | azimuth {:.1}° pitch {:.1}° roll {:.1}°",
                sent,
                failed,
                orientation.azimuth().to_degrees(),
                orientation.pitch().to_degrees(),
                orientation.roll().to_degrees()
            );
            last_stats = Instant::now();
        }
        thread::sleep(Duration::from_millis(100));
    }

    device.disable();
    let (sent, failed) = device.stats();
    info!("Stopped after {} sent / {} failed publishes", sent, failed);
    Ok(())
}
