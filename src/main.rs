//! fieldlink - console Driver Station daemon
//!
//! Runs the protocol kernel without a GUI: netconsole output and station
//! advisories go to the log, and a status line is printed periodically.

use fieldlink::{Config, DriverStation, Topic};
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> fieldlink::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("fieldlink v0.3.0 starting...");

    // Get config path from args or default
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "fieldlink.toml".to_string());

    let config = if Path::new(&config_path).exists() {
        log::info!("Using config: {}", config_path);
        Config::load(&config_path)?
    } else {
        log::warn!("Config {} not found, using defaults", config_path);
        Config::default()
    };

    let ds = DriverStation::new(config);
    log::info!(
        "Station ready: team {}, {} protocol",
        ds.team_number(),
        ds.era()
    );

    // Robot console output and station advisories go straight to the log
    ds.subscribe(Topic::Message, |event| {
        if let fieldlink::Event::Message(text) = event {
            log::info!("[robot] {}", text);
        }
    });

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| {
        fieldlink::Error::Config(format!("Error setting Ctrl-C handler: {}", e))
    })?;

    log::info!("fieldlink running. Press Ctrl-C to stop.");

    // Main loop - print a status line every 10 seconds
    let mut last_status = Instant::now();

    while running.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(100));

        if last_status.elapsed().as_secs() >= 10 {
            log::info!(
                "Status: {} | FMS {} | radio {} | robot {} ({:.2} V)",
                ds.status(),
                if ds.fms_connected() { "up" } else { "down" },
                if ds.radio_connected() { "up" } else { "down" },
                if ds.robot_connected() { "up" } else { "down" },
                ds.robot_voltage()
            );
            last_status = Instant::now();
        }
    }

    log::info!("fieldlink stopped");
    Ok(())
}
