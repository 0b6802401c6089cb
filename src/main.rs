// src/main.rs
//! GNSS Tracker - forwards fixes from a serial GNSS receiver to Traccar

use anyhow::Context;
use clap::Parser;
use gnss_tracker::{transport, TrackerConfig, TrackerMonitor};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gnss-tracker")]
#[command(version, about = "Forward fixes from a serial GNSS receiver to a Traccar server")]
struct Args {
    /// Configuration file (defaults to ~/.config/gnss-tracker/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the receiver, overrides the configuration
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate, overrides the configuration
    #[arg(short, long)]
    baud: Option<u32>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Write the effective configuration back to the file and exit
    #[arg(long)]
    write_config: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if args.list_ports {
        transport::list_serial_ports()?;
        return Ok(());
    }

    let config_path = match args.config {
        Some(path) => path,
        None => TrackerConfig::get_config_path()?,
    };
    let mut config = TrackerConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match (args.port, args.baud) {
        (Some(port), baud) => config.update_serial(port, baud),
        (None, Some(baud)) => config.gnss.baud = baud,
        (None, None) => {}
    }

    if args.write_config {
        config
            .save_to(&config_path)
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("Configuration written to {}", config_path.display());
        return Ok(());
    }

    log::info!("Starting GNSS tracker...");
    log::info!("  Client id: {}", config.traccar.client_id);
    log::info!(
        "  Forwarding: osmand={} t55={} opengts={}",
        config.traccar.osmand.enabled,
        config.traccar.t55.enabled,
        config.traccar.opengts.enabled
    );

    let monitor = TrackerMonitor::new(config);
    tokio::select! {
        result = monitor.start() => {
            let published = result.context("GNSS tracker stopped")?;
            log::info!("Published {} fix(es)", published);
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutting down GNSS tracker...");
        }
    }

    Ok(())
}
