//! Pebble
//!
//! Boots logging, loads the simulation config and either opens a window or
//! runs a fixed number of frames headless.

mod app;
mod args;
mod headless;

use std::path::Path;

use anyhow::{Context, Result};
use pebble_core::{SimConfig, Simulation};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, USAGE};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    tracing::info!("Pebble v{}", pebble_core::VERSION);
    let config = load_config(args.config.as_deref())?;

    if let Some(frames) = args.headless {
        headless::run(config, frames)?;
        return Ok(());
    }

    let sim = Simulation::new(config)?;
    let event_loop =
        pebble_render::window::create_event_loop().context("failed to create event loop")?;
    let mut app = app::App::new(sim);
    event_loop.run_app(&mut app).context("event loop failed")?;

    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        tracing::info!("using default configuration");
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = SimConfig::from_json_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::info!(path = %path.display(), particles = config.particle_count, "configuration loaded");
    Ok(config)
}
