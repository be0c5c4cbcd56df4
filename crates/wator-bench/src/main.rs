//! Benchmark runner: steps a seeded board under each configured worker count
//! and prints the timing report as JSON.

mod settings;
mod telemetry;

use anyhow::{Context, Result};
use settings::Settings;
use std::path::PathBuf;
use tracing::info;
use wator_world::run_benchmark;

fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("loading settings from {}", path.display()),
        None => "loading default settings".to_string(),
    })?;

    info!(
        grid_size = settings.world.grid_size,
        fish = settings.world.initial_fish,
        sharks = settings.world.initial_sharks,
        seed = settings.world.seed,
        worker_counts = ?settings.benchmark.worker_counts,
        steps = settings.benchmark.steps,
        "Starting Wa-Tor benchmark"
    );

    let report = run_benchmark(&settings.world, &settings.benchmark)?;

    if let Some(fastest) = report.fastest() {
        info!(
            workers = fastest.workers,
            duration_ms = fastest.duration.as_millis() as u64,
            speedup = format!("{:.2}", fastest.speedup),
            "Fastest configuration"
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
