//! Wall-clock benchmark over worker counts.

use crate::simulation::Simulation;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use wator_core::{BenchmarkConfig, Population, Result, WatorConfig};

/// One measured worker count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    /// Worker count as requested
    pub requested_workers: i32,
    /// Worker count after clamping
    pub workers: usize,
    pub steps: u64,
    pub duration: Duration,
    /// First run's duration divided by this run's
    pub speedup: f64,
    pub final_population: Population,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub grid_size: i32,
    pub seed: u64,
    pub runs: Vec<BenchmarkRun>,
}

impl BenchmarkReport {
    pub fn fastest(&self) -> Option<&BenchmarkRun> {
        self.runs.iter().min_by_key(|run| run.duration)
    }
}

/// Run `bench.steps` generations for every worker count in
/// `bench.worker_counts`, each from a freshly seeded board.
#[instrument(skip_all, fields(grid_size = world.grid_size, steps = bench.steps))]
pub fn run_benchmark(world: &WatorConfig, bench: &BenchmarkConfig) -> Result<BenchmarkReport> {
    let mut report = BenchmarkReport {
        grid_size: world.grid_size,
        seed: world.seed,
        runs: Vec::with_capacity(bench.worker_counts.len()),
    };
    let mut baseline: Option<Duration> = None;

    for &requested in &bench.worker_counts {
        let config = WatorConfig {
            worker_count: requested,
            ..world.clone()
        };
        let mut simulation = Simulation::new(config)?;

        let started = Instant::now();
        simulation.run(bench.steps)?;
        let duration = started.elapsed();

        let baseline = *baseline.get_or_insert(duration);
        let speedup = if duration.is_zero() {
            1.0
        } else {
            baseline.as_secs_f64() / duration.as_secs_f64()
        };

        let run = BenchmarkRun {
            requested_workers: requested,
            workers: simulation.worker_count(),
            steps: bench.steps,
            duration,
            speedup,
            final_population: simulation.population(),
        };

        info!(
            event = "benchmark_run",
            workers = run.workers,
            steps = run.steps,
            duration_ms = run.duration.as_millis() as u64,
            speedup = format!("{:.2}", run.speedup),
            fish = run.final_population.fish,
            sharks = run.final_population.sharks,
            "Benchmark configuration finished"
        );

        report.runs.push(run);
    }

    Ok(report)
}
