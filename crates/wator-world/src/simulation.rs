//! Simulation driver: owns the grid and steps it one generation at a time.

use crate::engine::{RngFactory, SeededStreams, StepEngine, StepStats};
use crate::grid::Grid;
use crate::snapshot::{Snapshot, SnapshotReader};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, event, info, instrument, warn, Level};
use wator_core::{Error, Population, Result, WatorConfig};

/// Generations between population metric events
const METRICS_INTERVAL: u64 = 100;

/// Statistics for one completed generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    #[serde(flatten)]
    pub stats: StepStats,
    pub duration: Duration,
}

pub struct Simulation<F = SeededStreams> {
    config: WatorConfig,
    grid: Grid,
    engine: StepEngine<F>,
    reader: SnapshotReader,
    last_report: Option<StepReport>,
}

impl Simulation<SeededStreams> {
    /// Validate `config` and seed the initial board from `config.seed`
    pub fn new(config: WatorConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = Grid::seeded(&config, &mut rng)?;
        let streams = SeededStreams::new(config.seed);
        Self::with_grid(config, grid, streams)
    }
}

impl<F: RngFactory> Simulation<F> {
    /// Start from an explicit board and stream source
    pub fn with_grid(config: WatorConfig, grid: Grid, streams: F) -> Result<Self> {
        let engine = StepEngine::with_streams(&config, streams)?;
        if grid.size() != config.side() {
            return Err(Error::configuration(format!(
                "grid side {} does not match configured grid_size {}",
                grid.size(),
                config.grid_size
            )));
        }

        info!(
            grid_size = config.grid_size,
            workers = engine.worker_count(),
            seed = config.seed,
            fish = config.initial_fish,
            sharks = config.initial_sharks,
            "Simulation initialized"
        );

        let reader = SnapshotReader::new(Arc::new(Snapshot::capture(&grid)));
        Ok(Self {
            config,
            grid,
            engine,
            reader,
            last_report: None,
        })
    }

    /// Advance one generation and return a view of the result.
    ///
    /// On a fatal step error the board stays at its last completed generation.
    pub fn step(&mut self) -> Result<Arc<Snapshot>> {
        let started = Instant::now();
        let stats = match self.engine.step(&mut self.grid) {
            Ok(stats) => stats,
            Err(err) => {
                warn!(
                    generation = self.grid.generation(),
                    error = %err,
                    "Step aborted, keeping last completed generation"
                );
                return Err(err);
            }
        };
        let report = StepReport {
            stats,
            duration: started.elapsed(),
        };

        debug!(
            generation = stats.generation,
            fish = stats.population.fish,
            sharks = stats.population.sharks,
            births = stats.births,
            predations = stats.predations,
            starvations = stats.starvations,
            conflict_losses = stats.conflict_losses,
            duration_us = report.duration.as_micros() as u64,
            "Generation complete"
        );

        if stats.generation % METRICS_INTERVAL == 0 {
            self.emit_population_metrics(&stats);
        }

        self.last_report = Some(report);
        let snapshot = Arc::new(Snapshot::capture(&self.grid));
        self.reader.publish(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Run `generations` steps and return the final view
    #[instrument(skip(self), fields(workers = self.engine.worker_count()))]
    pub fn run(&mut self, generations: u64) -> Result<Arc<Snapshot>> {
        for _ in 0..generations {
            self.step()?;
        }
        Ok(self.snapshot())
    }

    fn emit_population_metrics(&self, stats: &StepStats) {
        event!(
            Level::INFO,
            gauge_name = "population_fish",
            gauge_value = stats.population.fish,
            generation = stats.generation,
            "Fish population gauge"
        );

        event!(
            Level::INFO,
            gauge_name = "population_sharks",
            gauge_value = stats.population.sharks,
            generation = stats.generation,
            "Shark population gauge"
        );

        if stats.population.is_extinct() {
            info!(generation = stats.generation, "Population extinct");
        }
    }

    /// Latest completed generation; never the in-progress next buffer
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.reader.latest()
    }

    /// Handle other threads can poll for the latest completed generation
    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    /// Reset to a previously captured generation
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.size != self.config.side() {
            return Err(Error::configuration(format!(
                "snapshot side {} does not match configured grid_size {}",
                snapshot.size, self.config.grid_size
            )));
        }

        self.grid = snapshot.to_grid()?;
        self.last_report = None;
        self.reader.publish(Arc::new(snapshot.clone()));
        info!(generation = snapshot.generation, "Restored snapshot");
        Ok(())
    }

    pub fn generation(&self) -> u64 {
        self.grid.generation()
    }

    pub fn population(&self) -> Population {
        self.grid.census()
    }

    pub fn last_report(&self) -> Option<&StepReport> {
        self.last_report.as_ref()
    }

    pub fn config(&self) -> &WatorConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn worker_count(&self) -> usize {
        self.engine.worker_count()
    }
}
