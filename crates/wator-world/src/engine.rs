//! Parallel generation stepping.
//!
//! Rows are split into contiguous bands, one short-lived worker thread per
//! band. Workers only read the current buffer and only write through
//! [`Grid::mark_prey`] and [`Grid::claim`], so no lock is held while a
//! generation is computed. Each scoped join is a barrier: prey marks are
//! complete before any claim is made, and the swap follows the last join.

use crate::grid::{ClaimKey, ClaimTier, Grid};
use crate::rules::{EntityRules, Fate, Outcome, Thresholds};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::ops::Range;
use std::thread::{self, ScopedJoinHandle};
use tracing::{error, trace};
use wator_core::{effective_workers, Error, Population, Position, Result, WatorConfig};

/// Source of per-worker random streams.
///
/// A stream depends only on the generation and the band, never on thread
/// scheduling, which is what makes runs repeatable for a fixed worker count.
pub trait RngFactory: Sync {
    type Rng: Rng;

    fn stream(&self, generation: u64, band: usize) -> Self::Rng;
}

/// Default streams: one ChaCha8 stream per band, keyed off the global seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededStreams {
    seed: u64,
}

impl SeededStreams {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl RngFactory for SeededStreams {
    type Rng = ChaCha8Rng;

    fn stream(&self, generation: u64, band: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(
            self.seed ^ generation.wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );
        rng.set_stream(band as u64);
        rng
    }
}

/// A contiguous range of rows owned by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    pub index: usize,
    pub rows: Range<u32>,
}

/// Split `size` rows into `workers` near-equal bands; the last band takes
/// the remainder. `workers` is clamped into `1..=size`.
pub fn partition(size: u32, workers: usize) -> Vec<Band> {
    let workers = workers.clamp(1, size.max(1) as usize) as u32;
    let rows_per_band = size / workers;

    (0..workers)
        .map(|i| {
            let start = i * rows_per_band;
            let end = if i == workers - 1 { size } else { start + rows_per_band };
            Band {
                index: i as usize,
                rows: start..end,
            }
        })
        .collect()
}

/// Per-worker tallies, summed into [`StepStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BandStats {
    processed: usize,
    claims: usize,
    spawns: usize,
    starved: usize,
    eaten: usize,
}

/// What one generation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    /// Generation number after the swap
    pub generation: u64,
    pub population: Population,
    /// Entities evaluated by the rules
    pub processed: usize,
    /// Offspring requested at vacated cells
    pub spawns: usize,
    /// Offspring that won their cell
    pub births: usize,
    /// Sharks that ate and won the prey's cell
    pub predations: usize,
    pub starvations: usize,
    /// Claims that lost arbitration; their entities are gone
    pub conflict_losses: usize,
}

/// Computes generation transitions over a bounded set of workers
#[derive(Debug, Clone)]
pub struct StepEngine<F = SeededStreams> {
    rules: EntityRules,
    workers: usize,
    streams: F,
}

impl StepEngine<SeededStreams> {
    pub fn new(config: &WatorConfig) -> Result<Self> {
        Self::with_streams(config, SeededStreams::new(config.seed))
    }
}

impl<F: RngFactory> StepEngine<F> {
    pub fn with_streams(config: &WatorConfig, streams: F) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rules: EntityRules::new(Thresholds::from_config(config)),
            workers: config.effective_workers(),
            streams,
        })
    }

    pub fn rules(&self) -> &EntityRules {
        &self.rules
    }

    /// Worker count after clamping into `1..=grid_size`
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Advance `grid` by one generation.
    ///
    /// Runs in two phases separated by a join. Workers first decide every
    /// entity in their band and mark the fish that sharks are about to eat.
    /// They then commit the decisions as claims, skipping eaten fish.
    ///
    /// A failing worker aborts the whole step: pending claims are dropped
    /// and `grid` keeps its last completed generation.
    pub fn step(&self, grid: &mut Grid) -> Result<StepStats> {
        let generation = grid.generation();
        let bands = partition(grid.size(), effective_workers(self.workers as i32, grid.size()));

        let planned: Vec<Result<Vec<Outcome>>> = {
            let shared: &Grid = grid;
            thread::scope(|scope| {
                let handles: Vec<_> = bands
                    .iter()
                    .map(|band| scope.spawn(move || self.plan_band(shared, band, generation)))
                    .collect();
                join_all(handles, generation)
            })
        };

        let mut plans = Vec::with_capacity(planned.len());
        for result in planned {
            match result {
                Ok(plan) => plans.push(plan),
                Err(err) => return Err(abort(grid, err)),
            }
        }

        let committed: Vec<Result<BandStats>> = {
            let shared: &Grid = grid;
            thread::scope(|scope| {
                let handles: Vec<_> = bands
                    .iter()
                    .zip(&plans)
                    .map(|(band, plan)| scope.spawn(move || commit_band(shared, band, plan)))
                    .collect();
                join_all(handles, generation)
            })
        };

        let mut totals = BandStats::default();
        for result in committed {
            match result {
                Ok(stats) => {
                    totals.processed += stats.processed;
                    totals.claims += stats.claims;
                    totals.spawns += stats.spawns;
                    totals.starved += stats.starved;
                }
                Err(err) => return Err(abort(grid, err)),
            }
        }

        let promotion = grid.swap()?;

        Ok(StepStats {
            generation: grid.generation(),
            population: grid.census(),
            processed: totals.processed,
            spawns: totals.spawns,
            births: promotion.births,
            predations: promotion.predations,
            starvations: totals.starved,
            conflict_losses: totals.claims - promotion.occupied,
        })
    }

    fn plan_band(&self, grid: &Grid, band: &Band, generation: u64) -> Result<Vec<Outcome>> {
        let size = grid.size();
        let mut rng = self.streams.stream(generation, band.index);
        let mut plan = Vec::new();

        for y in band.rows.clone() {
            for x in 0..size {
                let source = Position::new(x, y);
                let Some(&entity) = grid.get(source) else {
                    continue;
                };

                let outcome = self.rules.decide(entity, source, &grid.neighbourhood(source), &mut rng);
                if outcome.predation && outcome.survivor().is_some() {
                    grid.mark_prey(outcome.destination, source.index(size));
                }
                plan.push(outcome);
            }
        }

        Ok(plan)
    }
}

fn commit_band(grid: &Grid, band: &Band, plan: &[Outcome]) -> Result<BandStats> {
    let size = grid.size();
    let mut stats = BandStats::default();

    for outcome in plan {
        let source_index = outcome.source.index(size);
        stats.processed += 1;

        // Only fish are ever hunted; an eaten fish neither moves nor breeds
        if grid.hunter(outcome.source).is_some() {
            stats.eaten += 1;
            continue;
        }

        match outcome.fate {
            Fate::Survives(survivor) => {
                let tier = if outcome.predation {
                    ClaimTier::Predation
                } else {
                    ClaimTier::Movement
                };
                grid.claim(outcome.destination, ClaimKey::new(tier, source_index), survivor)?;
                stats.claims += 1;
            }
            Fate::Starved => stats.starved += 1,
        }

        if let Some(offspring) = outcome.spawn {
            grid.claim(outcome.source, ClaimKey::new(ClaimTier::Spawn, source_index), offspring)?;
            stats.claims += 1;
            stats.spawns += 1;
        }
    }

    trace!(
        band = band.index,
        rows_start = band.rows.start,
        rows_end = band.rows.end,
        processed = stats.processed,
        claims = stats.claims,
        spawns = stats.spawns,
        starved = stats.starved,
        eaten = stats.eaten,
        "Band finished"
    );

    Ok(stats)
}

fn join_all<T>(handles: Vec<ScopedJoinHandle<'_, Result<T>>>, generation: u64) -> Vec<Result<T>> {
    handles
        .into_iter()
        .map(|handle| {
            handle.join().unwrap_or_else(|payload| {
                Err(Error::FatalStep {
                    generation: generation + 1,
                    reason: panic_reason(payload),
                })
            })
        })
        .collect()
}

fn abort(grid: &mut Grid, err: Error) -> Error {
    error!(generation = grid.generation() + 1, error = %err, "Worker failed, discarding generation");
    grid.discard_next();
    err
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", message)
    } else {
        "worker panicked".to_string()
    }
}
