//! Configuration types for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest supported board side. Keeps every row-major index below 2^30.
pub const MAX_GRID_SIZE: i32 = 1 << 15;

/// Largest supported breed/starve threshold. Counters are stored in 15 bits.
pub const MAX_THRESHOLD: i32 = (1 << 15) - 1;

/// World configuration parameters, supplied once at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatorConfig {
    /// Side length of the square toroidal grid
    pub grid_size: i32,
    /// Fish placed at random on the initial grid
    pub initial_fish: usize,
    /// Sharks placed at random on the initial grid
    pub initial_sharks: usize,
    /// Generations a fish must live before it breeds
    pub fish_breed_threshold: i32,
    /// Generations a shark must live before it breeds
    pub shark_breed_threshold: i32,
    /// Generations a shark survives without eating
    pub shark_starve_threshold: i32,
    /// Parallel workers per generation. Values <= 0 fall back to 1,
    /// values above `grid_size` are clamped to `grid_size`.
    pub worker_count: i32,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for WatorConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            initial_fish: 200,
            initial_sharks: 50,
            fish_breed_threshold: 5,
            shark_breed_threshold: 8,
            shark_starve_threshold: 5,
            worker_count: 1,
            seed: 0,
        }
    }
}

impl WatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_size <= 0 {
            return Err(Error::configuration(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(Error::configuration(format!(
                "grid_size {} exceeds the supported maximum of {}",
                self.grid_size, MAX_GRID_SIZE
            )));
        }

        let cells = self.cell_count();
        let population = self.initial_fish.saturating_add(self.initial_sharks);
        if population > cells {
            return Err(Error::configuration(format!(
                "{} fish and {} sharks do not fit on a {}x{} grid ({} cells)",
                self.initial_fish, self.initial_sharks, self.grid_size, self.grid_size, cells
            )));
        }

        for (name, value) in [
            ("fish_breed_threshold", self.fish_breed_threshold),
            ("shark_breed_threshold", self.shark_breed_threshold),
            ("shark_starve_threshold", self.shark_starve_threshold),
        ] {
            if value < 0 {
                return Err(Error::configuration(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
            if value > MAX_THRESHOLD {
                return Err(Error::configuration(format!(
                    "{} {} exceeds the supported maximum of {}",
                    name, value, MAX_THRESHOLD
                )));
            }
        }

        Ok(())
    }

    /// Board side as an unsigned length. Only meaningful after `validate`.
    pub fn side(&self) -> u32 {
        self.grid_size.max(0) as u32
    }

    pub fn cell_count(&self) -> usize {
        let side = self.side() as usize;
        side * side
    }

    /// Worker count after clamping into `1..=grid_size`
    pub fn effective_workers(&self) -> usize {
        effective_workers(self.worker_count, self.side())
    }
}

/// Clamp a requested worker count so that every worker owns at least one row
pub fn effective_workers(requested: i32, side: u32) -> usize {
    let upper = side.max(1) as usize;
    if requested <= 0 {
        1
    } else {
        (requested as usize).min(upper)
    }
}

/// Benchmark harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Worker counts to measure, in order. The first one is the speedup baseline.
    pub worker_counts: Vec<i32>,
    /// Generations to run per worker count
    pub steps: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            worker_counts: vec![1, 2, 4, 8],
            steps: 100,
        }
    }
}
