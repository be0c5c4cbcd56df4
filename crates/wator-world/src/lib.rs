//! Wa-Tor world engine.
//!
//! Fish and sharks on a toroidal grid, stepped one generation at a time by
//! a pool of banded workers that write into the next generation through
//! per-cell atomic claims.

pub mod grid;
pub mod neighbours;
pub mod rules;
pub mod engine;
pub mod snapshot;
pub mod simulation;
pub mod benchmark;

pub use grid::{Claim, ClaimKey, ClaimTier, Grid};
pub use neighbours::NeighbourResolver;
pub use rules::{EntityRules, Fate, Neighbourhood, Outcome, Thresholds};
pub use engine::{RngFactory, SeededStreams, StepEngine, StepStats};
pub use snapshot::{Snapshot, SnapshotReader};
pub use simulation::{Simulation, StepReport};
pub use benchmark::{run_benchmark, BenchmarkReport, BenchmarkRun};
