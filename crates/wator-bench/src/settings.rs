//! Benchmark settings file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use wator_core::{BenchmarkConfig, Result, WatorConfig};

/// `{ "world": {...}, "benchmark": {...} }`; any omitted field keeps its default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub world: WatorConfig,
    pub benchmark: BenchmarkConfig,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::parse(&std::fs::read_to_string(path)?),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.world.validate()?;
        Ok(settings)
    }
}
