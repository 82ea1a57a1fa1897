//! Consumer-side accumulation of streamed snapshots.

use crate::config::Config;
use crate::model::Snapshot;
use crate::stats::{Accumulator, TimeSeries};
use anyhow::Result;

pub trait Obs {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

pub struct TotalBiomass {
    time_series: TimeSeries,
}

impl TotalBiomass {
    pub fn new() -> Self {
        Self {
            time_series: TimeSeries::new(),
        }
    }
}

impl Obs for TotalBiomass {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.time_series.push(snapshot.total_biomass);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let report = self.time_series.report();
        serde_json::json!({ "total_biomass": report })
    }
}

pub struct TypeRichness {
    time_series: TimeSeries,
}

impl TypeRichness {
    pub fn new() -> Self {
        Self {
            time_series: TimeSeries::new(),
        }
    }
}

impl Obs for TypeRichness {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.time_series.push(snapshot.types.len() as f64);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let report = self.time_series.report();
        serde_json::json!({ "type_richness": report })
    }
}

pub struct ResourceLevels {
    acc_vec: Vec<Accumulator>,
}

impl ResourceLevels {
    pub fn new(cfg: &Config) -> Self {
        let mut acc_vec = Vec::new();
        acc_vec.resize_with(cfg.num_resources, Accumulator::new);
        Self { acc_vec }
    }
}

impl Obs for ResourceLevels {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        for (acc, &concentration) in self.acc_vec.iter_mut().zip(&snapshot.resources) {
            acc.add(concentration);
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let reports: Vec<_> = self.acc_vec.iter().map(|acc| acc.report()).collect();
        serde_json::json!({ "resource_levels": reports })
    }
}

/// Feeds every streamed snapshot to a set of observables and collects
/// their reports once the run has finished.
pub struct Analyzer {
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: &Config) -> Self {
        let mut obs_ptr_vec: Vec<Box<dyn Obs>> = Vec::new();
        obs_ptr_vec.push(Box::new(TotalBiomass::new()));
        obs_ptr_vec.push(Box::new(TypeRichness::new()));
        obs_ptr_vec.push(Box::new(ResourceLevels::new(cfg)));
        Self { obs_ptr_vec }
    }

    pub fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        for obs in &mut self.obs_ptr_vec {
            obs.update(snapshot)?;
        }
        Ok(())
    }

    pub fn report(&self) -> serde_json::Value {
        let reports: Vec<_> = self.obs_ptr_vec.iter().map(|obs| obs.report()).collect();
        serde_json::Value::Array(reports)
    }
}
