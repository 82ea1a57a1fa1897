use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Pattern used to construct the trait vectors of the seed types.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitPattern {
    /// Each seed type consumes a single resource (type `i` gets resource `i mod num_resources`).
    SingleTrait,
    /// Each seed type consumes every resource with equal weight.
    AllResources,
    /// Each trait is active with probability one half, at least one per type.
    RandomSubset,
}

/// Resource influx, either one rate shared by all resources or one rate per resource.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InfluxRate {
    Uniform(f64),
    PerResource(Vec<f64>),
}

impl InfluxRate {
    /// Expand to one influx rate per resource.
    pub fn per_resource(&self, num_resources: usize) -> Vec<f64> {
        match self {
            InfluxRate::Uniform(rate) => vec![*rate; num_resources],
            InfluxRate::PerResource(rates) => rates.clone(),
        }
    }
}

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Total simulated time.
    pub t_final: f64,
    /// Sampling interval: one snapshot is emitted per `dt` of simulated time.
    pub dt: f64,

    /// Number of seed types.
    pub num_types: usize,
    /// Number of shared resources.
    pub num_resources: usize,

    /// Per-trait mutation rate.
    pub mutation_rate: f64,

    /// Resource influx rate(s).
    pub influx_rate: InfluxRate,
    /// Resource decay rate.
    pub decay_rate: f64,

    /// Metabolic cost paid by every type.
    pub cost_baseline: f64,
    /// Additional cost per active trait.
    #[serde(default)]
    pub cost_per_trait: f64,

    /// Total biomass saturates near this value.
    pub carrying_capacity: f64,

    /// Seed type trait pattern.
    pub trait_pattern: TraitPattern,

    /// Upper bound on the internal integration step; each sampling interval
    /// is subdivided into substeps no longer than this.
    #[serde(default = "default_max_step")]
    pub max_step: f64,

    /// Types whose abundance falls below this threshold are removed.
    #[serde(default = "default_extinction_threshold")]
    pub extinction_threshold: f64,

    /// Seed for the random number generator; drawn from OS entropy if absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_step() -> f64 {
    0.05
}

fn default_extinction_threshold() -> f64 {
    1e-4
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.t_final, 1e-9..1e12).context("invalid total simulated time")?;
        check_num(self.dt, 1e-9..=self.t_final).context("invalid sampling interval")?;

        check_num(self.num_types, 1..100_000).context("invalid number of seed types")?;
        check_num(self.num_resources, 1..10_000).context("invalid number of resources")?;

        check_num(self.mutation_rate, 0.0..f64::INFINITY).context("invalid mutation rate")?;

        match &self.influx_rate {
            InfluxRate::Uniform(rate) => {
                check_num(*rate, 0.0..f64::INFINITY).context("invalid influx rate")?;
            }
            InfluxRate::PerResource(rates) => {
                let len = rates.len();
                if len != self.num_resources {
                    bail!(
                        "influx rates length must be {}, but is {len}",
                        self.num_resources
                    );
                }
                for (i_res, &rate) in rates.iter().enumerate() {
                    check_num(rate, 0.0..f64::INFINITY)
                        .with_context(|| format!("invalid influx rate for resource {i_res}"))?;
                }
            }
        }

        check_num(self.decay_rate, 0.0..f64::INFINITY).context("invalid decay rate")?;
        check_num(self.cost_baseline, 0.0..f64::INFINITY).context("invalid baseline cost")?;
        check_num(self.cost_per_trait, 0.0..f64::INFINITY).context("invalid per-trait cost")?;
        check_num(self.carrying_capacity, 1e-9..f64::INFINITY)
            .context("invalid carrying capacity")?;

        check_num(self.max_step, 1e-12..f64::INFINITY).context("invalid maximum step size")?;
        check_num(self.extinction_threshold, 0.0..f64::INFINITY)
            .context("invalid extinction threshold")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
