use crate::config::{Config, TraitPattern};
use crate::error::SimError;
use crate::model::{Community, Member, Snapshot, TypeRecord};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Poisson, weighted::WeightedIndex};
use serde::{Deserialize, Serialize};

/// Abundance split from a parent to seed a mutant offspring.
const MUTANT_SEED_ABUNDANCE: f64 = 1.0;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    Cancelled,
}

/// Final status of a run that ended without error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub final_time: f64,
    pub epochs_run: usize,
    pub reason: StopReason,
}

/// Simulation engine.
///
/// Holds the configuration, community state, and random number generator,
/// and advances the community epoch by epoch: integrate the consumer-resource
/// equations over one sampling interval, draw mutation events, prune extinct
/// types, and hand one snapshot to the observer.
pub struct Engine {
    cfg: Config,
    community: Community,
    influx: Vec<f64>,
    rng: ChaCha12Rng,
    epochs_run: usize,
}

impl Engine {
    /// Validate the configuration and build the initial community.
    pub fn new(cfg: Config) -> Result<Self, SimError> {
        cfg.validate()
            .map_err(|error| SimError::Config(format!("{error:#}")))?;

        let mut rng = match cfg.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()
                .map_err(|error| SimError::Config(format!("failed to seed rng: {error}")))?,
        };

        let members = seed_members(&cfg, &mut rng)?;
        let resources = vec![1.0; cfg.num_resources];
        let influx = cfg.influx_rate.per_resource(cfg.num_resources);

        Ok(Self {
            cfg,
            community: Community::new(members, resources),
            influx,
            rng,
            epochs_run: 0,
        })
    }

    pub fn time(&self) -> f64 {
        self.community.time
    }

    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    /// Run the simulation to the time horizon.
    ///
    /// `on_epoch` observes one snapshot per sampling interval; it never
    /// alters the simulation results. `cancelled` is checked once per epoch
    /// boundary; when it returns true the run stops with
    /// [`StopReason::Cancelled`] before computing further epochs.
    pub fn run<F, C>(&mut self, mut on_epoch: F, cancelled: C) -> Result<RunReport, SimError>
    where
        F: FnMut(&Snapshot),
        C: Fn() -> bool,
    {
        while self.community.time + 1e-9 < self.cfg.t_final {
            let span = (self.cfg.t_final - self.community.time).min(self.cfg.dt);

            self.integrate_epoch(span)?;
            self.sample_mutations(span)?;

            let pruned = self.community.prune(self.cfg.extinction_threshold);
            if pruned > 0 {
                log::debug!(
                    "pruned {pruned} extinct types at t = {}",
                    self.community.time
                );
            }

            self.epochs_run += 1;
            let snapshot = self.community.snapshot();
            on_epoch(&snapshot);

            if cancelled() {
                log::info!("cancellation observed at t = {}", self.community.time);
                return Ok(RunReport {
                    final_time: self.community.time,
                    epochs_run: self.epochs_run,
                    reason: StopReason::Cancelled,
                });
            }
        }

        Ok(RunReport {
            final_time: self.community.time,
            epochs_run: self.epochs_run,
            reason: StopReason::Completed,
        })
    }

    /// Advance the community by one sampling interval using forward Euler
    /// substeps no longer than `max_step`.
    fn integrate_epoch(&mut self, span: f64) -> Result<(), SimError> {
        let target = self.community.time + span;
        let n_sub = (span / self.cfg.max_step).ceil().max(1.0) as usize;
        let h = span / n_sub as f64;

        let num_resources = self.cfg.num_resources;
        let mut d_resources = vec![0.0; num_resources];

        for _ in 0..n_sub {
            let community = &mut self.community;
            let biomass: f64 = community.members.iter().map(|m| m.abundance).sum();
            let damp = 1.0 - biomass / self.cfg.carrying_capacity;

            // Mass-action uptake: consumption of resource r by type i is
            // abundance_i * traits_i[r] * R_r.
            for (i_res, d_res) in d_resources.iter_mut().enumerate() {
                let uptake: f64 = community
                    .members
                    .iter()
                    .map(|m| m.abundance * m.record.traits()[i_res])
                    .sum();
                let concentration = community.resources[i_res];
                *d_res = self.influx[i_res]
                    - self.cfg.decay_rate * concentration
                    - uptake * concentration;
            }

            for member in &mut community.members {
                let growth: f64 = member
                    .record
                    .traits()
                    .iter()
                    .zip(&community.resources)
                    .map(|(weight, concentration)| weight * concentration)
                    .sum();
                let rate = damp * growth - member.record.cost();
                member.abundance += h * rate * member.abundance;
                // Zero is an absorbing boundary.
                member.abundance = member.abundance.max(0.0);
            }

            for (concentration, d_res) in community.resources.iter_mut().zip(&d_resources) {
                *concentration += h * d_res;
                *concentration = concentration.max(0.0);
            }

            self.check_finite()?;
        }

        self.community.time = target;
        Ok(())
    }

    /// Draw mutation events for one sampling interval.
    ///
    /// The event count is Poisson with mean proportional to total biomass,
    /// mutation rate, trait count, and the interval length. Each event toggles
    /// one trait of a parent picked proportionally to abundance and splits a
    /// unit of abundance from the parent to seed the offspring.
    fn sample_mutations(&mut self, span: f64) -> Result<(), SimError> {
        if self.cfg.mutation_rate <= 0.0 || self.community.members.is_empty() {
            return Ok(());
        }

        let biomass = self.community.total_biomass();
        let mean_events =
            biomass * self.cfg.mutation_rate * self.cfg.num_resources as f64 * span;
        if mean_events <= 0.0 {
            return Ok(());
        }

        let event_dist = Poisson::new(mean_events).map_err(|error| SimError::Numeric {
            time: self.community.time,
            reason: format!("invalid mutation event mean {mean_events}: {error}"),
        })?;
        let n_events = event_dist.sample(&mut self.rng) as u64;

        for _ in 0..n_events {
            let weights: Vec<f64> = self.community.members.iter().map(|m| m.abundance).collect();
            let Ok(parent_dist) = WeightedIndex::new(&weights) else {
                // All parents extinct or weightless.
                break;
            };
            let i_parent = parent_dist.sample(&mut self.rng);

            if self.community.members[i_parent].abundance < 2.0 * MUTANT_SEED_ABUNDANCE {
                continue;
            }

            let trait_idx = self.rng.random_range(0..self.cfg.num_resources);
            let lineage_id = self.community.next_lineage_id();

            let parent = &mut self.community.members[i_parent];
            let record = parent.record.toggled(
                lineage_id,
                trait_idx,
                self.cfg.cost_baseline,
                self.cfg.cost_per_trait,
            );
            parent.abundance -= MUTANT_SEED_ABUNDANCE;

            log::debug!(
                "mutation at t = {}: lineage {} -> {lineage_id} (trait {trait_idx})",
                self.community.time,
                record.parent_id().unwrap_or_default(),
            );

            self.community.members.push(Member {
                record,
                abundance: MUTANT_SEED_ABUNDANCE,
            });
        }

        Ok(())
    }

    fn check_finite(&self) -> Result<(), SimError> {
        let time = self.community.time;
        for member in &self.community.members {
            if !member.abundance.is_finite() {
                return Err(SimError::Numeric {
                    time,
                    reason: format!(
                        "abundance of lineage {} is not finite",
                        member.record.lineage_id()
                    ),
                });
            }
        }
        for (i_res, concentration) in self.community.resources.iter().enumerate() {
            if !concentration.is_finite() {
                return Err(SimError::Numeric {
                    time,
                    reason: format!("concentration of resource {i_res} is not finite"),
                });
            }
        }
        Ok(())
    }
}

/// Build the seed types according to the configured trait pattern.
fn seed_members(cfg: &Config, rng: &mut ChaCha12Rng) -> Result<Vec<Member>, SimError> {
    let mut members = Vec::with_capacity(cfg.num_types);

    for i_type in 0..cfg.num_types {
        let traits = match cfg.trait_pattern {
            TraitPattern::SingleTrait => {
                let mut traits = vec![0.0; cfg.num_resources];
                traits[i_type % cfg.num_resources] = 1.0;
                traits
            }
            TraitPattern::AllResources => {
                vec![1.0 / cfg.num_resources as f64; cfg.num_resources]
            }
            TraitPattern::RandomSubset => {
                let active_dist = Bernoulli::new(0.5).map_err(|error| {
                    SimError::Config(format!("failed to build trait distribution: {error}"))
                })?;
                let mut traits: Vec<f64> = (0..cfg.num_resources)
                    .map(|_| if active_dist.sample(rng) { 1.0 } else { 0.0 })
                    .collect();
                if traits.iter().all(|&w| w == 0.0) {
                    traits[rng.random_range(0..cfg.num_resources)] = 1.0;
                }
                traits
            }
        };

        let lineage_id = (i_type + 1) as u64;
        members.push(Member {
            record: TypeRecord::new(
                lineage_id,
                None,
                traits,
                cfg.cost_baseline,
                cfg.cost_per_trait,
            ),
            abundance: 1.0,
        });
    }

    Ok(members)
}
