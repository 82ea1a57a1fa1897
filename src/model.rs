//! Community data types.

use serde::{Deserialize, Serialize};

/// Identifier linking a mutant to its parent type.
pub type LineageId = u64;

/// A consumer type, immutable once created.
///
/// The trait vector has one weight per resource, indicating which resources
/// this type can consume and at what efficiency. The metabolic cost is
/// derived from the trait vector at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRecord {
    lineage_id: LineageId,
    parent_id: Option<LineageId>,
    traits: Vec<f64>,
    cost: f64,
}

impl TypeRecord {
    /// Create a new type with the given trait vector.
    pub fn new(
        lineage_id: LineageId,
        parent_id: Option<LineageId>,
        traits: Vec<f64>,
        cost_baseline: f64,
        cost_per_trait: f64,
    ) -> Self {
        let active = traits.iter().filter(|&&w| w > 0.0).count();
        let cost = cost_baseline + cost_per_trait * active as f64;
        Self {
            lineage_id,
            parent_id,
            traits,
            cost,
        }
    }

    /// Create an offspring type with one trait toggled.
    ///
    /// The parent's trait vector is left untouched; the offspring's cost is
    /// recomputed from its own trait vector.
    pub fn toggled(
        &self,
        lineage_id: LineageId,
        trait_idx: usize,
        cost_baseline: f64,
        cost_per_trait: f64,
    ) -> Self {
        let mut traits = self.traits.clone();
        traits[trait_idx] = if traits[trait_idx] > 0.0 { 0.0 } else { 1.0 };
        Self::new(
            lineage_id,
            Some(self.lineage_id),
            traits,
            cost_baseline,
            cost_per_trait,
        )
    }

    pub fn lineage_id(&self) -> LineageId {
        self.lineage_id
    }

    pub fn parent_id(&self) -> Option<LineageId> {
        self.parent_id
    }

    pub fn traits(&self) -> &[f64] {
        &self.traits
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }
}

/// A type together with its current abundance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub record: TypeRecord,
    pub abundance: f64,
}

/// The evolving aggregate of all live types and resource concentrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    /// Current simulated time, monotonically non-decreasing.
    pub time: f64,

    /// Live types with their abundances.
    pub members: Vec<Member>,

    /// Resource concentrations.
    pub resources: Vec<f64>,

    next_lineage: LineageId,
}

impl Community {
    pub fn new(members: Vec<Member>, resources: Vec<f64>) -> Self {
        let next_lineage = members
            .iter()
            .map(|m| m.record.lineage_id() + 1)
            .max()
            .unwrap_or(1);
        Self {
            time: 0.0,
            members,
            resources,
            next_lineage,
        }
    }

    /// Claim a fresh lineage identifier.
    ///
    /// Identifiers are never reused, so a pruned type can never reappear:
    /// a later mutant with the same trait vector is a distinct type.
    pub fn next_lineage_id(&mut self) -> LineageId {
        let id = self.next_lineage;
        self.next_lineage += 1;
        id
    }

    pub fn total_biomass(&self) -> f64 {
        self.members.iter().map(|m| m.abundance).sum()
    }

    /// Remove members whose abundance fell below the extinction threshold.
    ///
    /// Returns the number of pruned types.
    pub fn prune(&mut self, threshold: f64) -> usize {
        let before = self.members.len();
        self.members.retain(|m| m.abundance >= threshold);
        before - self.members.len()
    }

    /// Take an immutable record of the community at the current time.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time: self.time,
            total_biomass: self.total_biomass(),
            types: self
                .members
                .iter()
                .map(|m| TypeAbundance {
                    lineage_id: m.record.lineage_id(),
                    parent_id: m.record.parent_id(),
                    abundance: m.abundance,
                })
                .collect(),
            resources: self.resources.clone(),
        }
    }
}

/// Per-type detail carried by a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAbundance {
    pub lineage_id: LineageId,
    pub parent_id: Option<LineageId>,
    pub abundance: f64,
}

/// Immutable record of the community at one epoch boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: f64,
    pub total_biomass: f64,
    pub types: Vec<TypeAbundance>,
    pub resources: Vec<f64>,
}
