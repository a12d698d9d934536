//! The unit entity of the simulation.

use crate::error::{CoreError, Result};
use crate::resonance::{self, PhaseFingerprint, ResonanceMetric, FINGERPRINT_DIM};
use holon_data::{AgentId, Lineage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A simulated agent: energy, phase, depth and structured lineage.
///
/// `population_index` is read-only from outside the crate. It changes only
/// when a [`PopulationStore`](crate::population::PopulationStore) adds,
/// removes or migrates the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    population_index: usize,
    energy: f64,
    pub phase: f64,
    pub lineage: Lineage,
    /// Optional learned weights; clusters keep the per-key maximum.
    #[serde(default)]
    pub pattern_memory: BTreeMap<String, f64>,
}

impl Agent {
    /// Creates an unplaced agent. Negative or NaN energy is floored to 0.
    pub fn new<I: Into<AgentId>>(id: I, energy: f64) -> Self {
        Self {
            id: id.into(),
            population_index: 0,
            energy: sanitize_energy(energy),
            phase: 0.0,
            lineage: Lineage::default(),
            pattern_memory: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    #[must_use]
    pub fn with_lineage(mut self, lineage: Lineage) -> Self {
        self.lineage = lineage;
        self
    }

    #[must_use]
    pub fn with_memory<K: Into<String>>(mut self, key: K, value: f64) -> Self {
        self.pattern_memory.insert(key.into(), value);
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn population_index(&self) -> usize {
        self.population_index
    }

    /// Alias for [`population_index`](Self::population_index).
    pub fn depth(&self) -> usize {
        self.population_index
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub(crate) fn set_population_index(&mut self, index: usize) {
        self.population_index = index;
    }

    pub(crate) fn set_energy(&mut self, energy: f64) {
        self.energy = sanitize_energy(energy);
    }

    /// `energy = min(energy + amount, cap)`.
    pub fn recharge_energy(&mut self, amount: f64, cap: f64) -> Result<()> {
        if cap.is_nan() || cap < 0.0 {
            return Err(CoreError::validation(format!(
                "recharge cap must be >= 0, got {cap}"
            )));
        }
        if amount.is_nan() || amount < 0.0 {
            return Err(CoreError::validation(format!(
                "recharge amount must be >= 0, got {amount}"
            )));
        }
        self.energy = (self.energy + amount).min(cap);
        Ok(())
    }

    /// Subtracts `amount`. Returns `false` once energy reaches zero or below,
    /// in which case energy is pinned to 0. Population membership is left
    /// untouched; removing the agent is the caller's job.
    pub fn consume_energy(&mut self, amount: f64) -> bool {
        self.energy -= amount;
        if self.energy <= 0.0 || self.energy.is_nan() {
            self.energy = 0.0;
            false
        } else {
            true
        }
    }

    pub fn fingerprint(&self) -> [f64; FINGERPRINT_DIM] {
        resonance::fingerprint(self.energy, self.population_index, self.phase)
    }

    /// Resonance with another agent under the canonical metric.
    ///
    /// Agents at different depths never resonate (returns 0).
    pub fn resonance(&self, other: &Agent) -> f64 {
        PhaseFingerprint.resonance(self, other)
    }

    /// Merges `other` into this agent's memory, keeping the larger value
    /// per key.
    pub fn absorb_memory(&mut self, other: &BTreeMap<String, f64>) {
        for (key, value) in other {
            self.pattern_memory
                .entry(key.clone())
                .and_modify(|v| *v = v.max(*value))
                .or_insert(*value);
        }
    }
}

fn sanitize_energy(energy: f64) -> f64 {
    if energy.is_nan() || energy < 0.0 {
        0.0
    } else {
        energy
    }
}
