//! Decomposition: splitting a saturated agent into two lower-depth offspring.

use crate::agent::Agent;
use crate::error::{CoreError, Result};
use crate::population::PopulationStore;
use crate::schedule::DepthSchedule;
use holon_data::{AgentId, ChangeCause, Lineage, Origin};

/// Offspring produced by one split.
pub const OFFSPRING_PER_SPLIT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecompositionReport {
    /// Agents that split, in processing order.
    pub split: Vec<AgentId>,
    pub offspring: Vec<AgentId>,
}

impl DecompositionReport {
    pub fn decomposed(&self) -> usize {
        self.split.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionOperator {
    threshold: DepthSchedule,
    split_fraction: f64,
}

impl DecompositionOperator {
    pub fn new(threshold: DepthSchedule, split_fraction: f64) -> Result<Self> {
        if !(split_fraction.is_finite() && split_fraction > 0.0 && split_fraction <= 1.0) {
            return Err(CoreError::validation(format!(
                "split_fraction must be in (0, 1], got {split_fraction}"
            )));
        }
        Ok(Self {
            threshold,
            split_fraction,
        })
    }

    pub fn threshold_at(&self, depth: usize) -> f64 {
        self.threshold.value_at(depth)
    }

    pub fn split_fraction(&self) -> f64 {
        self.split_fraction
    }

    /// Splits one agent at depth `d >= 1` into two agents at `d - 1`, each
    /// carrying `energy * split_fraction`. Ignores the threshold.
    pub fn split(
        &self,
        store: &mut PopulationStore,
        agent_id: &AgentId,
        cycle: u64,
    ) -> Result<Vec<AgentId>> {
        let depth = store
            .location(agent_id)
            .ok_or_else(|| CoreError::not_found(agent_id.to_string()))?;
        if depth == 0 {
            return Err(CoreError::validation(format!(
                "agent {agent_id} is at depth 0 and cannot decompose"
            )));
        }
        let parent = store
            .remove_agent_as(agent_id, depth, ChangeCause::Split)
            .ok_or_else(|| CoreError::not_found(agent_id.to_string()))?;
        let child_energy = parent.energy() * self.split_fraction;

        let mut offspring = Vec::with_capacity(OFFSPRING_PER_SPLIT);
        for _ in 0..OFFSPRING_PER_SPLIT {
            let id = store.allocate_id(Origin::Decomposed);
            let mut child = Agent::new(id.clone(), child_energy)
                .with_phase(parent.phase)
                .with_lineage(Lineage::offspring(
                    parent.id().clone(),
                    Origin::Decomposed,
                    cycle,
                    depth - 1,
                ));
            child.pattern_memory = parent.pattern_memory.clone();
            store.add_agent_as(child, depth - 1, ChangeCause::Decomposed)?;
            offspring.push(id);
        }

        tracing::debug!(
            parent = %agent_id,
            depth,
            child_energy,
            "Decomposed agent"
        );
        Ok(offspring)
    }

    /// Splits every agent at `depth` whose energy exceeds the threshold for
    /// that depth. Depth 0 has nothing below it and is skipped.
    pub fn decompose_depth(
        &self,
        store: &mut PopulationStore,
        depth: usize,
        cycle: u64,
    ) -> Result<DecompositionReport> {
        let mut report = DecompositionReport::default();
        if depth == 0 || depth >= store.n_populations() {
            return Ok(report);
        }
        let threshold = self.threshold_at(depth);
        for agent in store.get_population_agents(depth) {
            if agent.energy() > threshold {
                let offspring = self.split(store, agent.id(), cycle)?;
                report.split.push(agent.id().clone());
                report.offspring.extend(offspring);
            }
        }
        Ok(report)
    }

    /// Runs [`decompose_depth`](Self::decompose_depth) from depth 1 upward.
    /// Offspring land on a depth that has already been processed, so no
    /// agent splits twice in one pass.
    pub fn decompose_all(&self, store: &mut PopulationStore, cycle: u64) -> Result<DecompositionReport> {
        let mut report = DecompositionReport::default();
        for depth in 1..store.n_populations() {
            let r = self.decompose_depth(store, depth, cycle)?;
            report.split.extend(r.split);
            report.offspring.extend(r.offspring);
        }
        Ok(report)
    }
}
