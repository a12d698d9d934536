//! Energy bookkeeping passes and reproduction.

use crate::agent::Agent;
use crate::error::{CoreError, Result};
use crate::population::PopulationStore;
use crate::schedule::DepthSchedule;
use holon_data::{AgentId, ChangeCause, Lineage, Origin};

/// Recharges every agent by the schedule's amount for its depth, capped.
pub fn recharge_all(store: &mut PopulationStore, amount: &DepthSchedule, cap: f64) -> Result<()> {
    if cap.is_nan() || cap < 0.0 {
        return Err(CoreError::validation(format!(
            "recharge cap must be >= 0, got {cap}"
        )));
    }
    for depth in 0..store.n_populations() {
        let value = amount.value_at(depth);
        for agent in store.population_mut(depth) {
            agent.recharge_energy(value, cap)?;
        }
    }
    Ok(())
}

/// Charges every agent the schedule's decay for its depth and removes the
/// ones that run dry. Returns the ids removed.
pub fn decay_all(store: &mut PopulationStore, amount: &DepthSchedule) -> Vec<AgentId> {
    let mut depleted = Vec::new();
    for depth in 0..store.n_populations() {
        let cost = amount.value_at(depth);
        for id in store.population_ids(depth) {
            let alive = store
                .agent_mut(&id)
                .map_or(true, |agent| agent.consume_energy(cost));
            if !alive {
                store.remove_agent_as(&id, depth, ChangeCause::Depleted);
                depleted.push(id);
            }
        }
    }
    depleted
}

/// Splits off a same-depth offspring carrying `fraction` of the parent's
/// energy; the parent keeps the rest.
pub fn spawn_offspring(
    store: &mut PopulationStore,
    parent_id: &AgentId,
    fraction: f64,
    cycle: u64,
) -> Result<AgentId> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(CoreError::validation(format!(
            "offspring fraction must be in (0, 1), got {fraction}"
        )));
    }
    if !store.contains(parent_id) {
        return Err(CoreError::not_found(parent_id.to_string()));
    }
    let child_id = store.allocate_id(Origin::Reproduced);
    let parent = store
        .agent_mut(parent_id)
        .ok_or_else(|| CoreError::not_found(parent_id.to_string()))?;
    let depth = parent.population_index();
    let child_energy = parent.energy() * fraction;
    let remaining = parent.energy() - child_energy;
    parent.set_energy(remaining);
    parent.lineage.children.push(child_id.clone());
    let mut child = Agent::new(child_id.clone(), child_energy)
        .with_phase(parent.phase)
        .with_lineage(Lineage::offspring(
            parent_id.clone(),
            Origin::Reproduced,
            cycle,
            depth,
        ));
    child.pattern_memory = parent.pattern_memory.clone();
    store.add_agent_as(child, depth, ChangeCause::Reproduced)?;
    Ok(child_id)
}
