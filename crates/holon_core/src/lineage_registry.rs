//! Registry of every agent that has ever existed in a run.
//!
//! Agents are destroyed when they compose or decompose, so their lineage
//! links alone cannot reconstruct cluster ancestry after the fact. The
//! registry keeps one record per id for the lifetime of the run.

use crate::agent::Agent;
use crate::population::MembershipChange;
use holon_data::{AgentId, ChangeCause, EventType, Origin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Birth-to-death summary of one agent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LineageRecord {
    pub id: AgentId,
    pub origin: Origin,
    pub parent_id: Option<AgentId>,
    /// Constituents, for clusters.
    pub constituents: Vec<AgentId>,
    pub birth_depth: usize,
    pub birth_cycle: u64,
    pub birth_energy: f64,
    pub offspring_count: usize,
    pub absorbed_into: Option<AgentId>,
    pub death_cycle: Option<u64>,
    pub death_cause: Option<ChangeCause>,
}

impl LineageRecord {
    pub fn is_alive(&self) -> bool {
        self.death_cycle.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LineageRegistry {
    pub records: BTreeMap<AgentId, LineageRecord>,
}

impl LineageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_birth(&mut self, agent: &Agent, cycle: u64) {
        let lineage = &agent.lineage;
        if let Some(parent) = lineage.parent_id.as_ref() {
            if let Some(record) = self.records.get_mut(parent) {
                record.offspring_count += 1;
            }
        }
        if lineage.origin == Origin::Composed {
            for constituent in &lineage.children {
                if let Some(record) = self.records.get_mut(constituent) {
                    record.absorbed_into = Some(agent.id().clone());
                }
            }
        }
        self.records.insert(
            agent.id().clone(),
            LineageRecord {
                id: agent.id().clone(),
                origin: lineage.origin,
                parent_id: lineage.parent_id.clone(),
                constituents: if lineage.origin == Origin::Composed {
                    lineage.children.clone()
                } else {
                    Vec::new()
                },
                birth_depth: agent.population_index(),
                birth_cycle: cycle,
                birth_energy: agent.energy(),
                offspring_count: 0,
                absorbed_into: None,
                death_cycle: None,
                death_cause: None,
            },
        );
    }

    pub fn record_death(&mut self, id: &AgentId, cause: ChangeCause, cycle: u64) {
        if let Some(record) = self.records.get_mut(id) {
            record.death_cycle = Some(cycle);
            record.death_cause = Some(cause);
        }
    }

    /// Applies one store journal entry. Migrations do not create or end a
    /// life and are ignored.
    pub fn apply(&mut self, change: &MembershipChange, cycle: u64) {
        if change.cause == ChangeCause::Migrated {
            return;
        }
        match change.event_type {
            EventType::Add => self.record_birth(&change.agent, cycle),
            EventType::Remove => self.record_death(change.agent.id(), change.cause, cycle),
        }
    }

    pub fn get(&self, id: &AgentId) -> Option<&LineageRecord> {
        self.records.get(id)
    }

    pub fn living_count(&self) -> usize {
        self.records.values().filter(|r| r.is_alive()).count()
    }

    pub fn dead_ids(&self) -> Vec<AgentId> {
        self.records
            .values()
            .filter(|r| !r.is_alive())
            .map(|r| r.id.clone())
            .collect()
    }

    /// Records with the most constituents, largest first.
    pub fn largest_clusters(&self, count: usize) -> Vec<&LineageRecord> {
        let mut list: Vec<_> = self
            .records
            .values()
            .filter(|r| r.origin == Origin::Composed)
            .collect();
        list.sort_by(|a, b| {
            b.birth_depth
                .cmp(&a.birth_depth)
                .then_with(|| b.birth_energy.total_cmp(&a.birth_energy))
        });
        list.into_iter().take(count).collect()
    }
}
