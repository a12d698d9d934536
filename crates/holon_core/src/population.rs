//! Named populations, one per depth level.
//!
//! Reads hand out owned snapshots, never live views: callers routinely
//! add and remove agents while walking a list obtained earlier in the same
//! step. Populations are keyed by id in a `BTreeMap` so snapshot order is a
//! pure function of the ids present, which keeps seeded shuffles
//! reproducible across processes.

use crate::agent::Agent;
use crate::error::{CoreError, Result};
use holon_data::{AgentId, ChangeCause, EventType, Origin};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One add/remove recorded by the store's journal.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipChange {
    pub event_type: EventType,
    pub cause: ChangeCause,
    pub population_index: usize,
    /// State of the agent at the moment of the change.
    pub agent: Agent,
}

/// Agents partitioned into `n` depth-indexed populations.
#[derive(Debug, Clone)]
pub struct PopulationStore {
    populations: Vec<BTreeMap<AgentId, Agent>>,
    locations: HashMap<AgentId, usize>,
    retired: HashSet<AgentId>,
    next_seq: u64,
    journal: Option<Vec<MembershipChange>>,
}

impl PopulationStore {
    /// Creates a store with `n_populations` empty depths.
    pub fn new(n_populations: usize) -> Result<Self> {
        if n_populations == 0 {
            return Err(CoreError::validation("n_populations must be > 0"));
        }
        Ok(Self {
            populations: vec![BTreeMap::new(); n_populations],
            locations: HashMap::new(),
            retired: HashSet::new(),
            next_seq: 0,
            journal: None,
        })
    }

    /// Starts recording membership changes for [`drain_journal`](Self::drain_journal).
    #[must_use]
    pub fn with_journal(mut self) -> Self {
        self.journal = Some(Vec::new());
        self
    }

    pub fn n_populations(&self) -> usize {
        self.populations.len()
    }

    fn check_index(&self, pop_id: usize) -> Result<()> {
        if pop_id >= self.populations.len() {
            return Err(CoreError::validation(format!(
                "pop_id {} outside [0, {})",
                pop_id,
                self.populations.len()
            )));
        }
        Ok(())
    }

    fn record(&mut self, event_type: EventType, cause: ChangeCause, pop_id: usize, agent: &Agent) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(MembershipChange {
                event_type,
                cause,
                population_index: pop_id,
                agent: agent.clone(),
            });
        }
    }

    pub fn add_agent(&mut self, agent: Agent, pop_id: usize) -> Result<()> {
        self.add_agent_as(agent, pop_id, ChangeCause::Manual)
    }

    /// Adds `agent` to `pop_id`, tagging the journal entry with `cause`.
    ///
    /// Fails if the index is out of range, the id is already live anywhere
    /// in the store, or the id belonged to an agent that was destroyed.
    pub fn add_agent_as(&mut self, mut agent: Agent, pop_id: usize, cause: ChangeCause) -> Result<()> {
        self.check_index(pop_id)?;
        if let Some(existing) = self.locations.get(agent.id()) {
            return Err(CoreError::validation(format!(
                "agent {} already present in population {}",
                agent.id(),
                existing
            )));
        }
        if self.retired.contains(agent.id()) {
            return Err(CoreError::validation(format!(
                "agent id {} was destroyed and cannot be reused",
                agent.id()
            )));
        }
        agent.set_population_index(pop_id);
        self.record(EventType::Add, cause, pop_id, &agent);
        self.locations.insert(agent.id().clone(), pop_id);
        self.populations[pop_id].insert(agent.id().clone(), agent);
        Ok(())
    }

    /// Removes and returns the agent. Unknown id or index is a no-op.
    pub fn remove_agent(&mut self, agent_id: &AgentId, pop_id: usize) -> Option<Agent> {
        self.remove_agent_as(agent_id, pop_id, ChangeCause::Manual)
    }

    pub fn remove_agent_as(
        &mut self,
        agent_id: &AgentId,
        pop_id: usize,
        cause: ChangeCause,
    ) -> Option<Agent> {
        let agent = self.populations.get_mut(pop_id)?.remove(agent_id)?;
        self.locations.remove(agent_id);
        self.retired.insert(agent_id.clone());
        self.record(EventType::Remove, cause, pop_id, &agent);
        Some(agent)
    }

    /// Moves an agent between populations.
    ///
    /// Returns `Ok(false)` when the agent is not in `from_pop`. Both indices
    /// are validated, and the move is refused if `to_pop` already holds the
    /// id; nothing is mutated on error.
    pub fn migrate_agent(&mut self, agent_id: &AgentId, from_pop: usize, to_pop: usize) -> Result<bool> {
        self.check_index(from_pop)?;
        self.check_index(to_pop)?;
        if self.populations[to_pop].contains_key(agent_id) {
            return Err(CoreError::validation(format!(
                "population {} already holds agent {}",
                to_pop, agent_id
            )));
        }
        let Some(mut agent) = self.populations[from_pop].remove(agent_id) else {
            return Ok(false);
        };
        self.record(EventType::Remove, ChangeCause::Migrated, from_pop, &agent);
        agent.set_population_index(to_pop);
        self.record(EventType::Add, ChangeCause::Migrated, to_pop, &agent);
        self.locations.insert(agent_id.clone(), to_pop);
        self.populations[to_pop].insert(agent_id.clone(), agent);
        Ok(true)
    }

    /// Owned snapshot of one population, ordered by id. Out-of-range
    /// indices yield an empty snapshot.
    pub fn get_population_agents(&self, pop_id: usize) -> Vec<Agent> {
        self.populations
            .get(pop_id)
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Owned snapshot of the ids in one population, ordered by id.
    pub fn population_ids(&self, pop_id: usize) -> Vec<AgentId> {
        self.populations
            .get(pop_id)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn agent(&self, agent_id: &AgentId) -> Option<&Agent> {
        let pop = *self.locations.get(agent_id)?;
        self.populations[pop].get(agent_id)
    }

    /// Mutable access for energy and phase updates. Depth cannot change
    /// through this handle.
    pub fn agent_mut(&mut self, agent_id: &AgentId) -> Option<&mut Agent> {
        let pop = *self.locations.get(agent_id)?;
        self.populations[pop].get_mut(agent_id)
    }

    pub(crate) fn population_mut(&mut self, pop_id: usize) -> impl Iterator<Item = &mut Agent> {
        self.populations
            .get_mut(pop_id)
            .into_iter()
            .flat_map(|p| p.values_mut())
    }

    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.locations.contains_key(agent_id)
    }

    pub fn location(&self, agent_id: &AgentId) -> Option<usize> {
        self.locations.get(agent_id).copied()
    }

    pub fn is_retired(&self, agent_id: &AgentId) -> bool {
        self.retired.contains(agent_id)
    }

    pub fn population_size(&self, pop_id: usize) -> usize {
        self.populations.get(pop_id).map_or(0, BTreeMap::len)
    }

    pub fn population_sizes(&self) -> Vec<usize> {
        self.populations.iter().map(BTreeMap::len).collect()
    }

    pub fn total_agents(&self) -> usize {
        self.locations.len()
    }

    pub fn total_energy(&self) -> f64 {
        self.populations
            .iter()
            .flat_map(|p| p.values())
            .map(Agent::energy)
            .sum()
    }

    /// Next engine-generated id for an agent of the given origin.
    ///
    /// Ids come from a monotonic counter and skip anything live or retired,
    /// so caller-chosen ids never collide with engine ones.
    pub fn allocate_id(&mut self, origin: Origin) -> AgentId {
        loop {
            self.next_seq += 1;
            let id = AgentId::new(format!("{}{:06}", origin.id_prefix(), self.next_seq));
            if !self.locations.contains_key(&id) && !self.retired.contains(&id) {
                return id;
            }
        }
    }

    /// Takes all journal entries recorded since the last drain.
    pub fn drain_journal(&mut self) -> Vec<MembershipChange> {
        self.journal
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }
}
