//! The simulation facade.
//!
//! [`RealityInterface`] is the surface experiment drivers consume. It owns
//! the population store, the composition and decomposition operators and
//! the optional durable event log. After every operation that can change
//! membership it drains the store's journal, so caller adds and removes,
//! merges, splits, births and depletions all reach the log and the lineage
//! registry in the order they happened.

use crate::model::error::Result;
use chrono::Utc;
use holon_core::config::{CompositionConfig, DecompositionConfig, SimConfig};
use holon_core::lifecycle;
use holon_core::{
    Agent, AncestryTree, CompositionEngine, CompositionReport, DecompositionOperator,
    DecompositionReport, DepthSchedule, LineageRegistry, PopulationStore,
};
use holon_data::{AgentId, ChangeCause, CycleSnapshot, Origin, PopulationEvent};
use holon_io::{EventSink, JsonlEventLog};
use rand::Rng;
use std::path::PathBuf;
use uuid::Uuid;

pub struct RealityInterface {
    store: PopulationStore,
    composition: CompositionEngine,
    decomposition: DecompositionOperator,
    sink: Option<Box<dyn EventSink + Send>>,
    registry: LineageRegistry,
    mode_label: String,
    run_id: Uuid,
    cycle: u64,
}

impl std::fmt::Debug for RealityInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealityInterface")
            .field("sizes", &self.store.population_sizes())
            .field("mode_label", &self.mode_label)
            .field("run_id", &self.run_id)
            .field("cycle", &self.cycle)
            .field("persistent", &self.sink.is_some())
            .finish()
    }
}

fn default_composition() -> holon_core::Result<CompositionEngine> {
    let c = CompositionConfig::default();
    CompositionEngine::new(c.threshold, c.efficiency)?.with_probability(c.probability)
}

fn default_decomposition() -> holon_core::Result<DecompositionOperator> {
    let d = DecompositionConfig::default();
    DecompositionOperator::new(d.threshold, d.split_fraction)
}

impl RealityInterface {
    /// Creates a facade over `n_populations` depths.
    ///
    /// `n_populations == 0` fails with a validation error before anything
    /// else happens. With a `persistence_target` every membership change is
    /// appended to that JSONL file; without one the facade is memory-only.
    pub fn new(
        n_populations: usize,
        persistence_target: Option<PathBuf>,
        mode_label: impl Into<String>,
    ) -> Result<Self> {
        let store = PopulationStore::new(n_populations)?.with_journal();
        let sink: Option<Box<dyn EventSink + Send>> = match persistence_target {
            Some(path) => Some(Box::new(JsonlEventLog::new_at(path)?)),
            None => None,
        };
        Ok(Self {
            store,
            composition: default_composition()?,
            decomposition: default_decomposition()?,
            sink,
            registry: LineageRegistry::new(),
            mode_label: mode_label.into(),
            run_id: Uuid::new_v4(),
            cycle: 0,
        })
    }

    /// Builds a facade whose operators follow `config`. The config is
    /// assumed to be validated already.
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        let c = &config.composition;
        let d = &config.decomposition;
        let composition =
            CompositionEngine::new(c.threshold, c.efficiency)?.with_probability(c.probability)?;
        let decomposition = DecompositionOperator::new(d.threshold.clone(), d.split_fraction)?;
        Ok(Self::new(
            config.world.n_populations,
            config.world.persistence_target.clone(),
            config.world.mode_label.clone(),
        )?
        .with_composition(composition)
        .with_decomposition(decomposition))
    }

    /// Replaces the event destination. Any configured file log is dropped.
    pub fn with_sink(mut self, sink: Box<dyn EventSink + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_composition(mut self, engine: CompositionEngine) -> Self {
        self.composition = engine;
        self
    }

    pub fn with_decomposition(mut self, operator: DecompositionOperator) -> Self {
        self.decomposition = operator;
        self
    }

    pub fn n_populations(&self) -> usize {
        self.store.n_populations()
    }

    pub fn mode_label(&self) -> &str {
        &self.mode_label
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn is_persistent(&self) -> bool {
        self.sink.is_some()
    }

    /// Cycle number stamped on events and lineage records from now on.
    pub fn begin_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn composition(&self) -> &CompositionEngine {
        &self.composition
    }

    pub fn decomposition(&self) -> &DecompositionOperator {
        &self.decomposition
    }

    pub fn registry(&self) -> &LineageRegistry {
        &self.registry
    }

    pub fn ancestry_tree(&self) -> AncestryTree {
        AncestryTree::build(&self.registry)
    }

    // --- membership ---

    pub fn add_agent(&mut self, agent: Agent, pop_id: usize) -> Result<()> {
        self.add_agent_as(agent, pop_id, ChangeCause::Manual)
    }

    pub fn add_agent_as(&mut self, agent: Agent, pop_id: usize, cause: ChangeCause) -> Result<()> {
        let outcome = self.store.add_agent_as(agent, pop_id, cause);
        self.flush_journal()?;
        Ok(outcome?)
    }

    /// Removes an agent. Unknown ids are a silent no-op returning `None`.
    pub fn remove_agent(&mut self, agent_id: &AgentId, pop_id: usize) -> Result<Option<Agent>> {
        let removed = self.store.remove_agent(agent_id, pop_id);
        self.flush_journal()?;
        Ok(removed)
    }

    pub fn migrate_agent(&mut self, agent_id: &AgentId, from_pop: usize, to_pop: usize) -> Result<bool> {
        let outcome = self.store.migrate_agent(agent_id, from_pop, to_pop);
        self.flush_journal()?;
        Ok(outcome?)
    }

    /// Point-in-time copy of one population, ordered by id.
    pub fn get_population_agents(&self, pop_id: usize) -> Vec<Agent> {
        self.store.get_population_agents(pop_id)
    }

    pub fn agent(&self, agent_id: &AgentId) -> Option<&Agent> {
        self.store.agent(agent_id)
    }

    /// Mutable access for direct energy changes. Membership cannot change
    /// through this handle.
    pub fn agent_mut(&mut self, agent_id: &AgentId) -> Option<&mut Agent> {
        self.store.agent_mut(agent_id)
    }

    pub fn allocate_id(&mut self, origin: Origin) -> AgentId {
        self.store.allocate_id(origin)
    }

    pub fn population_size(&self, pop_id: usize) -> usize {
        self.store.population_size(pop_id)
    }

    pub fn population_sizes(&self) -> Vec<usize> {
        self.store.population_sizes()
    }

    pub fn total_agents(&self) -> usize {
        self.store.total_agents()
    }

    pub fn total_energy(&self) -> f64 {
        self.store.total_energy()
    }

    // --- operators ---

    pub fn compose<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<CompositionReport> {
        let outcome = self.composition.compose_all(&mut self.store, rng, self.cycle);
        self.flush_journal()?;
        Ok(outcome?)
    }

    pub fn compose_depth<R: Rng + ?Sized>(
        &mut self,
        depth: usize,
        rng: &mut R,
    ) -> Result<CompositionReport> {
        let outcome = self
            .composition
            .compose_depth(&mut self.store, depth, rng, self.cycle);
        self.flush_journal()?;
        Ok(outcome?)
    }

    /// Merges the named agents at `depth` regardless of resonance.
    pub fn merge(&mut self, constituents: &[AgentId], depth: usize) -> Result<AgentId> {
        let outcome = self
            .composition
            .merge(&mut self.store, constituents, depth, self.cycle);
        self.flush_journal()?;
        Ok(outcome?)
    }

    pub fn decompose(&mut self) -> Result<DecompositionReport> {
        let outcome = self.decomposition.decompose_all(&mut self.store, self.cycle);
        self.flush_journal()?;
        Ok(outcome?)
    }

    pub fn decompose_depth(&mut self, depth: usize) -> Result<DecompositionReport> {
        let outcome = self
            .decomposition
            .decompose_depth(&mut self.store, depth, self.cycle);
        self.flush_journal()?;
        Ok(outcome?)
    }

    /// Splits one agent regardless of the threshold.
    pub fn split(&mut self, agent_id: &AgentId) -> Result<Vec<AgentId>> {
        let outcome = self.decomposition.split(&mut self.store, agent_id, self.cycle);
        self.flush_journal()?;
        Ok(outcome?)
    }

    pub fn recharge_all(&mut self, amount: &DepthSchedule, cap: f64) -> Result<()> {
        lifecycle::recharge_all(&mut self.store, amount, cap)?;
        Ok(())
    }

    pub fn decay_all(&mut self, amount: &DepthSchedule) -> Result<Vec<AgentId>> {
        let depleted = lifecycle::decay_all(&mut self.store, amount);
        self.flush_journal()?;
        Ok(depleted)
    }

    pub fn spawn_offspring(&mut self, parent_id: &AgentId, fraction: f64) -> Result<AgentId> {
        let outcome = lifecycle::spawn_offspring(&mut self.store, parent_id, fraction, self.cycle);
        self.flush_journal()?;
        Ok(outcome?)
    }

    /// Current sizes and energy. Per-cycle counters are left at zero for
    /// the cycle runner to fill in.
    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            cycle: self.cycle,
            sizes: self.store.population_sizes(),
            total_energy: self.store.total_energy(),
            ..Default::default()
        }
    }

    /// Forwards pending journal entries to the lineage registry and the
    /// event sink. The journal is emptied even if the sink fails.
    fn flush_journal(&mut self) -> Result<()> {
        let changes = self.store.drain_journal();
        for change in &changes {
            self.registry.apply(change, self.cycle);
        }
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        let timestamp = Utc::now().to_rfc3339();
        for change in changes {
            let event = PopulationEvent {
                event_type: change.event_type,
                agent_id: change.agent.id().clone(),
                population_index: change.population_index,
                energy: change.agent.energy(),
                cycle: self.cycle,
                cause: change.cause,
                mode_label: self.mode_label.clone(),
                run_id: self.run_id,
                timestamp: timestamp.clone(),
            };
            if let Err(e) = sink.record(&event) {
                tracing::warn!(error = %e, agent = %event.agent_id, "Event log write failed");
                return Err(e.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holon_data::EventType;
    use holon_io::MemorySink;

    #[test]
    fn test_zero_populations_fails_fast() {
        let err = RealityInterface::new(0, None, "test").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_events_carry_cycle_and_label() {
        let sink = MemorySink::new();
        let mut reality = RealityInterface::new(2, None, "probe")
            .unwrap()
            .with_sink(Box::new(sink.clone()));
        reality.begin_cycle(7);
        reality.add_agent(Agent::new("a", 1.0), 0).unwrap();
        reality.remove_agent(&"a".into(), 0).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Add);
        assert_eq!(events[1].event_type, EventType::Remove);
        assert!(events.iter().all(|e| e.cycle == 7 && e.mode_label == "probe"));
        assert!(events.iter().all(|e| e.run_id == reality.run_id()));
    }

    #[test]
    fn test_failed_add_writes_nothing() {
        let sink = MemorySink::new();
        let mut reality = RealityInterface::new(2, None, "")
            .unwrap()
            .with_sink(Box::new(sink.clone()));
        assert!(reality.add_agent(Agent::new("a", 1.0), 5).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_merge_reaches_registry() {
        let mut reality = RealityInterface::new(2, None, "").unwrap();
        reality.add_agent(Agent::new("a", 1.0), 0).unwrap();
        reality.add_agent(Agent::new("b", 1.0), 0).unwrap();
        let cluster = reality.merge(&["a".into(), "b".into()], 0).unwrap();
        let record = reality.registry().get(&"a".into()).unwrap();
        assert_eq!(record.absorbed_into.as_ref(), Some(&cluster));
        assert_eq!(reality.ancestry_tree().ancestors(&cluster).len(), 2);
    }
}
