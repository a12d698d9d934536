//! Composition: merging resonant agents into a higher-depth cluster.
//!
//! The pairwise walk shuffles a depth's snapshot with the caller's RNG and
//! steps through it two agents at a time. A pair that resonates at or above
//! the threshold merges and the walk jumps past both; a pair that does not
//! leaves both in place and the walk advances by one, so the second agent
//! is re-tested against its next neighbour.

use crate::agent::Agent;
use crate::error::{CoreError, Result};
use crate::population::PopulationStore;
use crate::resonance::{PhaseFingerprint, ResonanceMetric};
use holon_data::{AgentId, ChangeCause, Lineage, Origin};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of a composition pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositionReport {
    pub pairs_evaluated: usize,
    /// Ids of the clusters created, in creation order.
    pub clusters: Vec<AgentId>,
}

impl CompositionReport {
    pub fn composed(&self) -> usize {
        self.clusters.len()
    }

    fn extend(&mut self, other: CompositionReport) {
        self.pairs_evaluated += other.pairs_evaluated;
        self.clusters.extend(other.clusters);
    }
}

#[derive(Debug, Clone)]
pub struct CompositionEngine {
    threshold: f64,
    efficiency: f64,
    probability: f64,
    metric: Arc<dyn ResonanceMetric>,
}

impl CompositionEngine {
    /// Engine using the canonical [`PhaseFingerprint`] metric.
    pub fn new(threshold: f64, efficiency: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(CoreError::validation("composition threshold must be finite"));
        }
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(CoreError::validation(format!(
                "composition efficiency must be in (0, 1], got {efficiency}"
            )));
        }
        Ok(Self {
            threshold,
            efficiency,
            probability: 1.0,
            metric: Arc::new(PhaseFingerprint),
        })
    }

    #[must_use]
    pub fn with_metric(mut self, metric: Arc<dyn ResonanceMetric>) -> Self {
        self.metric = metric;
        self
    }

    /// Extra acceptance probability for pairs that pass the threshold.
    /// At 1.0 no random draw is taken.
    pub fn with_probability(mut self, probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(CoreError::validation(format!(
                "composition probability must be in [0, 1], got {probability}"
            )));
        }
        self.probability = probability;
        Ok(self)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn metric(&self) -> &dyn ResonanceMetric {
        self.metric.as_ref()
    }

    /// Merges `constituents` (all at `depth`) into one agent at `depth + 1`.
    ///
    /// Everything is checked before the store is touched, so either every
    /// constituent is removed and the cluster added, or nothing changes.
    pub fn merge(
        &self,
        store: &mut PopulationStore,
        constituents: &[AgentId],
        depth: usize,
        cycle: u64,
    ) -> Result<AgentId> {
        if constituents.len() < 2 {
            return Err(CoreError::validation(
                "composition needs at least two constituents",
            ));
        }
        if depth + 1 >= store.n_populations() {
            return Err(CoreError::validation(format!(
                "no population above depth {depth}; composition disabled there"
            )));
        }
        let mut seen = HashSet::new();
        let mut energy_sum = 0.0;
        let mut phase_sum = 0.0;
        let mut memory = std::collections::BTreeMap::new();
        for id in constituents {
            if !seen.insert(id) {
                return Err(CoreError::validation(format!(
                    "constituent {id} listed twice"
                )));
            }
            let agent = store
                .agent(id)
                .filter(|a| a.population_index() == depth)
                .ok_or_else(|| CoreError::not_found(format!("{id} at depth {depth}")))?;
            energy_sum += agent.energy();
            phase_sum += agent.phase;
            for (key, value) in &agent.pattern_memory {
                memory
                    .entry(key.clone())
                    .and_modify(|v: &mut f64| *v = v.max(*value))
                    .or_insert(*value);
            }
        }

        let cluster_id = store.allocate_id(Origin::Composed);
        let mut cluster = Agent::new(cluster_id.clone(), energy_sum * self.efficiency)
            .with_phase(phase_sum / constituents.len() as f64)
            .with_lineage(Lineage::cluster(constituents.to_vec(), cycle, depth + 1));
        cluster.pattern_memory = memory;

        for id in constituents {
            store.remove_agent_as(id, depth, ChangeCause::Absorbed);
        }
        store.add_agent_as(cluster, depth + 1, ChangeCause::Composed)?;

        tracing::debug!(
            cluster = %cluster_id,
            depth = depth + 1,
            constituents = constituents.len(),
            energy = energy_sum * self.efficiency,
            "Composed cluster"
        );
        Ok(cluster_id)
    }

    /// Runs the pairwise walk over one depth.
    ///
    /// Fewer than two agents, or a depth with nothing above it, is a no-op.
    pub fn compose_depth<R: Rng + ?Sized>(
        &self,
        store: &mut PopulationStore,
        depth: usize,
        rng: &mut R,
        cycle: u64,
    ) -> Result<CompositionReport> {
        let mut report = CompositionReport::default();
        if depth + 1 >= store.n_populations() {
            return Ok(report);
        }
        let mut snapshot = store.get_population_agents(depth);
        if snapshot.len() < 2 {
            return Ok(report);
        }
        snapshot.shuffle(rng);

        let mut i = 0;
        while i + 1 < snapshot.len() {
            let (a, b) = (&snapshot[i], &snapshot[i + 1]);
            report.pairs_evaluated += 1;
            let score = self.metric.resonance(a, b);
            let accepted = score >= self.threshold
                && (self.probability >= 1.0 || rng.gen::<f64>() < self.probability);
            if accepted {
                let cluster = self.merge(store, &[a.id().clone(), b.id().clone()], depth, cycle)?;
                report.clusters.push(cluster);
                i += 2;
            } else {
                i += 1;
            }
        }
        Ok(report)
    }

    /// Runs [`compose_depth`](Self::compose_depth) for every depth that has
    /// a level above it, shallowest first. Clusters formed at depth `d` are
    /// visible to the walk at `d + 1` in the same pass.
    pub fn compose_all<R: Rng + ?Sized>(
        &self,
        store: &mut PopulationStore,
        rng: &mut R,
        cycle: u64,
    ) -> Result<CompositionReport> {
        let mut report = CompositionReport::default();
        for depth in 0..store.n_populations().saturating_sub(1) {
            report.extend(self.compose_depth(store, depth, rng, cycle)?);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Fixed(f64);

    impl ResonanceMetric for Fixed {
        fn resonance(&self, _a: &Agent, _b: &Agent) -> f64 {
            self.0
        }
    }

    #[derive(Debug, Default)]
    struct Recording(Mutex<Vec<(AgentId, AgentId)>>);

    impl ResonanceMetric for Recording {
        fn resonance(&self, a: &Agent, b: &Agent) -> f64 {
            if let Ok(mut pairs) = self.0.lock() {
                pairs.push((a.id().clone(), b.id().clone()));
            }
            -1.0
        }
    }

    fn seeded(n_pops: usize, count: usize, energy: f64) -> PopulationStore {
        let mut store = PopulationStore::new(n_pops).unwrap();
        for i in 0..count {
            store
                .add_agent(Agent::new(format!("a{i}"), energy), 0)
                .unwrap();
        }
        store
    }

    #[test]
    fn test_unit_pair_composes_at_efficiency() {
        let mut store = seeded(2, 2, 1.0);
        let engine = CompositionEngine::new(0.7, 0.85).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let report = engine.compose_all(&mut store, &mut rng, 0).unwrap();
        assert_eq!(report.composed(), 1);
        assert_eq!(store.population_sizes(), vec![0, 1]);
        let clusters = store.get_population_agents(1);
        let cluster = &clusters[0];
        assert!((cluster.energy() - 1.7).abs() < 1e-12);
        assert_eq!(cluster.lineage.origin, Origin::Composed);
        assert_eq!(cluster.lineage.children.len(), 2);
        assert!(store.is_retired(&"a0".into()));
        assert!(store.is_retired(&"a1".into()));
    }

    #[test]
    fn test_failed_pairs_advance_by_one() {
        let mut store = seeded(2, 4, 1.0);
        let recording = Arc::new(Recording::default());
        let engine = CompositionEngine::new(0.5, 0.85)
            .unwrap()
            .with_metric(recording.clone());
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let report = engine.compose_depth(&mut store, 0, &mut rng, 0).unwrap();
        assert_eq!(report.pairs_evaluated, 3);
        assert_eq!(report.composed(), 0);
        let pairs = recording.0.lock().unwrap();
        for window in pairs.windows(2) {
            assert_eq!(window[0].1, window[1].0, "walk must chain on failure");
        }
    }

    #[test]
    fn test_successful_pairs_advance_by_two() {
        let mut store = seeded(2, 5, 1.0);
        let engine = CompositionEngine::new(0.5, 0.85)
            .unwrap()
            .with_metric(Arc::new(Fixed(1.0)));
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let report = engine.compose_depth(&mut store, 0, &mut rng, 0).unwrap();
        assert_eq!(report.pairs_evaluated, 2);
        assert_eq!(store.population_sizes(), vec![1, 2]);
    }

    #[test]
    fn test_single_agent_is_noop() {
        let mut store = seeded(2, 1, 1.0);
        let engine = CompositionEngine::new(-1.0, 0.85).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let report = engine.compose_all(&mut store, &mut rng, 0).unwrap();
        assert_eq!(report, CompositionReport::default());
    }

    #[test]
    fn test_last_depth_never_composes() {
        let mut store = PopulationStore::new(1).unwrap();
        store.add_agent(Agent::new("a", 1.0), 0).unwrap();
        store.add_agent(Agent::new("b", 1.0), 0).unwrap();
        let engine = CompositionEngine::new(-1.0, 0.85).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(engine.compose_all(&mut store, &mut rng, 0).unwrap().composed(), 0);
        assert!(engine
            .merge(&mut store, &["a".into(), "b".into()], 0, 0)
            .is_err());
        assert_eq!(store.population_sizes(), vec![2]);
    }

    #[test]
    fn test_merge_is_atomic_on_missing_constituent() {
        let mut store = seeded(2, 2, 1.0);
        let engine = CompositionEngine::new(0.0, 0.85).unwrap();
        let err = engine
            .merge(&mut store, &["a0".into(), "ghost".into()], 0, 0)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(store.population_sizes(), vec![2, 0]);
    }

    #[test]
    fn test_merge_takes_max_memory() {
        let mut store = PopulationStore::new(2).unwrap();
        store
            .add_agent(Agent::new("a", 1.0).with_memory("k", 0.2), 0)
            .unwrap();
        store
            .add_agent(Agent::new("b", 2.0).with_memory("k", 0.8), 0)
            .unwrap();
        let engine = CompositionEngine::new(0.0, 0.5).unwrap();
        let id = engine
            .merge(&mut store, &["a".into(), "b".into()], 0, 4)
            .unwrap();
        let cluster = store.agent(&id).unwrap();
        assert_eq!(cluster.pattern_memory["k"], 0.8);
        assert!((cluster.energy() - 1.5).abs() < 1e-12);
        assert_eq!(cluster.lineage.birth_cycle, 4);
    }

    #[test]
    fn test_zero_probability_blocks_all_merges() {
        let mut store = seeded(2, 6, 1.0);
        let engine = CompositionEngine::new(0.0, 0.85)
            .unwrap()
            .with_probability(0.0)
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(engine.compose_all(&mut store, &mut rng, 0).unwrap().composed(), 0);
    }

    #[test]
    fn test_same_seed_same_clusters() {
        let run = |seed| {
            let mut store = PopulationStore::new(3).unwrap();
            for i in 0..40 {
                store
                    .add_agent(Agent::new(format!("a{i}"), 0.5 + (i % 5) as f64 * 0.1), 0)
                    .unwrap();
            }
            let engine = CompositionEngine::new(0.6, 0.85).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            engine.compose_all(&mut store, &mut rng, 0).unwrap();
            (store.population_sizes(), store.population_ids(1))
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(CompositionEngine::new(0.5, 0.0).is_err());
        assert!(CompositionEngine::new(0.5, 1.5).is_err());
        assert!(CompositionEngine::new(0.5, f64::INFINITY).is_err());
        assert!(CompositionEngine::new(0.5, 1.0).is_ok());
        assert!(CompositionEngine::new(f64::NAN, 0.85).is_err());
        assert!(CompositionEngine::new(0.5, 0.85)
            .unwrap()
            .with_probability(1.5)
            .is_err());
    }
}
