pub mod macros;

use holon_core::config::SimConfig;
use holon_core::{Agent, CompositionEngine, DecompositionOperator, DepthSchedule};
use holon_io::MemorySink;
use holon_lib::model::RealityInterface;
use std::path::PathBuf;

#[allow(dead_code)]
pub struct RealityBuilder {
    n_populations: usize,
    mode_label: String,
    persistence: Option<PathBuf>,
    sink: Option<MemorySink>,
    threshold: f64,
    efficiency: f64,
    probability: f64,
    split_threshold: DepthSchedule,
    split_fraction: f64,
    agents: Vec<(Agent, usize)>,
}

#[allow(dead_code)]
impl RealityBuilder {
    pub fn new(n_populations: usize) -> Self {
        let config = SimConfig::default();
        Self {
            n_populations,
            mode_label: "test".to_string(),
            persistence: None,
            sink: None,
            threshold: config.composition.threshold,
            efficiency: config.composition.efficiency,
            probability: config.composition.probability,
            split_threshold: config.decomposition.threshold,
            split_fraction: config.decomposition.split_fraction,
            agents: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.mode_label = label.to_string();
        self
    }

    pub fn persisted_at(mut self, path: PathBuf) -> Self {
        self.persistence = Some(path);
        self
    }

    pub fn with_sink(mut self, sink: MemorySink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn composition(mut self, threshold: f64, efficiency: f64) -> Self {
        self.threshold = threshold;
        self.efficiency = efficiency;
        self
    }

    pub fn composition_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    pub fn decomposition(mut self, threshold: f64, split_fraction: f64) -> Self {
        self.split_threshold = DepthSchedule::Uniform(threshold);
        self.split_fraction = split_fraction;
        self
    }

    pub fn with_agent(mut self, id: &str, energy: f64, depth: usize) -> Self {
        self.agents.push((Agent::new(id, energy), depth));
        self
    }

    pub fn with_phased_agent(mut self, id: &str, energy: f64, phase: f64, depth: usize) -> Self {
        self.agents.push((Agent::new(id, energy).with_phase(phase), depth));
        self
    }

    pub fn build(self) -> RealityInterface {
        let composition = CompositionEngine::new(self.threshold, self.efficiency)
            .and_then(|e| e.with_probability(self.probability))
            .expect("invalid composition parameters in test builder");
        let decomposition = DecompositionOperator::new(self.split_threshold, self.split_fraction)
            .expect("invalid decomposition parameters in test builder");
        let mut reality = RealityInterface::new(self.n_populations, self.persistence, self.mode_label)
            .expect("Failed to create reality in test builder")
            .with_composition(composition)
            .with_decomposition(decomposition);
        if let Some(sink) = self.sink {
            reality = reality.with_sink(Box::new(sink));
        }
        for (agent, depth) in self.agents {
            reality
                .add_agent(agent, depth)
                .expect("Failed to add agent in test builder");
        }
        reality
    }
}

/// Unique scratch directory under the system temp dir.
#[allow(dead_code)]
pub fn temp_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}_{}", prefix, uuid::Uuid::new_v4()))
}

/// Small, fast configuration for whole-run tests.
#[allow(dead_code)]
pub fn quick_config(seed: u64) -> SimConfig {
    let mut config = SimConfig::default();
    config.world.seed = Some(seed);
    config.world.max_cycles = 30;
    config.seeding.initial_agents = 60;
    config
}
