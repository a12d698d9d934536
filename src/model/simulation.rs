//! Step-based cycle runner.
//!
//! A cycle is one synchronous pass: recharge, domain rules, composition,
//! decomposition, decay, snapshot. The run's only RNG lives here and is
//! handed to each stochastic stage in that order.

use crate::model::error::{RealityError, Result};
use crate::model::reality::RealityInterface;
use crate::model::rules::{DomainRules, Fission, NoRules};
use holon_core::{Agent, Metrics, SimConfig};
use holon_data::{ChangeCause, CycleSnapshot, Lineage, Origin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Why [`Simulation::run`] returned.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxCycles,
    PopulationCap,
    Extinction,
}

pub struct Simulation {
    config: SimConfig,
    seed: u64,
    rng: ChaCha8Rng,
    reality: RealityInterface,
    rules: Box<dyn DomainRules + Send>,
    trajectory: Vec<CycleSnapshot>,
    metrics: Metrics,
    cycle: u64,
}

impl Simulation {
    /// Validates `config` and builds the facade and RNG. Without a seed in
    /// the config one is drawn from entropy and kept so the run can be
    /// repeated.
    pub fn new(config: SimConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| RealityError::config(e.to_string()))?;
        let seed = config
            .world
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        let reality = RealityInterface::from_config(&config)?;
        let rules: Box<dyn DomainRules + Send> = if config.reproduction.enabled {
            Box::new(Fission::from_config(&config.reproduction))
        } else {
            Box::new(NoRules)
        };
        Ok(Self {
            config,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            reality,
            rules,
            trajectory: Vec::new(),
            metrics: Metrics::new(),
            cycle: 0,
        })
    }

    pub fn with_rules(mut self, rules: Box<dyn DomainRules + Send>) -> Self {
        self.rules = rules;
        self
    }

    /// Replaces the facade, for example to attach a different event sink.
    pub fn with_reality(mut self, reality: RealityInterface) -> Self {
        self.reality = reality;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn reality(&self) -> &RealityInterface {
        &self.reality
    }

    pub fn reality_mut(&mut self) -> &mut RealityInterface {
        &mut self.reality
    }

    pub fn trajectory(&self) -> &[CycleSnapshot] {
        &self.trajectory
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Places `seeding.initial_agents` agents at depth 0, drawing one phase
    /// per agent from the run's RNG.
    pub fn seed_initial(&mut self) -> Result<()> {
        self.reality.begin_cycle(self.cycle);
        let energy = self.config.seeding.initial_energy;
        for _ in 0..self.config.seeding.initial_agents {
            let id = self.reality.allocate_id(Origin::Seeded);
            let phase = self.rng.gen::<f64>() * std::f64::consts::TAU;
            let agent = Agent::new(id, energy)
                .with_phase(phase)
                .with_lineage(Lineage::seeded(self.cycle));
            self.reality.add_agent_as(agent, 0, ChangeCause::Seeded)?;
        }
        tracing::info!(
            agents = self.config.seeding.initial_agents,
            seed = self.seed,
            "Seeded initial population"
        );
        Ok(())
    }

    /// Runs one full cycle and returns its snapshot.
    pub fn step(&mut self) -> Result<CycleSnapshot> {
        let start = Instant::now();
        self.reality.begin_cycle(self.cycle);

        self.reality
            .recharge_all(&self.config.energy.recharge, self.config.energy.cap)?;

        self.rules.apply(&mut self.reality, &mut self.rng)?;

        let composed = if self.config.composition.enabled {
            self.reality.compose(&mut self.rng)?.composed()
        } else {
            0
        };

        let decomposed = if self.config.decomposition.enabled {
            self.reality.decompose()?.decomposed()
        } else {
            0
        };

        let depleted = self.reality.decay_all(&self.config.energy.decay)?.len();

        let snapshot = CycleSnapshot {
            composed,
            decomposed,
            depleted,
            ..self.reality.snapshot()
        };
        self.metrics.record_cycle(&snapshot, start.elapsed());
        self.trajectory.push(snapshot.clone());
        self.cycle += 1;
        Ok(snapshot)
    }

    /// Steps until `max_cycles`, until the population reaches the cap, or
    /// until no agents remain.
    pub fn run(&mut self) -> Result<StopReason> {
        let reason = loop {
            if self.cycle >= self.config.world.max_cycles {
                break StopReason::MaxCycles;
            }
            let snapshot = self.step()?;
            let total = snapshot.total_agents();
            if total == 0 {
                break StopReason::Extinction;
            }
            if total >= self.config.world.population_cap {
                break StopReason::PopulationCap;
            }
        };
        tracing::info!(
            cycles = self.cycle,
            seed = self.seed,
            agents = self.reality.total_agents(),
            composed = self.metrics.composed_total(),
            decomposed = self.metrics.decomposed_total(),
            reason = ?reason,
            elapsed_ms = self.metrics.elapsed().as_millis() as u64,
            "Run finished"
        );
        Ok(reason)
    }
}
