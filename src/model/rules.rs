//! Domain rules: the per-cycle hook between recharge and composition.
//!
//! Rules receive the run's RNG as a trait object so implementations stay
//! object safe. Whatever a rule draws becomes part of the run's stream.

use crate::model::error::Result;
use crate::model::reality::RealityInterface;
use holon_core::config::ReproductionConfig;
use rand::{Rng, RngCore};

pub trait DomainRules {
    fn name(&self) -> &str;

    fn apply(&mut self, reality: &mut RealityInterface, rng: &mut dyn RngCore) -> Result<()>;
}

/// Does nothing and draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRules;

impl DomainRules for NoRules {
    fn name(&self) -> &str {
        "none"
    }

    fn apply(&mut self, _reality: &mut RealityInterface, _rng: &mut dyn RngCore) -> Result<()> {
        Ok(())
    }
}

/// Depth-0 reproduction.
///
/// Every depth-0 agent whose energy is above `threshold` takes one uniform
/// draw, in id order; below `probability` it splits off an offspring that
/// carries `offspring_fraction` of its energy.
#[derive(Debug, Clone)]
pub struct Fission {
    pub threshold: f64,
    pub offspring_fraction: f64,
    pub probability: f64,
}

impl Fission {
    pub fn from_config(config: &ReproductionConfig) -> Self {
        Self {
            threshold: config.threshold,
            offspring_fraction: config.offspring_fraction,
            probability: config.probability,
        }
    }
}

impl DomainRules for Fission {
    fn name(&self) -> &str {
        "fission"
    }

    fn apply(&mut self, reality: &mut RealityInterface, rng: &mut dyn RngCore) -> Result<()> {
        let mut births = 0usize;
        for agent in reality.get_population_agents(0) {
            if agent.energy() <= self.threshold {
                continue;
            }
            if rng.gen::<f64>() < self.probability {
                reality.spawn_offspring(agent.id(), self.offspring_fraction)?;
                births += 1;
            }
        }
        if births > 0 {
            tracing::debug!(births, cycle = reality.cycle(), "Fission births");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holon_core::Agent;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fission(probability: f64) -> Fission {
        Fission {
            threshold: 1.2,
            offspring_fraction: 0.5,
            probability,
        }
    }

    #[test]
    fn test_fission_certain_birth() {
        let mut reality = RealityInterface::new(2, None, "").unwrap();
        reality.add_agent(Agent::new("rich", 2.0), 0).unwrap();
        reality.add_agent(Agent::new("poor", 1.0), 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        fission(1.0).apply(&mut reality, &mut rng).unwrap();
        assert_eq!(reality.population_size(0), 3);
        assert!((reality.agent(&"rich".into()).unwrap().energy() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fission_draws_once_per_eligible_agent() {
        let mut reality = RealityInterface::new(1, None, "").unwrap();
        reality.add_agent(Agent::new("a", 2.0), 0).unwrap();
        reality.add_agent(Agent::new("b", 2.0), 0).unwrap();
        reality.add_agent(Agent::new("c", 0.5), 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        fission(0.0).apply(&mut reality, &mut rng).unwrap();
        assert_eq!(reality.population_size(0), 3);

        let mut expected = ChaCha8Rng::seed_from_u64(9);
        let _: f64 = expected.gen();
        let _: f64 = expected.gen();
        assert_eq!(rng.gen::<u64>(), expected.gen::<u64>());
    }

    #[test]
    fn test_no_rules_is_inert() {
        let mut reality = RealityInterface::new(1, None, "").unwrap();
        reality.add_agent(Agent::new("a", 5.0), 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        NoRules.apply(&mut reality, &mut rng).unwrap();
        assert_eq!(reality.total_agents(), 1);
        assert_eq!(NoRules.name(), "none");
    }
}
