//! Run configuration.
//!
//! Every parameter of a simulation run maps to a section of a TOML file.
//! Values missing from the file fall back to the `Default` impls below.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! n_populations = 4
//! seed = 42
//! max_cycles = 200
//!
//! [energy]
//! recharge = { Uniform = 0.05 }
//! decay = { PerDepth = [0.02, 0.03, 0.05] }
//!
//! [decomposition]
//! threshold = { Geometric = { base = 1.3, ratio = 1.5 } }
//! ```

use crate::schedule::DepthSchedule;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    pub n_populations: usize,
    pub seed: Option<u64>,
    pub mode_label: String,
    pub persistence_target: Option<PathBuf>,
    pub max_cycles: u64,
    /// Stop once the total agent count reaches this.
    pub population_cap: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            n_populations: 4,
            seed: None,
            mode_label: "baseline".to_string(),
            persistence_target: None,
            max_cycles: 200,
            population_cap: 3000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SeedingConfig {
    /// Agents placed at depth 0 before the first cycle.
    pub initial_agents: usize,
    pub initial_energy: f64,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            initial_agents: 200,
            initial_energy: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EnergyConfig {
    pub recharge: DepthSchedule,
    pub cap: f64,
    pub decay: DepthSchedule,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            recharge: DepthSchedule::Uniform(0.05),
            cap: 5.0,
            decay: DepthSchedule::Uniform(0.02),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CompositionConfig {
    pub enabled: bool,
    pub threshold: f64,
    pub efficiency: f64,
    pub probability: f64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.7,
            efficiency: 0.85,
            probability: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DecompositionConfig {
    pub enabled: bool,
    pub threshold: DepthSchedule,
    pub split_fraction: f64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DepthSchedule::Uniform(1.3),
            split_fraction: 0.45,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReproductionConfig {
    pub enabled: bool,
    pub threshold: f64,
    pub offspring_fraction: f64,
    pub probability: f64,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 1.2,
            offspring_fraction: 0.5,
            probability: 0.3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub seeding: SeedingConfig,
    pub energy: EnergyConfig,
    pub composition: CompositionConfig,
    pub decomposition: DecompositionConfig,
    pub reproduction: ReproductionConfig,
}

fn unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

impl SimConfig {
    /// Validates all parameters, reporting the first failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        let depths = self.world.n_populations;

        anyhow::ensure!(depths > 0, "Population count must be positive");
        anyhow::ensure!(self.world.max_cycles > 0, "Max cycles must be positive");
        anyhow::ensure!(
            self.world.population_cap > 0,
            "Population cap must be positive"
        );

        anyhow::ensure!(
            self.seeding.initial_energy.is_finite() && self.seeding.initial_energy >= 0.0,
            "Initial energy must be non-negative"
        );

        anyhow::ensure!(
            self.energy.cap.is_finite() && self.energy.cap >= 0.0,
            "Energy cap must be non-negative"
        );
        anyhow::ensure!(
            self.energy.recharge.is_valid(depths),
            "Recharge schedule must be finite and non-negative"
        );
        anyhow::ensure!(
            self.energy.decay.is_valid(depths),
            "Decay schedule must be finite and non-negative"
        );

        anyhow::ensure!(
            (-1.0..=1.0).contains(&self.composition.threshold),
            "Composition threshold must be in [-1.0, 1.0]"
        );
        anyhow::ensure!(
            self.composition.efficiency > 0.0 && self.composition.efficiency <= 1.0,
            "Composition efficiency must be in (0.0, 1.0]"
        );
        anyhow::ensure!(
            unit_interval(self.composition.probability),
            "Composition probability must be in [0.0, 1.0]"
        );

        anyhow::ensure!(
            self.decomposition.threshold.is_valid(depths),
            "Decomposition threshold schedule must be finite and non-negative"
        );
        anyhow::ensure!(
            self.decomposition.split_fraction > 0.0 && self.decomposition.split_fraction <= 1.0,
            "Split fraction must be in (0.0, 1.0]"
        );

        anyhow::ensure!(
            self.reproduction.threshold.is_finite() && self.reproduction.threshold >= 0.0,
            "Reproduction threshold must be non-negative"
        );
        anyhow::ensure!(
            self.reproduction.offspring_fraction > 0.0 && self.reproduction.offspring_fraction < 1.0,
            "Offspring fraction must be in (0.0, 1.0)"
        );
        anyhow::ensure!(
            unit_interval(self.reproduction.probability),
            "Reproduction probability must be in [0.0, 1.0]"
        );

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Hash of the dynamics parameters. Seed and persistence target are
    /// left out so replicates of one condition share a fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.world.n_populations.to_le_bytes());
        hasher.update(self.world.mode_label.as_bytes());
        hasher.update(format!("{:?}", self.seeding).as_bytes());
        hasher.update(format!("{:?}", self.energy).as_bytes());
        hasher.update(format!("{:?}", self.composition).as_bytes());
        hasher.update(format!("{:?}", self.decomposition).as_bytes());
        hasher.update(format!("{:?}", self.reproduction).as_bytes());
        hex::encode(hasher.finalize())
    }
}
