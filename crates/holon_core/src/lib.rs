//! # Holon Core
//!
//! Deterministic engine for multi-population agent dynamics.
//!
//! Agents live in an indexed stack of populations, one per depth. Agents at
//! the same depth that resonate strongly enough compose into a single
//! cluster one depth up; clusters whose energy grows past a depth-dependent
//! threshold decompose back into offspring one depth down.
//!
//! This crate contains:
//! - The agent model and its phase-fingerprint resonance
//! - The population store with membership journaling and retired-id tracking
//! - Composition and decomposition operators
//! - Energy recharge, decay and reproduction passes
//! - Lineage registry and ancestry graph
//! - Run configuration, metrics and logging setup
//!
//! Every stochastic operation takes the RNG as an argument; nothing here
//! owns or seeds one.
//!
//! ## Example
//!
//! ```
//! use holon_core::{Agent, CompositionEngine, PopulationStore};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut store = PopulationStore::new(2).unwrap();
//! store.add_agent(Agent::new("a", 1.0), 0).unwrap();
//! store.add_agent(Agent::new("b", 1.0), 0).unwrap();
//!
//! let engine = CompositionEngine::new(-1.0, 0.85).unwrap();
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let report = engine.compose_all(&mut store, &mut rng, 0).unwrap();
//! assert_eq!(report.composed(), 1);
//! assert_eq!(store.population_size(1), 1);
//! ```

/// Agent state, energy operations and resonance
pub mod agent;
/// Merging resonant agents into clusters one depth up
pub mod composition;
/// Run configuration loaded from TOML
pub mod config;
/// Splitting high-energy clusters into offspring one depth down
pub mod decomposition;
pub mod error;
/// Recharge, decay and reproduction passes
pub mod lifecycle;
/// Per-id birth and death records
pub mod lineage_registry;
/// Ancestry graph construction and DOT export
pub mod lineage_tree;
/// Run metrics and logging setup
pub mod metrics;
/// Indexed population storage
pub mod population;
pub mod resonance;
pub mod schedule;

pub use agent::Agent;
pub use composition::{CompositionEngine, CompositionReport};
pub use config::SimConfig;
pub use decomposition::{DecompositionOperator, DecompositionReport};
pub use error::{CoreError, Result};
pub use lineage_registry::{LineageRecord, LineageRegistry};
pub use lineage_tree::AncestryTree;
pub use metrics::{init_logging, Metrics};
pub use population::{MembershipChange, PopulationStore};
pub use resonance::{PhaseFingerprint, ResonanceMetric};
pub use schedule::DepthSchedule;
