pub mod error;
pub mod reality;
pub mod replicate;
pub mod rules;
pub mod simulation;

pub use error::{RealityError, Result};
pub use reality::RealityInterface;
pub use replicate::{run_replicate, run_replicates, ReplicateReport};
pub use rules::{DomainRules, Fission, NoRules};
pub use simulation::{Simulation, StopReason};

pub mod config {
    pub use holon_core::config::*;
}
pub mod schedule {
    pub use holon_core::schedule::*;
}
pub mod lineage {
    pub use holon_core::lineage_registry::*;
    pub use holon_core::lineage_tree::*;
}
