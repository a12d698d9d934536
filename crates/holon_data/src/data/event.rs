use super::identity::AgentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Membership change kind written to the durable event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Add,
    Remove,
}

/// Why a membership change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCause {
    /// Direct caller add/remove.
    #[default]
    Manual,
    Seeded,
    Reproduced,
    /// A cluster created by composition.
    Composed,
    /// A constituent absorbed into a cluster.
    Absorbed,
    /// An offspring created by decomposition.
    Decomposed,
    /// A saturated agent that split into offspring.
    Split,
    /// Energy ran out.
    Depleted,
    Migrated,
}

/// One record of the persisted population event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEvent {
    pub event_type: EventType,
    pub agent_id: AgentId,
    pub population_index: usize,
    pub energy: f64,
    pub cycle: u64,
    #[serde(default)]
    pub cause: ChangeCause,
    #[serde(default)]
    pub mode_label: String,
    pub run_id: Uuid,
    pub timestamp: String,
}
