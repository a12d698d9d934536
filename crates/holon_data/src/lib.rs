//! Plain data records shared by the holon crates.

pub mod data;

pub use data::event::{ChangeCause, EventType, PopulationEvent};
pub use data::identity::{AgentId, Lineage, Origin};
pub use data::stats::CycleSnapshot;
