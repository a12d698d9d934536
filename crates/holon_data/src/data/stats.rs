use serde::{Deserialize, Serialize};

/// Population state captured at the end of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CycleSnapshot {
    pub cycle: u64,
    /// Agent count per depth, index = population index.
    pub sizes: Vec<usize>,
    pub total_energy: f64,
    pub composed: usize,
    pub decomposed: usize,
    pub depleted: usize,
}

impl CycleSnapshot {
    pub fn total_agents(&self) -> usize {
        self.sizes.iter().sum()
    }
}
