use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque agent identifier.
///
/// Only uniqueness and string equality are meaningful. Callers are free to
/// encode whatever they like in it; nothing downstream parses the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How an agent came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Origin {
    #[default]
    Seeded,
    Reproduced,
    Composed,
    Decomposed,
}

impl Origin {
    /// Single-letter prefix used by engine-allocated ids.
    pub fn id_prefix(self) -> char {
        match self {
            Origin::Seeded => 's',
            Origin::Reproduced => 'r',
            Origin::Composed => 'c',
            Origin::Decomposed => 'd',
        }
    }
}

/// Structured ancestry carried by every agent.
///
/// For a cluster, `children` lists the constituents it absorbed. For
/// decomposition or reproduction offspring, `parent_id` names the agent
/// they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Lineage {
    pub parent_id: Option<AgentId>,
    pub children: Vec<AgentId>,
    pub birth_cycle: u64,
    pub birth_depth: usize,
    pub origin: Origin,
}

impl Lineage {
    pub fn seeded(birth_cycle: u64) -> Self {
        Self {
            birth_cycle,
            ..Default::default()
        }
    }

    pub fn offspring(parent: AgentId, origin: Origin, birth_cycle: u64, birth_depth: usize) -> Self {
        Self {
            parent_id: Some(parent),
            children: Vec::new(),
            birth_cycle,
            birth_depth,
            origin,
        }
    }

    pub fn cluster(constituents: Vec<AgentId>, birth_cycle: u64, birth_depth: usize) -> Self {
        Self {
            parent_id: None,
            children: constituents,
            birth_cycle,
            birth_depth,
            origin: Origin::Composed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_is_transparent_in_json() {
        let id = AgentId::from("D0_12_abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"D0_12_abc\"");
    }

    #[test]
    fn test_cluster_lineage_records_constituents() {
        let lineage = Lineage::cluster(vec!["a".into(), "b".into()], 3, 1);
        assert_eq!(lineage.origin, Origin::Composed);
        assert_eq!(lineage.children.len(), 2);
        assert!(lineage.parent_id.is_none());
    }
}
