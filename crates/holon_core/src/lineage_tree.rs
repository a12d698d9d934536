use crate::lineage_registry::LineageRegistry;
use holon_data::{AgentId, Origin};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use std::collections::HashMap;

/// A node in the ancestry graph.
pub struct AncestryNode {
    pub id: AgentId,
    pub origin: Origin,
    pub depth: usize,
    pub is_alive: bool,
}

/// Directed ancestry graph. Edges point from ancestor to descendant:
/// parent to offspring, and constituent to cluster.
pub struct AncestryTree {
    pub graph: DiGraph<AncestryNode, ()>,
    id_map: HashMap<AgentId, NodeIndex>,
}

impl Default for AncestryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AncestryTree {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_map: HashMap::new(),
        }
    }

    pub fn build(registry: &LineageRegistry) -> Self {
        let mut tree = Self::new();

        for record in registry.records.values() {
            let idx = tree.graph.add_node(AncestryNode {
                id: record.id.clone(),
                origin: record.origin,
                depth: record.birth_depth,
                is_alive: record.is_alive(),
            });
            tree.id_map.insert(record.id.clone(), idx);
        }

        for record in registry.records.values() {
            let Some(&child) = tree.id_map.get(&record.id) else {
                continue;
            };
            let ancestors = record.parent_id.iter().chain(record.constituents.iter());
            for ancestor in ancestors {
                if let Some(&from) = tree.id_map.get(ancestor) {
                    tree.graph.add_edge(from, child, ());
                }
            }
        }

        tree
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Every recorded ancestor of `id`, nearest first. Empty if unknown.
    pub fn ancestors(&self, id: &AgentId) -> Vec<AgentId> {
        let Some(&start) = self.id_map.get(id) else {
            return Vec::new();
        };
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, start);
        let mut out = Vec::new();
        while let Some(idx) = bfs.next(reversed) {
            if idx != start {
                out.push(self.graph[idx].id.clone());
            }
        }
        out
    }

    /// Export the tree to Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph Ancestry {\n");
        dot.push_str("  node [shape=box, style=filled, fontname=\"Arial\"];\n");

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let fill = if node.is_alive { "#e1f5fe" } else { "#eeeeee" };
            let border = match node.origin {
                Origin::Composed => "purple",
                Origin::Decomposed => "orange",
                Origin::Reproduced => "green",
                Origin::Seeded => "black",
            };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{} (D{})\", fillcolor=\"{}\", color=\"{}\"];\n",
                node.id, node.id, node.depth, fill, border
            ));
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    self.graph[from].id, self.graph[to].id
                ));
            }
        }

        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::composition::CompositionEngine;
    use crate::decomposition::DecompositionOperator;
    use crate::population::PopulationStore;
    use crate::schedule::DepthSchedule;

    #[test]
    fn test_ancestors_cross_composition_and_decomposition() {
        let mut store = PopulationStore::new(2).unwrap().with_journal();
        let mut registry = LineageRegistry::new();
        store.add_agent(Agent::new("a", 1.0), 0).unwrap();
        store.add_agent(Agent::new("b", 1.0), 0).unwrap();
        let cluster = CompositionEngine::new(0.0, 1.0)
            .unwrap()
            .merge(&mut store, &["a".into(), "b".into()], 0, 0)
            .unwrap();
        let offspring = DecompositionOperator::new(DepthSchedule::Uniform(1.0), 0.45)
            .unwrap()
            .split(&mut store, &cluster, 1)
            .unwrap();
        for change in store.drain_journal() {
            registry.apply(&change, 1);
        }

        let tree = AncestryTree::build(&registry);
        assert_eq!(tree.len(), 5);
        let ancestors = tree.ancestors(&offspring[0]);
        assert_eq!(ancestors[0], cluster);
        assert!(ancestors.contains(&"a".into()));
        assert!(ancestors.contains(&"b".into()));
        assert!(tree.to_dot().contains("->"));
    }

    #[test]
    fn test_unknown_id_has_no_ancestors() {
        let tree = AncestryTree::build(&LineageRegistry::new());
        assert!(tree.is_empty());
        assert!(tree.ancestors(&"x".into()).is_empty());
    }
}
