use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};

use crate::nv_interface::{EdgeKey, NodeName};

/// Live node/edge membership of the network at one point of a replay
///
/// Adjacency is stored per node name, without an edge index or node ids.
/// Node iteration order is insertion order, which keeps rendering stable
/// from one frame to the next. Neighbour sets use `shift_remove` so a
/// removed and re-added link does not reshuffle the remaining ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
    adjacency: IndexMap<NodeName, IndexSet<NodeName>>,
    edge_count: usize,
}

impl GraphSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeName>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        graph
    }

    /// Returns false when the node was already present
    pub fn add_node(&mut self, node: impl Into<NodeName>) -> bool {
        let node = node.into();
        if self.adjacency.contains_key(&node) {
            return false;
        }
        self.adjacency.insert(node, IndexSet::new());
        true
    }

    /// Union semantics: missing endpoints are created, an existing edge is
    /// left as is. Returns true only when a new edge was inserted.
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        self.add_node(a);
        self.add_node(b);

        let inserted = match self.adjacency.get_mut(a) {
            Some(neighbours) => neighbours.insert(b.to_string()),
            None => false,
        };
        if inserted {
            if a != b {
                if let Some(neighbours) = self.adjacency.get_mut(b) {
                    neighbours.insert(a.to_string());
                }
            }
            self.edge_count += 1;
        }
        inserted
    }

    /// Returns true only when an existing edge was removed
    pub fn remove_edge(&mut self, a: &str, b: &str) -> bool {
        let removed = match self.adjacency.get_mut(a) {
            Some(neighbours) => neighbours.shift_remove(b),
            None => false,
        };
        if removed {
            if a != b {
                if let Some(neighbours) = self.adjacency.get_mut(b) {
                    neighbours.shift_remove(a);
                }
            }
            self.edge_count -= 1;
        }
        removed
    }

    pub fn contains_node(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.adjacency
            .get(a)
            .map_or(false, |neighbours| neighbours.contains(b))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    pub fn neighbours(&self, node: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|neighbours| neighbours.iter().map(String::as_str))
    }

    pub fn degree(&self, node: &str) -> usize {
        self.adjacency.get(node).map_or(0, IndexSet::len)
    }

    /// Every edge exactly once, sorted by key
    pub fn edges(&self) -> Vec<EdgeKey> {
        self.edge_set().into_iter().collect()
    }

    pub fn edge_set(&self) -> BTreeSet<EdgeKey> {
        let mut edges = BTreeSet::new();
        for (node, neighbours) in &self.adjacency {
            for other in neighbours {
                if node <= other {
                    edges.insert(EdgeKey::new(node.as_str(), other.as_str()));
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_names(graph: &GraphSnapshot) -> Vec<String> {
        graph.edges().iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_nodes_keep_insertion_order() {
        let graph = GraphSnapshot::with_nodes(["node2", "node0", "node1", "node0"]);
        let nodes: Vec<&str> = graph.nodes().collect();
        assert_eq!(nodes, vec!["node2", "node0", "node1"]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let mut graph = GraphSnapshot::with_nodes(["A", "B"]);
        assert!(graph.add_edge("A", "B"));
        assert!(!graph.add_edge("A", "B"));
        // reversed direction is the same undirected edge
        assert!(!graph.add_edge("B", "A"));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(edge_names(&graph), vec!["A--B"]);
        assert_eq!(graph.degree("A"), 1);
        assert_eq!(graph.degree("B"), 1);
    }

    #[test]
    fn test_remove_absent_edge_is_noop() {
        let mut graph = GraphSnapshot::with_nodes(["A", "B", "C"]);
        graph.add_edge("A", "B");
        let before = graph.clone();

        assert!(!graph.remove_edge("A", "C"));
        assert!(!graph.remove_edge("X", "Y"));
        assert_eq!(graph, before);

        assert!(graph.remove_edge("B", "A"));
        assert!(!graph.has_edge("A", "B"));
        assert_eq!(graph.edge_count(), 0);
        // nodes survive the loss of their last edge
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_add_edge_creates_missing_nodes() {
        let mut graph = GraphSnapshot::with_nodes(["A"]);
        graph.add_edge("A", "Z");
        assert!(graph.contains_node("Z"));
        let neighbours: Vec<&str> = graph.neighbours("A").collect();
        assert_eq!(neighbours, vec!["Z"]);
    }

    #[test]
    fn test_self_loop_counts_once() {
        let mut graph = GraphSnapshot::new();
        assert!(graph.add_edge("A", "A"));
        assert!(!graph.add_edge("A", "A"));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(edge_names(&graph), vec!["A--A"]);
        assert!(graph.remove_edge("A", "A"));
        assert_eq!(graph.edge_count(), 0);
    }
}
