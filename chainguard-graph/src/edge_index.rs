//! Relationship graph over real ids.
//!
//! Wraps a petgraph `DiGraph` with an id index. Parallel edges are stored
//! as given, but neighbor queries return sets, so multiplicity never shows
//! up in traversal.

use chainguard_core::{EntityId, RawEdge};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct EdgeIndex {
    graph: DiGraph<EntityId, ()>,

    /// Maps real ids to graph node indexes.
    id_index: HashMap<EntityId, NodeIndex>,
}

impl EdgeIndex {
    /// Builds the index from a raw edge list.
    ///
    /// Endpoints do not need a risk record; unknown ids get a node of
    /// their own.
    pub fn from_edges(edges: impl IntoIterator<Item = RawEdge>) -> Self {
        let mut index = Self::default();
        for edge in edges {
            let from = index.node_for(edge.source);
            let to = index.node_for(edge.target);
            index.graph.add_edge(from, to, ());
        }
        index
    }

    fn node_for(&mut self, id: EntityId) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id);
        self.id_index.insert(id, idx);
        idx
    }

    fn directed(&self, id: EntityId, direction: Direction) -> BTreeSet<EntityId> {
        let Some(&idx) = self.id_index.get(&id) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect()
    }

    /// Targets of edges leaving `id`.
    pub fn outgoing_of(&self, id: EntityId) -> BTreeSet<EntityId> {
        self.directed(id, Direction::Outgoing)
    }

    /// Sources of edges entering `id`.
    pub fn incoming_of(&self, id: EntityId) -> BTreeSet<EntityId> {
        self.directed(id, Direction::Incoming)
    }

    /// Union of `outgoing_of` and `incoming_of`.
    pub fn neighbors_of(&self, id: EntityId) -> BTreeSet<EntityId> {
        let mut all = self.outgoing_of(id);
        all.extend(self.incoming_of(id));
        all
    }

    /// Number of edges, counting parallel edges separately.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of distinct ids that appear in at least one edge.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[EntityId]) -> BTreeSet<EntityId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_empty_index() {
        let index = EdgeIndex::default();
        assert!(index.outgoing_of(1).is_empty());
        assert!(index.incoming_of(1).is_empty());
        assert_eq!(index.edge_count(), 0);
    }

    #[test]
    fn test_directions() {
        // 1 → 2, 3 → 1
        let index = EdgeIndex::from_edges([RawEdge::new(1, 2), RawEdge::new(3, 1)]);
        assert_eq!(index.outgoing_of(1), set(&[2]));
        assert_eq!(index.incoming_of(1), set(&[3]));
        assert_eq!(index.neighbors_of(1), set(&[2, 3]));
        assert_eq!(index.incoming_of(2), set(&[1]));
    }

    #[test]
    fn test_parallel_edges_collapse_in_sets() {
        let index = EdgeIndex::from_edges([
            RawEdge::new(1, 2),
            RawEdge::new(1, 2),
            RawEdge::new(1, 2),
        ]);
        assert_eq!(index.edge_count(), 3);
        assert_eq!(index.outgoing_of(1), set(&[2]));
    }

    #[test]
    fn test_self_loop() {
        let index = EdgeIndex::from_edges([RawEdge::new(4, 4)]);
        assert_eq!(index.node_count(), 1);
        assert_eq!(index.outgoing_of(4), set(&[4]));
        assert_eq!(index.incoming_of(4), set(&[4]));
    }
}
