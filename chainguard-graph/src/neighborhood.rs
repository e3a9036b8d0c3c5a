//! Depth-bounded neighborhood expansion.
//!
//! Breadth-first search over the undirected view of the relationship graph
//! (outgoing and incoming edges together), starting at a center entity.
//! It answers: "what is connected to this entity, and how risky is it?"
//!
//! Edge directions are only ever taken from the center's own adjacency.
//! Neighbors further out are attached to the center with a synthetic
//! `Indirect` edge; the actual path is not reconstructed.

use crate::edge::ClassifiedEdge;
use crate::edge_index::EdgeIndex;
use crate::risk_index::RiskIndex;
use chainguard_core::{is_flagged, EntityId, QueryError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Instant;
use tracing::debug;

/// A node in a neighborhood view, annotated with its risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedNode {
    pub id: EntityId,
    /// Hops from the center at first discovery. 0 for the center itself.
    pub hop_distance: usize,
    /// 0.0 when the entity has no risk record.
    pub risk_score: f64,
    pub flagged: bool,
}

/// Result of expanding around one center, in real-id space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborhoodView {
    pub center: ExpandedNode,
    /// Sorted by hop distance, then id.
    pub neighbors: Vec<ExpandedNode>,
    /// In neighbor order.
    pub edges: Vec<ClassifiedEdge>,
    pub max_depth: usize,
    pub query_time_ms: u64,
}

impl NeighborhoodView {
    pub fn neighbor_ids(&self) -> BTreeSet<EntityId> {
        self.neighbors.iter().map(|n| n.id).collect()
    }

    /// Center plus neighbors.
    pub fn node_count(&self) -> usize {
        self.neighbors.len() + 1
    }
}

/// Expands neighborhoods over a read-only edge index.
///
/// Holds only borrows; every call keeps its own visited set, so one
/// expander can serve concurrent callers.
#[derive(Debug, Clone, Copy)]
pub struct NeighborhoodExpander<'a> {
    edges: &'a EdgeIndex,
    risks: &'a RiskIndex,
}

impl<'a> NeighborhoodExpander<'a> {
    pub fn new(edges: &'a EdgeIndex, risks: &'a RiskIndex) -> Self {
        Self { edges, risks }
    }

    /// Expands up to `max_depth` hops around `center`.
    ///
    /// `max_depth == 0` yields the center alone. The center must have a
    /// risk record; otherwise the result is `NotFound`.
    pub fn expand(
        &self,
        center: EntityId,
        max_depth: usize,
    ) -> Result<NeighborhoodView, QueryError> {
        let start = Instant::now();

        if !self.risks.contains(center) {
            return Err(QueryError::not_found("center entity"));
        }

        let reached = self.reach(center, max_depth);

        let direct_out = self.edges.outgoing_of(center);
        let direct_in = self.edges.incoming_of(center);

        let mut neighbors = Vec::with_capacity(reached.len());
        let mut edges = Vec::with_capacity(reached.len());

        for (id, hop) in reached {
            let is_out = direct_out.contains(&id);
            let is_in = direct_in.contains(&id);

            if is_out {
                edges.push(ClassifiedEdge::outgoing(center, id));
            }
            if is_in {
                edges.push(ClassifiedEdge::incoming(center, id));
            }
            if !is_out && !is_in {
                edges.push(ClassifiedEdge::indirect(center, id));
            }

            neighbors.push(self.annotate(id, hop));
        }

        debug!(
            neighbors = neighbors.len(),
            edges = edges.len(),
            max_depth,
            "Neighborhood expanded"
        );

        Ok(NeighborhoodView {
            center: self.annotate(center, 0),
            neighbors,
            edges,
            max_depth,
            query_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// BFS returning every node within `max_depth` hops, excluding the
    /// center, with the hop at which it was first reached.
    fn reach(&self, center: EntityId, max_depth: usize) -> Vec<(EntityId, usize)> {
        let mut visited: HashSet<EntityId> = HashSet::new();
        let mut queue: VecDeque<(EntityId, usize)> = VecDeque::new();
        let mut reached = Vec::new();

        visited.insert(center);
        queue.push_back((center, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            for neighbor in self.edges.neighbors_of(current) {
                // Marked on first sight so cycles and repeats never re-expand.
                if visited.insert(neighbor) {
                    reached.push((neighbor, depth + 1));
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        reached.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        reached
    }

    fn annotate(&self, id: EntityId, hop_distance: usize) -> ExpandedNode {
        let record = self.risks.get(id);
        ExpandedNode {
            id,
            hop_distance,
            risk_score: record.map(|r| r.risk_score).unwrap_or(0.0),
            flagged: record.map(is_flagged).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeDirection;
    use chainguard_core::{ClassLabel, RawEdge, RiskRecord};

    fn risks(ids: &[EntityId]) -> RiskIndex {
        RiskIndex::from_records(ids.iter().map(|&id| RiskRecord::new(id, 10.0)))
    }

    fn edges(pairs: &[(EntityId, EntityId)]) -> EdgeIndex {
        EdgeIndex::from_edges(pairs.iter().map(|&(s, t)| RawEdge::new(s, t)))
    }

    fn ids(list: &[EntityId]) -> BTreeSet<EntityId> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_unknown_center() {
        let r = risks(&[1]);
        let e = edges(&[(1, 2)]);
        let err = NeighborhoodExpander::new(&e, &r).expand(2, 1).unwrap_err();
        assert!(matches!(err, QueryError::NotFound(_)));
    }

    #[test]
    fn test_depth_zero_is_center_only() {
        let r = risks(&[1, 2, 3]);
        let e = edges(&[(1, 2), (3, 1), (1, 1)]);
        let view = NeighborhoodExpander::new(&e, &r).expand(1, 0).unwrap();
        assert_eq!(view.center.id, 1);
        assert_eq!(view.node_count(), 1);
        assert!(view.neighbors.is_empty());
        assert!(view.edges.is_empty());
    }

    #[test]
    fn test_isolated_center() {
        let r = risks(&[1]);
        let e = EdgeIndex::default();
        let view = NeighborhoodExpander::new(&e, &r).expand(1, 3).unwrap();
        assert!(view.neighbors.is_empty());
        assert!(view.edges.is_empty());
    }

    #[test]
    fn test_direct_neighbors_get_real_directions() {
        // 1 → 2, 3 → 1
        let r = risks(&[1, 2, 3]);
        let e = edges(&[(1, 2), (3, 1)]);
        let view = NeighborhoodExpander::new(&e, &r).expand(1, 1).unwrap();

        assert_eq!(view.neighbor_ids(), ids(&[2, 3]));
        assert_eq!(
            view.edges,
            vec![ClassifiedEdge::outgoing(1, 2), ClassifiedEdge::incoming(1, 3)]
        );
        assert_eq!(view.edges[1].source, 3);
        assert_eq!(view.edges[1].target, 1);
    }

    #[test]
    fn test_bidirectional_neighbor_gets_both_edges() {
        let r = risks(&[1, 2]);
        let e = edges(&[(1, 2), (2, 1)]);
        let view = NeighborhoodExpander::new(&e, &r).expand(1, 1).unwrap();
        assert_eq!(view.neighbors.len(), 1);
        let directions: Vec<EdgeDirection> = view.edges.iter().map(|e| e.direction).collect();
        assert_eq!(
            directions,
            vec![EdgeDirection::Outgoing, EdgeDirection::Incoming]
        );
    }

    #[test]
    fn test_far_neighbors_are_indirect() {
        // 1 → 2 → 3 ← 4
        let r = risks(&[1, 2, 3, 4]);
        let e = edges(&[(1, 2), (2, 3), (4, 3)]);
        let view = NeighborhoodExpander::new(&e, &r).expand(1, 3).unwrap();

        assert_eq!(view.neighbor_ids(), ids(&[2, 3, 4]));
        let hops: Vec<(EntityId, usize)> =
            view.neighbors.iter().map(|n| (n.id, n.hop_distance)).collect();
        assert_eq!(hops, vec![(2, 1), (3, 2), (4, 3)]);

        assert_eq!(
            view.edges,
            vec![
                ClassifiedEdge::outgoing(1, 2),
                ClassifiedEdge::indirect(1, 3),
                ClassifiedEdge::indirect(1, 4),
            ]
        );
    }

    #[test]
    fn test_cycle_terminates() {
        // 1 → 2 → 3 → 1
        let r = risks(&[1, 2, 3]);
        let e = edges(&[(1, 2), (2, 3), (3, 1)]);
        let view = NeighborhoodExpander::new(&e, &r).expand(1, 10).unwrap();
        assert_eq!(view.neighbor_ids(), ids(&[2, 3]));
        assert_eq!(view.edges.len(), 2);
    }

    #[test]
    fn test_center_never_its_own_neighbor() {
        let r = risks(&[1, 2]);
        let e = edges(&[(1, 1), (1, 2), (2, 1), (2, 2)]);
        let expander = NeighborhoodExpander::new(&e, &r);
        for depth in 0..5 {
            let view = expander.expand(1, depth).unwrap();
            assert!(!view.neighbor_ids().contains(&1), "depth {}", depth);
        }
    }

    #[test]
    fn test_monotonic_growth() {
        // A small graph with a cycle, a fork and parallel edges.
        let r = risks(&[1, 2, 3, 4, 5, 6, 7]);
        let e = edges(&[
            (1, 2),
            (2, 3),
            (3, 1),
            (3, 4),
            (5, 4),
            (5, 4),
            (6, 5),
            (7, 7),
        ]);
        let expander = NeighborhoodExpander::new(&e, &r);

        let mut previous = BTreeSet::new();
        for depth in 0..6 {
            let current = expander.expand(1, depth).unwrap().neighbor_ids();
            assert!(previous.is_subset(&current), "depth {}", depth);
            previous = current;
        }
        assert_eq!(previous, ids(&[2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_neighbor_annotations() {
        let r = RiskIndex::from_records(vec![
            RiskRecord::new(1, 10.0),
            RiskRecord::new(2, 15.0).with_class(ClassLabel::Illicit),
            RiskRecord::new(3, 50.0),
        ]);
        // 4 is only in the edge list.
        let e = edges(&[(1, 2), (1, 3), (4, 1)]);
        let view = NeighborhoodExpander::new(&e, &r).expand(1, 1).unwrap();

        let by_id = |id: EntityId| view.neighbors.iter().find(|n| n.id == id).unwrap();
        assert!(by_id(2).flagged);
        assert_eq!(by_id(2).risk_score, 15.0);
        assert!(!by_id(3).flagged);
        assert_eq!(by_id(3).risk_score, 50.0);
        assert_eq!(by_id(4).risk_score, 0.0);
        assert!(!by_id(4).flagged);
    }
}
