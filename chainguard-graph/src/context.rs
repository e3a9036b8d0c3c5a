//! The immutable bundle of indexes a running process queries.

use crate::edge_index::EdgeIndex;
use crate::identifier::IdentifierMap;
use crate::neighborhood::NeighborhoodExpander;
use crate::risk_index::RiskIndex;
use chainguard_core::is_flagged;
use serde::{Deserialize, Serialize};

/// Everything loaded at startup. Built by `DatasetBuilder`, never mutated
/// afterwards, and safe to share behind an `Arc` across any number of
/// concurrent readers.
#[derive(Debug)]
pub struct RiskContext {
    pub(crate) risks: RiskIndex,
    pub(crate) edges: EdgeIndex,
    pub(crate) ids: IdentifierMap,
}

impl RiskContext {
    pub fn risks(&self) -> &RiskIndex {
        &self.risks
    }

    pub fn ids(&self) -> &IdentifierMap {
        &self.ids
    }

    pub fn expander(&self) -> NeighborhoodExpander<'_> {
        NeighborhoodExpander::new(&self.edges, &self.risks)
    }

    /// Returns dataset statistics.
    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            record_count: self.risks.len(),
            edge_count: self.edges.edge_count(),
            graph_node_count: self.edges.node_count(),
            flagged_count: self.risks.iter().filter(|r| is_flagged(r)).count(),
        }
    }
}

/// Dataset statistics for the info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub record_count: usize,
    pub edge_count: usize,
    pub graph_node_count: usize,
    pub flagged_count: usize,
}
