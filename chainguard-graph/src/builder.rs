//! Builds a `RiskContext` from loaded dataset rows.
//!
//! The risk records are the single source of truth for identifiers: public
//! ids are derived from them directly with the keyed hash, so there is no
//! second dataset whose rows have to line up.

use crate::context::RiskContext;
use crate::edge_index::EdgeIndex;
use crate::identifier::{IdentifierMap, Salt};
use crate::risk_index::RiskIndex;
use chainguard_core::{ConfigError, EntityId, RawEdge, RiskRecord};
use tracing::info;

/// Collects records, edges and the salt, then builds everything in one go.
///
/// Call `add_records` and `add_edges` as data arrives, then `build`.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    records: Vec<RiskRecord>,
    edges: Vec<RawEdge>,
    salt: Option<String>,
}

impl DatasetBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pseudonymisation salt.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn add_records(&mut self, records: impl IntoIterator<Item = RiskRecord>) -> &mut Self {
        self.records.extend(records);
        self
    }

    pub fn add_record(&mut self, record: RiskRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = RawEdge>) -> &mut Self {
        self.edges.extend(edges);
        self
    }

    pub fn add_edge(&mut self, source: EntityId, target: EntityId) -> &mut Self {
        self.edges.push(RawEdge::new(source, target));
        self
    }

    /// Finishes building.
    ///
    /// Fails on a missing salt, an identifier collision, or when the
    /// identifier map does not cover the risk index exactly.
    pub fn build(self) -> Result<RiskContext, ConfigError> {
        let salt = Salt::new(self.salt.unwrap_or_default())?;

        let risks = RiskIndex::from_records(self.records);
        let ids = IdentifierMap::build(salt, risks.ids())?;

        let edges = EdgeIndex::from_edges(self.edges);

        info!(
            records = risks.len(),
            edges = edges.edge_count(),
            graph_nodes = edges.node_count(),
            "Risk context built"
        );

        Ok(RiskContext { risks, edges, ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainguard_core::ClassLabel;

    #[test]
    fn test_builds_all_indexes() {
        let mut builder = DatasetBuilder::new().with_salt("pepper");
        builder
            .add_record(RiskRecord::new(1, 10.0))
            .add_record(RiskRecord::new(2, 95.0).with_class(ClassLabel::Illicit))
            .add_edge(1, 2)
            .add_edge(2, 3);
        let ctx = builder.build().unwrap();

        let stats = ctx.stats();
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.edge_count, 2);
        assert_eq!(stats.graph_node_count, 3);
        assert_eq!(stats.flagged_count, 1);
        assert_eq!(ctx.ids().len(), 2);
    }

    #[test]
    fn test_missing_salt_is_fatal() {
        let mut builder = DatasetBuilder::new();
        builder.add_record(RiskRecord::new(1, 10.0));
        assert!(matches!(builder.build(), Err(ConfigError::MissingSalt)));
    }

    #[test]
    fn test_duplicate_records_collapse_before_mapping() {
        let mut builder = DatasetBuilder::new().with_salt("pepper");
        builder.add_records(vec![RiskRecord::new(1, 10.0), RiskRecord::new(1, 20.0)]);
        let ctx = builder.build().unwrap();
        assert_eq!(ctx.risks().len(), 1);
        assert_eq!(ctx.ids().len(), 1);
    }

    #[test]
    fn test_empty_dataset_builds() {
        let ctx = DatasetBuilder::new().with_salt("pepper").build().unwrap();
        assert!(ctx.risks().is_empty());
        assert!(ctx.ids().is_empty());
    }
}
