//! Query orchestration.
//!
//! `QueryService` is the only thing the transport layer talks to. Every
//! public-id request is resolved through the `IdentifierMap` first; any
//! resolution failure is a plain `NotFound`. Responses are rendered back
//! into public ids before they leave this module.

use crate::context::{DatasetStats, RiskContext};
use crate::neighborhood::NeighborhoodView;
use crate::query::{
    BatchResult, IdMode, NodeRole, PublicEdge, PublicNeighborhood, PublicNode, PublicRecord,
    RiskBreakdown, RiskReport,
};
use chainguard_core::{classify, EntityId, QueryError, RiskRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default ceiling on `graph` depth.
pub const DEFAULT_MAX_GRAPH_DEPTH: usize = 3;

/// Request-shape limits enforced before touching any index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    pub max_graph_depth: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_graph_depth: DEFAULT_MAX_GRAPH_DEPTH,
        }
    }
}

/// Serves lookups, batches, rankings and graph views over a shared,
/// immutable `RiskContext`.
#[derive(Debug, Clone)]
pub struct QueryService {
    ctx: Arc<RiskContext>,
    limits: QueryLimits,
}

impl QueryService {
    pub fn new(ctx: Arc<RiskContext>) -> Self {
        Self::with_limits(ctx, QueryLimits::default())
    }

    pub fn with_limits(ctx: Arc<RiskContext>, limits: QueryLimits) -> Self {
        Self { ctx, limits }
    }

    pub fn context(&self) -> &RiskContext {
        &self.ctx
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    fn resolve(&self, public_id: &str) -> Result<EntityId, QueryError> {
        self.ctx
            .ids
            .to_real(public_id)
            .ok_or_else(|| QueryError::not_found(format!("public id {}", public_id)))
    }

    fn publish(&self, record: &RiskRecord) -> PublicRecord {
        PublicRecord::new(record, self.ctx.ids.render(record.id))
    }

    /// Looks up one entity by public id.
    pub fn lookup(&self, public_id: &str) -> Result<PublicRecord, QueryError> {
        let real = self.resolve(public_id)?;
        self.ctx
            .risks
            .get(real)
            .map(|record| self.publish(record))
            .ok_or_else(|| QueryError::not_found(format!("public id {}", public_id)))
    }

    /// Looks up one entity by real id. For trusted offline tooling.
    pub fn lookup_real(&self, real_id: EntityId) -> Result<PublicRecord, QueryError> {
        self.ctx
            .risks
            .get(real_id)
            .map(|record| self.publish(record))
            .ok_or_else(|| QueryError::not_found(format!("transaction {}", real_id)))
    }

    /// Looks up many entities.
    ///
    /// Results keep the order of first occurrence in `ids`; duplicates and
    /// unknown ids are dropped. In `Real` mode an identifier that is not an
    /// integer rejects the whole request.
    pub fn batch_lookup<S: AsRef<str>>(
        &self,
        ids: &[S],
        mode: IdMode,
    ) -> Result<BatchResult, QueryError> {
        let real_ids: Vec<EntityId> = match mode {
            IdMode::Public => ids
                .iter()
                .filter_map(|id| self.ctx.ids.to_real(id.as_ref().trim()))
                .collect(),
            IdMode::Real => ids
                .iter()
                .map(|id| {
                    let raw = id.as_ref().trim();
                    raw.parse::<EntityId>()
                        .map_err(|_| QueryError::invalid(format!("'{}' is not a transaction id", raw)))
                })
                .collect::<Result<_, _>>()?,
        };

        let results: Vec<PublicRecord> = self
            .ctx
            .risks
            .get_batch(&real_ids)
            .into_iter()
            .map(|record| self.publish(record))
            .collect();

        debug!(
            requested = ids.len(),
            found = results.len(),
            ?mode,
            "Batch lookup"
        );

        Ok(BatchResult {
            total_requested: ids.len(),
            found: results.len(),
            breakdown: RiskBreakdown::from_records(&results),
            results,
        })
    }

    /// The `k` riskiest entities, highest first.
    pub fn top_risky(&self, k: usize) -> Vec<PublicRecord> {
        self.ctx
            .risks
            .top_k(k)
            .into_iter()
            .map(|record| self.publish(record))
            .collect()
    }

    /// Neighborhood of an entity, up to `depth` hops, in public ids.
    pub fn graph(&self, public_id: &str, depth: usize) -> Result<PublicNeighborhood, QueryError> {
        self.check_depth(depth)?;
        let real = self.resolve(public_id)?;
        self.expand(real, depth)
            .map_err(|_| QueryError::not_found(format!("public id {}", public_id)))
    }

    /// Neighborhood of an entity addressed by real id. For trusted offline
    /// tooling.
    pub fn graph_real(
        &self,
        real_id: EntityId,
        depth: usize,
    ) -> Result<PublicNeighborhood, QueryError> {
        self.check_depth(depth)?;
        self.expand(real_id, depth)
    }

    fn check_depth(&self, depth: usize) -> Result<(), QueryError> {
        if depth > self.limits.max_graph_depth {
            return Err(QueryError::invalid(format!(
                "depth {} exceeds the maximum of {}",
                depth, self.limits.max_graph_depth
            )));
        }
        Ok(())
    }

    fn expand(&self, real_id: EntityId, depth: usize) -> Result<PublicNeighborhood, QueryError> {
        let view = self.ctx.expander().expand(real_id, depth)?;
        Ok(self.render_view(&view))
    }

    fn render_view(&self, view: &NeighborhoodView) -> PublicNeighborhood {
        let ids = &self.ctx.ids;

        let mut nodes = Vec::with_capacity(view.node_count());
        nodes.push(PublicNode {
            id: ids.render(view.center.id),
            role: NodeRole::Center,
            hop_distance: 0,
            risk_score: view.center.risk_score,
            flagged: view.center.flagged,
        });
        nodes.extend(view.neighbors.iter().map(|n| PublicNode {
            id: ids.render(n.id),
            role: NodeRole::Neighbor,
            hop_distance: n.hop_distance,
            risk_score: n.risk_score,
            flagged: n.flagged,
        }));

        let edges = view
            .edges
            .iter()
            .map(|e| PublicEdge {
                source: ids.render(e.source),
                target: ids.render(e.target),
                direction: e.direction,
            })
            .collect();

        PublicNeighborhood {
            center: ids.render(view.center.id),
            nodes,
            edges,
            max_depth: view.max_depth,
            query_time_ms: view.query_time_ms,
        }
    }

    /// Structured risk report for one entity.
    pub fn report(&self, public_id: &str) -> Result<RiskReport, QueryError> {
        let real = self.resolve(public_id)?;
        let record = self
            .ctx
            .risks
            .get(real)
            .ok_or_else(|| QueryError::not_found(format!("public id {}", public_id)))?;

        Ok(RiskReport {
            record: self.publish(record),
            risk_level: record.risk_level(),
            triggered_signal: classify(record),
            recommended_action: record.alert.clone(),
            generated_at: Utc::now(),
        })
    }

    pub fn stats(&self) -> DatasetStats {
        self.ctx.stats()
    }
}
