//! Request handlers for protocol methods.
//!
//! Each handler implements one method of the ChainGuard protocol. They
//! only translate between wire types and `QueryService` calls.

use crate::protocol::{BatchParams, GraphParams, LookupParams, ReportParams, Response, TopParams};
use chainguard_graph::QueryService;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Service shared by every connection. The data behind it is immutable,
/// so no lock is needed.
pub type SharedService = Arc<QueryService>;

/// Handles the risk.info method.
pub fn handle_info(service: &QueryService, id: Option<Value>) -> Response {
    let stats = service.stats();

    #[derive(Serialize)]
    struct InfoResult {
        #[serde(rename = "recordCount")]
        record_count: usize,
        #[serde(rename = "edgeCount")]
        edge_count: usize,
        #[serde(rename = "graphNodeCount")]
        graph_node_count: usize,
        #[serde(rename = "flaggedCount")]
        flagged_count: usize,
        #[serde(rename = "maxGraphDepth")]
        max_graph_depth: usize,
        version: &'static str,
    }

    Response::success(
        id,
        InfoResult {
            record_count: stats.record_count,
            edge_count: stats.edge_count,
            graph_node_count: stats.graph_node_count,
            flagged_count: stats.flagged_count,
            max_graph_depth: service.limits().max_graph_depth,
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// Handles the risk.lookup method.
pub fn handle_lookup(service: &QueryService, id: Option<Value>, params: LookupParams) -> Response {
    debug!("Lookup: {}", params.id);

    match service.lookup(&params.id) {
        Ok(record) => Response::success(id, record),
        Err(e) => Response::from_query_error(id, e),
    }
}

/// Handles the risk.batch method.
pub fn handle_batch(service: &QueryService, id: Option<Value>, params: BatchParams) -> Response {
    debug!("Batch of {} ids ({:?})", params.ids.len(), params.mode);

    match service.batch_lookup(&params.ids, params.mode) {
        Ok(result) => Response::success(id, result),
        Err(e) => Response::from_query_error(id, e),
    }
}

/// Handles the risk.top method.
pub fn handle_top(service: &QueryService, id: Option<Value>, params: TopParams) -> Response {
    Response::success(id, service.top_risky(params.limit))
}

/// Handles the risk.graph method.
pub fn handle_graph(service: &QueryService, id: Option<Value>, params: GraphParams) -> Response {
    debug!("Graph: {} depth {}", params.id, params.depth);

    match service.graph(&params.id, params.depth) {
        Ok(view) => Response::success(id, view),
        Err(e) => Response::from_query_error(id, e),
    }
}

/// Handles the risk.report method.
pub fn handle_report(service: &QueryService, id: Option<Value>, params: ReportParams) -> Response {
    match service.report(&params.id) {
        Ok(report) => Response::success(id, report),
        Err(e) => Response::from_query_error(id, e),
    }
}
