//! ChainGuard Graph - Pseudonymised risk queries
//!
//! This crate owns the in-memory indexes built at startup and the service
//! that answers queries against them. Callers address entities by public
//! id only; real ids never leave the crate through a public-id query.
//!
//! # Architecture
//!
//! - `RiskIndex`: risk records keyed by real id, with a precomputed ranking
//! - `EdgeIndex`: the relationship graph (petgraph) over real ids
//! - `IdentifierMap`: keyed-hash bijection between real and public ids
//! - `NeighborhoodExpander`: depth-bounded BFS with direction tagging
//! - `QueryService`: lookup, batch, top-K, graph and report requests
//!
//! All of it is immutable once `DatasetBuilder::build` returns.
//!
//! # Example
//!
//! ```
//! use chainguard_core::RiskRecord;
//! use chainguard_graph::{DatasetBuilder, QueryService};
//! use std::sync::Arc;
//!
//! let mut builder = DatasetBuilder::new().with_salt("secret");
//! builder
//!     .add_record(RiskRecord::new(1, 12.0))
//!     .add_record(RiskRecord::new(2, 88.0))
//!     .add_edge(1, 2);
//! let service = QueryService::new(Arc::new(builder.build().unwrap()));
//!
//! let top = service.top_risky(1);
//! let view = service.graph(&top[0].public_id, 1).unwrap();
//! assert_eq!(view.nodes.len(), 2);
//! ```

mod builder;
mod context;
mod edge;
mod edge_index;
mod identifier;
mod neighborhood;
mod query;
mod risk_index;
mod service;

pub use builder::DatasetBuilder;
pub use context::{DatasetStats, RiskContext};
pub use edge::{ClassifiedEdge, EdgeDirection};
pub use edge_index::EdgeIndex;
pub use identifier::{pseudonymize, IdentifierMap, Salt};
pub use neighborhood::{ExpandedNode, NeighborhoodExpander, NeighborhoodView};
pub use query::{
    BatchResult, IdMode, NodeRole, PublicEdge, PublicNeighborhood, PublicNode, PublicRecord,
    RiskBreakdown, RiskReport,
};
pub use risk_index::RiskIndex;
pub use service::{QueryLimits, QueryService, DEFAULT_MAX_GRAPH_DEPTH};
