//! ChainGuard Core - Risk records and the heuristics applied to them
//!
//! This crate holds everything that describes a single entity in the
//! precomputed fraud-risk dataset: the record itself, the tri-state class
//! label, risk-level banding, the priority-ordered flag heuristic and the
//! CSV readers that turn raw dataset files into typed rows.
//!
//! It knows nothing about identifiers being pseudonymised or about the
//! relationship graph; those live in `chainguard-graph`.
//!
//! # Example
//!
//! ```
//! use chainguard_core::{is_flagged, ClassLabel, RiskRecord};
//!
//! let record = RiskRecord::new(42, 91.0).with_class(ClassLabel::Unknown);
//! assert!(is_flagged(&record));
//! ```

pub mod error;
pub mod flag;
pub mod loader;
pub mod record;

pub use error::{ConfigError, QueryError};
pub use flag::{classify, is_flagged, FlagSignal, BLOCKING_ALERTS};
pub use loader::{
    load_edges, load_edges_file, load_risk_records, load_risk_records_file, read_batch_ids,
    LoadReport,
};
pub use record::{ClassLabel, EntityId, RawEdge, RiskLevel, RiskRecord, DEFAULT_ALERT};
