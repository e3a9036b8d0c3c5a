//! Response payloads handed to the transport layer.
//!
//! Every type here is addressed by public id only. None of them has a
//! field that could carry a real id.

use crate::edge::EdgeDirection;
use chainguard_core::{is_flagged, ClassLabel, FlagSignal, RiskLevel, RiskRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A risk record with its real id replaced by the public id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicRecord {
    pub public_id: String,
    pub fraud_prob: f64,
    pub gnn_fraud_prob: f64,
    pub anomaly_score: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub alert: String,
    pub class_label: ClassLabel,
    pub flagged: bool,
}

impl PublicRecord {
    pub fn new(record: &RiskRecord, public_id: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            fraud_prob: record.fraud_prob,
            gnn_fraud_prob: record.gnn_fraud_prob,
            anomaly_score: record.anomaly_score,
            risk_score: record.risk_score,
            risk_level: record.risk_level(),
            alert: record.alert.clone(),
            class_label: record.class_label,
            flagged: is_flagged(record),
        }
    }
}

/// How batch identifiers should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
    /// Identifiers are public ids.
    #[default]
    Public,
    /// Identifiers are real ids. For trusted offline tooling only.
    Real,
}

impl IdMode {
    /// Column a batch CSV must carry for this mode.
    pub fn batch_column(&self) -> &'static str {
        match self {
            IdMode::Public => "secure_id",
            IdMode::Real => "txId",
        }
    }
}

/// Risk-score buckets over a set of records: high is 60 and up, medium 40
/// up to 60, low below 40.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskBreakdown {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PublicRecord>) -> Self {
        let mut breakdown = Self::default();
        for record in records {
            if record.risk_score >= 60.0 {
                breakdown.high += 1;
            } else if record.risk_score >= 40.0 {
                breakdown.medium += 1;
            } else {
                breakdown.low += 1;
            }
        }
        breakdown
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub total_requested: usize,
    pub found: usize,
    pub results: Vec<PublicRecord>,
    pub breakdown: RiskBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Center,
    Neighbor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicNode {
    pub id: String,
    pub role: NodeRole,
    pub hop_distance: usize,
    pub risk_score: f64,
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicEdge {
    pub source: String,
    pub target: String,
    pub direction: EdgeDirection,
}

/// A neighborhood view rendered in public ids. The center is the first
/// node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicNeighborhood {
    pub center: String,
    pub nodes: Vec<PublicNode>,
    pub edges: Vec<PublicEdge>,
    pub max_depth: usize,
    pub query_time_ms: u64,
}

/// Per-entity summary, the structured form of a printed risk report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub record: PublicRecord,
    pub risk_level: RiskLevel,
    /// First flag signal that fired, if any.
    pub triggered_signal: Option<FlagSignal>,
    pub recommended_action: String,
    pub generated_at: DateTime<Utc>,
}
