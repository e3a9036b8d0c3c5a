//! Risk record data structures.
//!
//! A `RiskRecord` is one row of the precomputed fraud-risk dataset. The
//! scores inside it come from an offline model pipeline and are treated
//! as opaque inputs here; we only normalise them so nothing downstream
//! ever sees a non-finite value.

use serde::{Deserialize, Serialize};

/// Real (private) identifier of an entity in the dataset.
pub type EntityId = i64;

/// Alert text used when the dataset leaves the column empty.
pub const DEFAULT_ALERT: &str = "Review transaction";

/// Ground-truth label attached to an entity, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassLabel {
    Licit,
    Illicit,
    #[default]
    Unknown,
}

impl ClassLabel {
    /// Normalises a raw dataset cell.
    ///
    /// The dataset encodes illicit as `1` and licit as `2`; the words are
    /// accepted too. Everything else, including an empty cell, is unknown.
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        if value == "1" || value.eq_ignore_ascii_case("illicit") {
            ClassLabel::Illicit
        } else if value == "2" || value.eq_ignore_ascii_case("licit") {
            ClassLabel::Licit
        } else {
            ClassLabel::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassLabel::Licit => "licit",
            ClassLabel::Illicit => "illicit",
            ClassLabel::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse banding of `risk_score` used in reports and batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Bands a 0-100 risk score: 80+ critical, 60+ high, 40+ medium.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Critical
        } else if score >= 60.0 {
            RiskLevel::High
        } else if score >= 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entity's risk attributes, keyed by its real id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub id: EntityId,
    /// Tabular model fraud probability, 0..=1.
    pub fraud_prob: f64,
    /// Graph model fraud probability, 0..=1.
    pub gnn_fraud_prob: f64,
    /// Unit-normalised anomaly score; 0.0 when the dataset has none.
    pub anomaly_score: f64,
    /// Fused score, 0..=100.
    pub risk_score: f64,
    pub alert: String,
    pub class_label: ClassLabel,
}

impl RiskRecord {
    /// Creates a record with the given score and every other signal at rest.
    pub fn new(id: EntityId, risk_score: f64) -> Self {
        Self {
            id,
            fraud_prob: 0.0,
            gnn_fraud_prob: 0.0,
            anomaly_score: 0.0,
            risk_score: finite_or_default(risk_score),
            alert: DEFAULT_ALERT.to_string(),
            class_label: ClassLabel::Unknown,
        }
    }

    pub fn with_probabilities(mut self, fraud_prob: f64, gnn_fraud_prob: f64) -> Self {
        self.fraud_prob = finite_or_default(fraud_prob);
        self.gnn_fraud_prob = finite_or_default(gnn_fraud_prob);
        self
    }

    pub fn with_anomaly(mut self, anomaly_score: f64) -> Self {
        self.anomaly_score = finite_or_default(anomaly_score);
        self
    }

    pub fn with_alert(mut self, alert: impl Into<String>) -> Self {
        self.alert = alert.into();
        self
    }

    pub fn with_class(mut self, class_label: ClassLabel) -> Self {
        self.class_label = class_label;
        self
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

/// A directed relationship as it appears in the edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: EntityId,
    pub target: EntityId,
}

impl RawEdge {
    pub fn new(source: EntityId, target: EntityId) -> Self {
        Self { source, target }
    }
}

/// NaN and infinities become 0.0.
pub(crate) fn finite_or_default(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_label_parse() {
        assert_eq!(ClassLabel::parse("1"), ClassLabel::Illicit);
        assert_eq!(ClassLabel::parse("Illicit"), ClassLabel::Illicit);
        assert_eq!(ClassLabel::parse("2"), ClassLabel::Licit);
        assert_eq!(ClassLabel::parse(" licit "), ClassLabel::Licit);
        assert_eq!(ClassLabel::parse("unknown"), ClassLabel::Unknown);
        assert_eq!(ClassLabel::parse(""), ClassLabel::Unknown);
        assert_eq!(ClassLabel::parse("0"), ClassLabel::Unknown);
    }

    #[test]
    fn test_risk_level_from_score() {
        assert_eq!(RiskLevel::from_score(95.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(79.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(40.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(39.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
    }

    #[test]
    fn test_builders_normalise_non_finite() {
        let record = RiskRecord::new(7, f64::NAN)
            .with_probabilities(f64::INFINITY, 0.4)
            .with_anomaly(f64::NEG_INFINITY);

        assert_eq!(record.risk_score, 0.0);
        assert_eq!(record.fraud_prob, 0.0);
        assert_eq!(record.gnn_fraud_prob, 0.4);
        assert_eq!(record.anomaly_score, 0.0);
        assert_eq!(record.alert, DEFAULT_ALERT);
    }

    #[test]
    fn test_serialization_uses_wire_names() {
        let record = RiskRecord::new(1, 85.0).with_class(ClassLabel::Illicit);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["class_label"], "illicit");
        assert_eq!(
            serde_json::to_value(record.risk_level()).unwrap(),
            "CRITICAL"
        );
    }
}
