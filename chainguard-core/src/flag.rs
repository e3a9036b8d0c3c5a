//! Priority-ordered flag heuristic.
//!
//! A record is flagged as soon as one signal fires, checked in a fixed
//! order. An explicit illicit label outranks every score-based signal, and
//! later signals are never evaluated once an earlier one has fired. Reordering
//! the checks changes outcomes on records whose signals disagree.

use crate::record::{ClassLabel, RiskRecord};
use serde::{Deserialize, Serialize};

/// Risk score at or above which a record is flagged.
pub const RISK_SCORE_THRESHOLD: f64 = 80.0;

/// Model probability at or above which a record is flagged.
pub const PROBABILITY_THRESHOLD: f64 = 0.9;

/// Alert texts that flag a record. Matched exactly, case-sensitive.
pub const BLOCKING_ALERTS: [&str; 3] = ["CRITICAL", "Block Transaction", "High Risk"];

/// The signal that caused a record to be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSignal {
    /// Dataset labels the entity illicit.
    IllicitLabel,
    /// `risk_score >= 80`.
    HighRiskScore,
    /// Alert text is one of [`BLOCKING_ALERTS`].
    BlockingAlert,
    /// Either model probability is `>= 0.9`.
    HighModelProbability,
}

impl FlagSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagSignal::IllicitLabel => "illicit_label",
            FlagSignal::HighRiskScore => "high_risk_score",
            FlagSignal::BlockingAlert => "blocking_alert",
            FlagSignal::HighModelProbability => "high_model_probability",
        }
    }
}

impl std::fmt::Display for FlagSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the first signal that fires for `record`, if any.
pub fn classify(record: &RiskRecord) -> Option<FlagSignal> {
    if record.class_label == ClassLabel::Illicit {
        return Some(FlagSignal::IllicitLabel);
    }
    if record.risk_score >= RISK_SCORE_THRESHOLD {
        return Some(FlagSignal::HighRiskScore);
    }
    if BLOCKING_ALERTS.contains(&record.alert.as_str()) {
        return Some(FlagSignal::BlockingAlert);
    }
    if record.fraud_prob >= PROBABILITY_THRESHOLD || record.gnn_fraud_prob >= PROBABILITY_THRESHOLD
    {
        return Some(FlagSignal::HighModelProbability);
    }
    None
}

pub fn is_flagged(record: &RiskRecord) -> bool {
    classify(record).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illicit_label_wins_over_low_score() {
        let record = RiskRecord::new(1, 10.0).with_class(ClassLabel::Illicit);
        assert_eq!(classify(&record), Some(FlagSignal::IllicitLabel));
    }

    #[test]
    fn test_high_risk_score() {
        let record = RiskRecord::new(2, 85.0)
            .with_class(ClassLabel::Unknown)
            .with_alert("Low Risk");
        assert_eq!(classify(&record), Some(FlagSignal::HighRiskScore));
    }

    #[test]
    fn test_blocking_alert() {
        let record = RiskRecord::new(3, 10.0).with_alert("CRITICAL");
        assert_eq!(classify(&record), Some(FlagSignal::BlockingAlert));

        let record = RiskRecord::new(3, 10.0).with_alert("Block Transaction");
        assert!(is_flagged(&record));
    }

    #[test]
    fn test_blocking_alert_is_case_sensitive() {
        let record = RiskRecord::new(4, 10.0).with_alert("critical");
        assert!(!is_flagged(&record));

        let record = RiskRecord::new(4, 10.0).with_alert("high risk");
        assert!(!is_flagged(&record));
    }

    #[test]
    fn test_model_probability() {
        let record = RiskRecord::new(5, 10.0)
            .with_alert("Low Risk")
            .with_probabilities(0.95, 0.1);
        assert_eq!(classify(&record), Some(FlagSignal::HighModelProbability));

        let record = RiskRecord::new(5, 10.0)
            .with_alert("Low Risk")
            .with_probabilities(0.1, 0.9);
        assert_eq!(classify(&record), Some(FlagSignal::HighModelProbability));
    }

    #[test]
    fn test_nothing_fires() {
        let record = RiskRecord::new(6, 79.9)
            .with_class(ClassLabel::Licit)
            .with_alert("Low Risk")
            .with_probabilities(0.89, 0.89);
        assert_eq!(classify(&record), None);
        assert!(!is_flagged(&record));
    }

    #[test]
    fn test_earlier_signal_reported_when_several_fire() {
        let record = RiskRecord::new(7, 99.0)
            .with_class(ClassLabel::Illicit)
            .with_alert("CRITICAL")
            .with_probabilities(0.99, 0.99);
        assert_eq!(classify(&record), Some(FlagSignal::IllicitLabel));

        let record = RiskRecord::new(7, 99.0)
            .with_alert("CRITICAL")
            .with_probabilities(0.99, 0.99);
        assert_eq!(classify(&record), Some(FlagSignal::HighRiskScore));
    }
}
