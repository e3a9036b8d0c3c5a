//! In-memory risk table keyed by real id.
//!
//! The ranking used by `top_k` is computed once at construction:
//! `risk_score` descending, ties broken by ascending id.

use chainguard_core::{EntityId, RiskRecord};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct RiskIndex {
    records: HashMap<EntityId, RiskRecord>,
    /// Ids in rank order.
    ranked: Vec<EntityId>,
}

impl RiskIndex {
    /// Builds the index. If an id repeats, its first record is kept.
    pub fn from_records(records: impl IntoIterator<Item = RiskRecord>) -> Self {
        let mut map: HashMap<EntityId, RiskRecord> = HashMap::new();
        for record in records {
            map.entry(record.id).or_insert(record);
        }

        let mut ranked: Vec<EntityId> = map.keys().copied().collect();
        ranked.sort_by(|a, b| {
            let (ra, rb) = (&map[a], &map[b]);
            rb.risk_score
                .total_cmp(&ra.risk_score)
                .then_with(|| a.cmp(b))
        });

        Self {
            records: map,
            ranked,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&RiskRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    /// Risk score of `id`, or 0.0 when the id has no record.
    pub fn risk_score_of(&self, id: EntityId) -> f64 {
        self.get(id).map(|r| r.risk_score).unwrap_or(0.0)
    }

    /// Looks up several ids at once.
    ///
    /// The input is deduplicated keeping first occurrences, and ids with no
    /// record are dropped without error.
    pub fn get_batch(&self, ids: &[EntityId]) -> Vec<&RiskRecord> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// The `k` highest-risk records in rank order.
    pub fn top_k(&self, k: usize) -> Vec<&RiskRecord> {
        self.ranked
            .iter()
            .take(k)
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Iterates over every record in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &RiskRecord> + '_ {
        self.ranked.iter().filter_map(|id| self.records.get(id))
    }

    /// Iterates over every id in rank order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ranked.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(scores: &[(EntityId, f64)]) -> RiskIndex {
        RiskIndex::from_records(scores.iter().map(|&(id, s)| RiskRecord::new(id, s)))
    }

    fn ids(records: Vec<&RiskRecord>) -> Vec<EntityId> {
        records.into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_get_and_missing() {
        let idx = index(&[(1, 10.0), (2, 20.0)]);
        assert_eq!(idx.get(2).unwrap().risk_score, 20.0);
        assert!(idx.get(3).is_none());
        assert_eq!(idx.risk_score_of(3), 0.0);
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn test_first_record_wins() {
        let idx = RiskIndex::from_records(vec![RiskRecord::new(1, 10.0), RiskRecord::new(1, 99.0)]);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.get(1).unwrap().risk_score, 10.0);
    }

    #[test]
    fn test_batch_dedup_preserves_first_occurrence() {
        let idx = index(&[(3, 30.0), (5, 50.0)]);
        let found = idx.get_batch(&[5, 3, 5, 9, 3]);
        assert_eq!(ids(found), vec![5, 3]);
    }

    #[test]
    fn test_batch_empty_input() {
        let idx = index(&[(3, 30.0)]);
        assert!(idx.get_batch(&[]).is_empty());
        assert!(idx.get_batch(&[7, 8]).is_empty());
    }

    #[test]
    fn test_top_k_breaks_ties_by_ascending_id() {
        let idx = index(&[(1, 10.0), (2, 90.0), (3, 90.0), (4, 50.0)]);
        assert_eq!(ids(idx.top_k(2)), vec![2, 3]);
        assert_eq!(ids(idx.top_k(10)), vec![2, 3, 4, 1]);
        assert!(idx.top_k(0).is_empty());
    }

    #[test]
    fn test_top_k_is_insertion_order_independent() {
        let a = index(&[(3, 90.0), (2, 90.0), (1, 90.0)]);
        let b = index(&[(1, 90.0), (2, 90.0), (3, 90.0)]);
        assert_eq!(ids(a.top_k(3)), ids(b.top_k(3)));
        assert_eq!(ids(a.top_k(3)), vec![1, 2, 3]);
    }
}
