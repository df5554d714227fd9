use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;

/// Per-candidate non-negative score produced by one signal generator.
///
/// Built once and never mutated; generators produce a fresh map per call.
/// Negative and non-finite inputs are stored as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalScoreMap(BTreeMap<u32, f64>);

impl SignalScoreMap {
    pub fn from_scores(scores: impl IntoIterator<Item = (u32, f64)>) -> Self {
        Self(
            scores
                .into_iter()
                .map(|(c, s)| (c, if s.is_finite() && s > 0.0 { s } else { 0.0 }))
                .collect(),
        )
    }

    /// Every candidate of the domain at 0 ("no signal").
    pub fn zeros(domain: &Domain) -> Self {
        Self(domain.candidates().map(|c| (c, 0.0)).collect())
    }

    /// Score of a candidate, 0 when absent.
    pub fn get(&self, candidate: u32) -> f64 {
        self.0.get(&candidate).copied().unwrap_or(0.0)
    }

    pub fn max_score(&self) -> f64 {
        self.0.values().copied().fold(0.0, f64::max)
    }

    /// An all-zero map carries no signal and must not be divided by its max.
    pub fn is_all_zero(&self) -> bool {
        self.max_score() <= 0.0
    }

    /// Score divided by this map's own maximum, so maps on different scales compare.
    pub fn normalized(&self, candidate: u32) -> f64 {
        let max = self.max_score();
        if max <= 0.0 {
            return 0.0;
        }
        self.get(candidate) / max
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.0.iter().map(|(&c, &s)| (c, s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `k` highest-scoring candidates in rank order.
    pub fn top_k(&self, k: usize) -> Vec<u32> {
        rank_descending(self.iter()).into_iter().take(k).collect()
    }
}

/// Sort candidates by score descending, ties broken by ascending candidate.
pub fn rank_descending(scores: impl IntoIterator<Item = (u32, f64)>) -> Vec<u32> {
    let mut pairs: Vec<(u32, f64)> = scores.into_iter().collect();
    pairs.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    pairs.into_iter().map(|(c, _)| c).collect()
}
