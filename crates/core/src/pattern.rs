use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Kind of structural regularity found in a draw history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    /// Runs of consecutive integers inside single draws.
    Sequential,
    /// A draw sum that recurs more often than chance.
    Sum,
    /// Odd/even balance.
    Parity,
    /// Low/high half balance.
    RangeSplit,
    /// Periodicity of draw sums found by autocorrelation.
    Cycle,
}

/// A pattern found by one detection pass. Not persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub pattern_type: PatternType,
    pub confidence: f64,
    pub related_candidates: BTreeSet<u32>,
    /// Lag in draws, only for [`PatternType::Cycle`].
    pub cycle_length: Option<usize>,
    pub description: String,
}
