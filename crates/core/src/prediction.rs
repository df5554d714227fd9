use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::strategy::StrategyId;

/// Breakdown label recorded when every supplied weight was zero and the
/// combiner weighted strategies equally instead.
pub const EQUAL_WEIGHT_FALLBACK: &str = "equal_weight_fallback";

/// Final output of one prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPrediction {
    pub id: Uuid,
    pub domain_id: String,
    pub generated_at: DateTime<Utc>,
    /// `domain.count` candidates, ascending.
    pub candidates: Vec<u32>,
    /// `domain.bonus_count` bonus candidates, ascending; empty without a bonus pool.
    #[serde(default)]
    pub bonus_candidates: Vec<u32>,
    pub confidence: f64,
    /// (strategy, contribution to the selected candidates' combined score).
    pub strategy_breakdown: Vec<(String, f64)>,
}

impl CombinedPrediction {
    pub fn used_equal_weight_fallback(&self) -> bool {
        self.strategy_breakdown
            .iter()
            .any(|(label, _)| label == EQUAL_WEIGHT_FALLBACK)
    }

    pub fn contribution(&self, strategy: StrategyId) -> Option<f64> {
        self.strategy_breakdown
            .iter()
            .find(|(label, _)| label == strategy.as_str())
            .map(|(_, score)| *score)
    }
}
