use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use drawcast_core::{Alert, PerformanceSample, StrategyId};

use super::StrategyState;

/// Mean metrics over a set of samples. All zero when the set is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub sample_count: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl AggregateMetrics {
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a PerformanceSample>) -> Self {
        let mut m = AggregateMetrics::default();
        for s in samples {
            m.sample_count += 1;
            m.accuracy += s.accuracy;
            m.precision += s.precision;
            m.recall += s.recall;
            m.f1 += s.f1;
        }
        if m.sample_count > 0 {
            let n = m.sample_count as f64;
            m.accuracy /= n;
            m.precision /= n;
            m.recall /= n;
            m.f1 /= n;
        }
        m
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyHealth {
    pub strategy_id: StrategyId,
    pub state: StrategyState,
    pub rolling_accuracy: Option<f64>,
    pub buffered_samples: usize,
}

/// Per-strategy states plus an overall verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub strategies: Vec<StrategyHealth>,
    pub worst_state: StrategyState,
    /// False while any strategy is CRITICAL.
    pub healthy: bool,
}

/// Point-in-time copy of everything the tracker holds.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSnapshot {
    pub samples: Vec<PerformanceSample>,
    pub alerts: Vec<Alert>,
    pub states: BTreeMap<StrategyId, StrategyState>,
}
