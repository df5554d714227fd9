use std::collections::BTreeMap;

use drawcast_core::{Domain, HistoricalDraw, SignalScoreMap, StrategyId};

use super::SignalGenerator;

/// Gap analysis over the most recent `window` draws.
///
/// A candidate last seen `i` draws ago (0 = latest draw) scores
/// `1 - i / window`; candidates absent from the window get `floor`.
/// This is a "due" heuristic, not a probability.
#[derive(Debug, Clone)]
pub struct RecencySignal {
    window: usize,
    floor: f64,
}

impl RecencySignal {
    pub fn new(window: usize, floor: f64) -> Self {
        Self {
            window: window.max(1),
            floor: floor.max(0.0),
        }
    }
}

impl Default for RecencySignal {
    fn default() -> Self {
        Self::new(20, 0.1)
    }
}

impl SignalGenerator for RecencySignal {
    fn strategy_id(&self) -> StrategyId {
        StrategyId::Recency
    }

    fn generate(&self, history: &[HistoricalDraw], domain: &Domain) -> SignalScoreMap {
        // candidate -> draws since it last appeared
        let mut last_seen: BTreeMap<u32, usize> = BTreeMap::new();
        for (gap, draw) in history.iter().rev().take(self.window).enumerate() {
            for &n in &draw.numbers {
                last_seen.entry(n).or_insert(gap);
            }
        }

        let w = self.window as f64;
        SignalScoreMap::from_scores(domain.candidates().map(|c| {
            let score = match last_seen.get(&c) {
                Some(&gap) => 1.0 - gap as f64 / w,
                None => self.floor,
            };
            (c, score)
        }))
    }
}
