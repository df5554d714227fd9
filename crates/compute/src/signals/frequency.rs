use std::collections::BTreeMap;

use drawcast_core::{Domain, HistoricalDraw, SignalScoreMap, StrategyId};

use super::SignalGenerator;

/// Appearance count of each candidate divided by the highest count.
///
/// The most frequent candidate always scores exactly 1.0. An empty history
/// yields an all-zero map, which downstream code treats as "no signal".
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencySignal;

impl SignalGenerator for FrequencySignal {
    fn strategy_id(&self) -> StrategyId {
        StrategyId::Frequency
    }

    fn generate(&self, history: &[HistoricalDraw], domain: &Domain) -> SignalScoreMap {
        let mut counts: BTreeMap<u32, u64> = domain.candidates().map(|c| (c, 0)).collect();
        for draw in history {
            for n in &draw.numbers {
                if let Some(count) = counts.get_mut(n) {
                    *count += 1;
                }
            }
        }

        let max = counts.values().copied().max().unwrap_or(0);
        if max == 0 {
            return SignalScoreMap::zeros(domain);
        }

        SignalScoreMap::from_scores(
            counts
                .into_iter()
                .map(|(c, count)| (c, count as f64 / max as f64)),
        )
    }
}
