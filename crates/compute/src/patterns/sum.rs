use std::collections::{BTreeMap, BTreeSet};

use drawcast_core::config::PatternConfig;
use drawcast_core::{DetectedPattern, HistoricalDraw, PatternType};

/// The modal draw sum, if it recurs often enough.
///
/// Requires at least `min_sum_repeats` occurrences and strictly more than
/// `sum_mode_fraction` of all draws. Ties go to the smaller sum.
pub(super) fn detect(history: &[HistoricalDraw], config: &PatternConfig) -> Option<DetectedPattern> {
    let mut histogram: BTreeMap<u64, usize> = BTreeMap::new();
    for draw in history {
        *histogram.entry(draw.sum()).or_default() += 1;
    }

    let mut mode: Option<(u64, usize)> = None;
    for (&sum, &freq) in &histogram {
        if mode.map_or(true, |(_, best)| freq > best) {
            mode = Some((sum, freq));
        }
    }
    let (sum, freq) = mode?;

    let total = history.len() as f64;
    if freq < config.min_sum_repeats || freq as f64 <= config.sum_mode_fraction * total {
        return None;
    }

    let related: BTreeSet<u32> = history
        .iter()
        .filter(|d| d.sum() == sum)
        .flat_map(|d| d.numbers.iter().copied())
        .collect();

    Some(DetectedPattern {
        pattern_type: PatternType::Sum,
        confidence: freq as f64 / total,
        related_candidates: related,
        cycle_length: None,
        description: format!("sum {sum} in {freq} of {} draws", history.len()),
    })
}
