use drawcast_core::config::PatternConfig;
use drawcast_core::{DetectedPattern, Domain, HistoricalDraw, PatternType};

/// Longest run of consecutive integers in `numbers` as `(start, length)`.
///
/// Input need not be sorted. Duplicates are ignored. Ties keep the lowest run.
pub fn longest_run(numbers: &[u32]) -> (u32, usize) {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let Some(&first) = sorted.first() else {
        return (0, 0);
    };

    let (mut best_start, mut best_len) = (first, 1);
    let (mut start, mut len) = (first, 1);
    for pair in sorted.windows(2) {
        if pair[0].checked_add(1) == Some(pair[1]) {
            len += 1;
        } else {
            start = pair[1];
            len = 1;
        }
        if len > best_len {
            best_start = start;
            best_len = len;
        }
    }
    (best_start, best_len)
}

/// Longest consecutive run across all draws, if it reaches `min_run_length`.
///
/// Related candidates come from the first draw that achieves the maximum.
pub(super) fn detect(
    history: &[HistoricalDraw],
    domain: &Domain,
    config: &PatternConfig,
) -> Option<DetectedPattern> {
    let mut best: Option<(u32, usize)> = None;
    for draw in history {
        let (start, len) = longest_run(&draw.numbers);
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((start, len));
        }
    }

    let (start, len) = best?;
    if len < config.min_run_length {
        return None;
    }

    let confidence = if domain.count == 0 {
        0.0
    } else {
        (len as f64 / domain.count as f64).min(1.0)
    };
    let end = start + len as u32 - 1;

    Some(DetectedPattern {
        pattern_type: PatternType::Sequential,
        confidence,
        related_candidates: (start..=end).collect(),
        cycle_length: None,
        description: format!("run of {len} consecutive numbers ({start}..={end})"),
    })
}
