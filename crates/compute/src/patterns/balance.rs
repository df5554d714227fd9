use drawcast_core::config::PatternConfig;
use drawcast_core::{DetectedPattern, Domain, HistoricalDraw, PatternType};

struct Balance {
    /// Mean over draws of first-class count / max(second-class count, 1).
    mean_ratio: f64,
    first_total: usize,
    second_total: usize,
}

fn measure(history: &[HistoricalDraw], is_first: impl Fn(u32) -> bool) -> Balance {
    let (mut ratio_sum, mut first_total, mut second_total) = (0.0, 0, 0);
    for draw in history {
        let first = draw.numbers.iter().filter(|&&n| is_first(n)).count();
        let second = draw.numbers.len() - first;
        ratio_sum += first as f64 / second.max(1) as f64;
        first_total += first;
        second_total += second;
    }
    Balance {
        mean_ratio: if history.is_empty() {
            0.0
        } else {
            ratio_sum / history.len() as f64
        },
        first_total,
        second_total,
    }
}

/// 1.0 for a perfectly balanced history, falling linearly as the mean ratio
/// drifts from 1.
fn balance_confidence(mean_ratio: f64) -> f64 {
    (1.0 - (mean_ratio - 1.0).abs() / 2.0).clamp(0.0, 1.0)
}

fn detect_balance(
    history: &[HistoricalDraw],
    domain: &Domain,
    config: &PatternConfig,
    pattern_type: PatternType,
    is_first: impl Fn(u32) -> bool,
    labels: (&str, &str),
) -> Option<DetectedPattern> {
    if history.is_empty() {
        return None;
    }
    let balance = measure(history, &is_first);
    let confidence = balance_confidence(balance.mean_ratio);
    if confidence < config.balance_confidence_floor {
        return None;
    }

    // Related candidates are the class drawn more often overall.
    let first_favoured = balance.first_total >= balance.second_total;
    let favoured = if first_favoured { labels.0 } else { labels.1 };
    let related = domain
        .candidates()
        .filter(|&c| is_first(c) == first_favoured)
        .collect();

    Some(DetectedPattern {
        pattern_type,
        confidence,
        related_candidates: related,
        cycle_length: None,
        description: format!(
            "{}/{} ratio averages {:.2}, {favoured} numbers favoured",
            labels.0, labels.1, balance.mean_ratio
        ),
    })
}

pub(super) fn detect_parity(
    history: &[HistoricalDraw],
    domain: &Domain,
    config: &PatternConfig,
) -> Option<DetectedPattern> {
    detect_balance(
        history,
        domain,
        config,
        PatternType::Parity,
        |n| n % 2 == 1,
        ("odd", "even"),
    )
}

pub(super) fn detect_range_split(
    history: &[HistoricalDraw],
    domain: &Domain,
    config: &PatternConfig,
) -> Option<DetectedPattern> {
    let mid = domain.midpoint();
    detect_balance(
        history,
        domain,
        config,
        PatternType::RangeSplit,
        move |n| n <= mid,
        ("low", "high"),
    )
}
