use drawcast_core::config::PatternConfig;
use drawcast_core::{DetectedPattern, HistoricalDraw, PatternType};

const MIN_VARIANCE: f64 = 1e-12;

/// Sample autocorrelation of `series` at `lag`.
///
/// `None` when the lag does not fit or the series has no variance.
pub fn autocorrelation(series: &[f64], lag: usize) -> Option<f64> {
    let n = series.len();
    if lag == 0 || lag >= n {
        return None;
    }
    let mean = series.iter().sum::<f64>() / n as f64;
    let denom: f64 = series.iter().map(|x| (x - mean).powi(2)).sum();
    if denom <= MIN_VARIANCE {
        return None;
    }
    let num: f64 = series
        .iter()
        .zip(&series[lag..])
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum();
    Some(num / denom)
}

/// Lag in `[min_lag, min(max_lag, len / 2))` with the highest autocorrelation.
///
/// Ties keep the shorter lag.
pub fn best_lag(series: &[f64], min_lag: usize, max_lag: usize) -> Option<(usize, f64)> {
    let upper = max_lag.min(series.len() / 2);
    let mut best: Option<(usize, f64)> = None;
    for lag in min_lag.max(1)..upper {
        let Some(r) = autocorrelation(series, lag) else {
            continue;
        };
        if best.map_or(true, |(_, b)| r > b) {
            best = Some((lag, r));
        }
    }
    best
}

/// Periodicity of draw sums.
///
/// Related candidates are the numbers of the draw one cycle back from the
/// end, the position the cycle would repeat next.
pub(super) fn detect(history: &[HistoricalDraw], config: &PatternConfig) -> Option<DetectedPattern> {
    let series: Vec<f64> = history.iter().map(|d| d.sum() as f64).collect();
    let (lag, r) = best_lag(&series, config.min_lag, config.max_lag)?;
    if r <= config.autocorrelation_threshold {
        return None;
    }

    let source = &history[history.len() - lag];
    Some(DetectedPattern {
        pattern_type: PatternType::Cycle,
        confidence: r.min(1.0),
        related_candidates: source.numbers.iter().copied().collect(),
        cycle_length: Some(lag),
        description: format!("draw sums repeat every {lag} draws (r = {r:.2})"),
    })
}
