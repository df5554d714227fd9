use std::sync::Arc;

use drawcast_core::AlertSeverity;

use super::*;

fn sample_at(strategy: StrategyId, accuracy: f64, timestamp: DateTime<Utc>) -> PerformanceSample {
    PerformanceSample {
        strategy_id: strategy,
        domain_instance_id: "pick5:test".to_string(),
        accuracy,
        precision: accuracy,
        recall: accuracy,
        f1: accuracy,
        timestamp,
    }
}

fn sample(strategy: StrategyId, accuracy: f64) -> PerformanceSample {
    sample_at(strategy, accuracy, Utc::now())
}

fn tracker_with(sample_capacity: usize, alert_capacity: usize) -> PerformanceTracker {
    PerformanceTracker::new(TrackerConfig {
        sample_capacity,
        alert_capacity,
        ..TrackerConfig::default()
    })
}

#[test]
fn untracked_until_first_sample() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    assert_eq!(tracker.state(StrategyId::Recency).unwrap(), StrategyState::Untracked);
    assert_eq!(tracker.rolling_accuracy(StrategyId::Recency).unwrap(), None);

    let alert = tracker.record_sample(sample(StrategyId::Recency, 0.9)).unwrap();
    assert!(alert.is_none());
    assert_eq!(tracker.state(StrategyId::Recency).unwrap(), StrategyState::Active);
}

#[test]
fn sample_buffer_evicts_oldest() {
    let tracker = tracker_with(5, 10);
    for i in 0..6 {
        let s = PerformanceSample {
            domain_instance_id: format!("draw-{i}"),
            ..sample(StrategyId::Frequency, 0.7)
        };
        tracker.record_sample(s).unwrap();
    }

    let snapshot = tracker.snapshot().unwrap();
    assert_eq!(snapshot.samples.len(), 5);
    assert_eq!(snapshot.samples[0].domain_instance_id, "draw-1");
    assert_eq!(snapshot.samples[4].domain_instance_id, "draw-5");
}

#[test]
fn alert_buffer_evicts_oldest() {
    let tracker = tracker_with(10, 2);
    for i in 0..3 {
        tracker.raise_alert(Alert::info(None, format!("alert {i}"))).unwrap();
    }
    let alerts = tracker.alerts().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].message, "alert 1");
    assert_eq!(alerts[1].message, "alert 2");
}

#[test]
fn falling_accuracy_walks_down_the_states() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    for _ in 0..10 {
        tracker.record_sample(sample(StrategyId::Frequency, 0.8)).unwrap();
    }
    assert_eq!(tracker.state(StrategyId::Frequency).unwrap(), StrategyState::Active);

    let alerts = tracker
        .record_samples((0..10).map(|_| sample(StrategyId::Frequency, 0.1)))
        .unwrap();
    let severities: Vec<AlertSeverity> = alerts.iter().map(|a| a.severity).collect();
    assert_eq!(severities, vec![AlertSeverity::Warning, AlertSeverity::Error]);
    assert!(alerts.iter().all(|a| a.subject_strategy_id == Some(StrategyId::Frequency)));

    assert_eq!(tracker.state(StrategyId::Frequency).unwrap(), StrategyState::Critical);
    let rolling = tracker.rolling_accuracy(StrategyId::Frequency).unwrap().unwrap();
    assert!((rolling - 0.1).abs() < 1e-12);
    assert_eq!(tracker.alerts().unwrap().len(), 2);
}

#[test]
fn recovery_raises_info() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    tracker.record_sample(sample(StrategyId::Stochastic, 0.1)).unwrap();
    assert_eq!(tracker.state(StrategyId::Stochastic).unwrap(), StrategyState::Critical);

    let alerts = tracker
        .record_samples((0..10).map(|_| sample(StrategyId::Stochastic, 0.9)))
        .unwrap();
    assert_eq!(alerts.last().unwrap().severity, AlertSeverity::Info);
    assert_eq!(tracker.state(StrategyId::Stochastic).unwrap(), StrategyState::Active);
}

#[test]
fn strategies_are_evaluated_independently() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    tracker.record_sample(sample(StrategyId::Frequency, 0.9)).unwrap();
    tracker.record_sample(sample(StrategyId::Recency, 0.1)).unwrap();

    assert_eq!(tracker.state(StrategyId::Frequency).unwrap(), StrategyState::Active);
    assert_eq!(tracker.state(StrategyId::Recency).unwrap(), StrategyState::Critical);

    let accuracies = tracker.rolling_accuracies().unwrap();
    assert_eq!(accuracies.len(), 2);
    assert_eq!(accuracies[&StrategyId::Frequency], 0.9);
}

#[test]
fn out_of_range_sample_is_rejected() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    let err = tracker
        .record_sample(sample(StrategyId::Frequency, 1.5))
        .unwrap_err();
    assert!(matches!(err, MonitorError::InvalidSample { .. }));
    assert!(tracker
        .record_sample(sample(StrategyId::Frequency, f64::NAN))
        .is_err());
    assert_eq!(tracker.sample_count().unwrap(), 0);
}

#[test]
fn aggregate_respects_the_window() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    let now = Utc::now();
    tracker
        .record_sample(sample_at(StrategyId::Frequency, 0.2, now - Duration::hours(1)))
        .unwrap();
    tracker
        .record_sample(sample_at(StrategyId::Recency, 0.6, now - Duration::hours(5)))
        .unwrap();
    tracker
        .record_sample(sample_at(StrategyId::Frequency, 1.0, now - Duration::hours(30)))
        .unwrap();

    let day = tracker.aggregate_at(now, 24.0, None).unwrap();
    assert_eq!(day.sample_count, 2);
    assert!((day.accuracy - 0.4).abs() < 1e-12);

    let freq = tracker
        .aggregate_at(now, 48.0, Some(StrategyId::Frequency))
        .unwrap();
    assert_eq!(freq.sample_count, 2);
    assert!((freq.accuracy - 0.6).abs() < 1e-12);

    let all = tracker.aggregate_at(now, f64::INFINITY, None).unwrap();
    assert_eq!(all.sample_count, 3);
}

#[test]
fn aggregate_of_nothing_is_zero() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    assert_eq!(tracker.aggregate(24.0).unwrap(), AggregateMetrics::default());
    assert!(tracker.aggregate_by_strategy(24.0).unwrap().is_empty());
}

#[test]
fn samples_since_filters_strictly() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    let now = Utc::now();
    tracker
        .record_sample(sample_at(StrategyId::Frequency, 0.5, now - Duration::hours(2)))
        .unwrap();
    tracker
        .record_sample(sample_at(StrategyId::Frequency, 0.5, now))
        .unwrap();

    assert_eq!(tracker.samples_since(None).unwrap().len(), 2);
    assert_eq!(tracker.samples_since(Some(now - Duration::hours(1))).unwrap().len(), 1);
    assert!(tracker.samples_since(Some(now)).unwrap().is_empty());
}

#[test]
fn health_reports_the_worst_state() {
    let tracker = PerformanceTracker::new(TrackerConfig::default());
    let report = tracker.health().unwrap();
    assert!(report.healthy);
    assert_eq!(report.worst_state, StrategyState::Untracked);
    assert_eq!(report.strategies.len(), 4);

    tracker.record_sample(sample(StrategyId::Frequency, 0.9)).unwrap();
    tracker.record_sample(sample(StrategyId::Recency, 0.05)).unwrap();
    let report = tracker.health().unwrap();
    assert!(!report.healthy);
    assert_eq!(report.worst_state, StrategyState::Critical);

    let recency = report
        .strategies
        .iter()
        .find(|s| s.strategy_id == StrategyId::Recency)
        .unwrap();
    assert_eq!(recency.buffered_samples, 1);
    assert_eq!(recency.rolling_accuracy, Some(0.05));
}

#[test]
fn concurrent_recording_keeps_every_sample() {
    let tracker = Arc::new(tracker_with(10_000, 100));
    let handles: Vec<_> = StrategyId::ALL
        .into_iter()
        .map(|id| {
            let tracker = Arc::clone(&tracker);
            std::thread::spawn(move || {
                for _ in 0..250 {
                    tracker.record_sample(sample(id, 0.7)).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(tracker.sample_count().unwrap(), 1000);
    for id in StrategyId::ALL {
        assert_eq!(tracker.state(id).unwrap(), StrategyState::Active);
    }
}
