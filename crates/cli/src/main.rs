mod cli;
mod files;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use drawcast_compute::pipeline::backtest::DEFAULT_HISTORY_LIMIT;
use drawcast_compute::{
    default_generators, BacktestOutcomes, EntropySource, FixedSeed, PatternDetector, Predictor,
    RandomSource,
};
use drawcast_core::{
    Domain, EngineConfig, EngineConfigDocument, HistoricalDraw, HistoryProvider, OutcomeProvider,
    PredictionSink,
};
use drawcast_monitor::{
    log_alert, AlertDispatcher, PerformanceTracker, ReweightingLoop, SharedWeights,
};

use crate::cli::{CliArgs, Command, HistoryArgs};
use crate::files::{JsonHistoryFile, JsonOutcomeFile, JsonlSink};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args.config)?;

    match args.command {
        Command::Predict {
            source,
            seed,
            store,
        } => {
            let domain = config.domain(&source.domain)?.clone();
            let history = load_history(&source, &domain).await?;
            let predictor = Predictor::new(&domain, &config, random_source(seed))?;
            let report = predictor
                .predict(&history, &config.initial_weights)
                .context("prediction failed")?;

            if let Some(path) = store {
                let sink = JsonlSink::new("predictions", path);
                if let Err(e) = PredictionSink::store(&sink, &report.prediction).await {
                    warn!(error = %e, "failed to store prediction");
                }
            }
            print_json(&report)
        }

        Command::Detect { source } => {
            let domain = config.domain(&source.domain)?.clone();
            let history = load_history(&source, &domain).await?;
            let patterns = PatternDetector::new(&domain, config.patterns.clone()).detect(&history);
            info!(patterns = patterns.len(), "pattern detection complete");
            print_json(&patterns)
        }

        Command::Backtest {
            source,
            depth,
            seed,
        } => {
            let domain = config.domain(&source.domain)?.clone();
            let depth = depth.unwrap_or(config.reweighting.backtest_depth);
            let outcomes = backtest_outcomes(&source, &domain, &config, seed, depth);
            let samples = outcomes
                .get_outcomes(None)
                .await
                .context("backtest replay failed")?;

            let tracker = PerformanceTracker::new(config.tracker.clone());
            for alert in tracker.record_samples(samples)? {
                log_alert(&alert);
            }
            print_json(&tracker.health()?)
        }

        Command::Run {
            source,
            outcomes,
            alerts_log,
            once,
            seed,
        } => {
            let domain = config.domain(&source.domain)?.clone();
            let provider: Arc<dyn OutcomeProvider> = match outcomes {
                Some(path) => Arc::new(JsonOutcomeFile::new(path)),
                None => Arc::new(backtest_outcomes(
                    &source,
                    &domain,
                    &config,
                    seed,
                    config.reweighting.backtest_depth,
                )),
            };

            let mut dispatcher = AlertDispatcher::empty();
            if let Some(path) = alerts_log {
                dispatcher.add_sink(Arc::new(JsonlSink::new("alerts", path)));
            }

            let tracker = Arc::new(PerformanceTracker::new(config.tracker.clone()));
            let weights = SharedWeights::new(config.initial_weights.clone());
            let mut reweighting = ReweightingLoop::new(
                config.reweighting.clone(),
                tracker.clone(),
                weights.clone(),
                provider,
            )
            .with_dispatcher(dispatcher);

            if once {
                let report = reweighting.run_guarded().await;
                return match report {
                    Some(report) => print_json(&report),
                    None => anyhow::bail!("reweighting cycle failed; see alerts"),
                };
            }

            info!(
                domain = %domain.id,
                interval_secs = config.reweighting.interval_seconds,
                "reweighting loop started"
            );
            let handle = reweighting.spawn();
            shutdown_signal().await;
            info!("shutdown requested");

            let metrics = handle.metrics()?;
            handle.shutdown().await?;
            info!(
                cycles = metrics.cycles_total(),
                failed = metrics.cycles_failed,
                "reweighting loop stopped"
            );
            print_json(&weights.snapshot()?)
        }
    }
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let document = EngineConfigDocument::from_yaml_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    let config = document.compile().context("invalid engine configuration")?;
    info!(
        path = %path.display(),
        id = %document.metadata.id,
        domains = config.domains.len(),
        "loaded engine config"
    );
    Ok(config)
}

async fn load_history(source: &HistoryArgs, domain: &Domain) -> Result<Vec<HistoricalDraw>> {
    let history = JsonHistoryFile::new(&source.history)
        .get_history(&domain.id, DEFAULT_HISTORY_LIMIT)
        .await
        .with_context(|| format!("failed to load history {}", source.history.display()))?;
    info!(domain = %domain.id, draws = history.len(), "history loaded");
    Ok(history)
}

fn random_source(seed: Option<u64>) -> Arc<dyn RandomSource> {
    match seed {
        Some(seed) => Arc::new(FixedSeed(seed)),
        None => Arc::new(EntropySource),
    }
}

fn backtest_outcomes(
    source: &HistoryArgs,
    domain: &Domain,
    config: &EngineConfig,
    seed: Option<u64>,
    depth: usize,
) -> BacktestOutcomes {
    let history: Arc<dyn HistoryProvider> = Arc::new(JsonHistoryFile::new(&source.history));
    BacktestOutcomes::new(
        history,
        domain,
        default_generators(config, random_source(seed)),
        depth,
    )
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{Duration, TimeZone, Utc};
    use drawcast_monitor::CycleOutcome;

    use super::*;

    fn reference_config() -> EngineConfig {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/drawcast.yml");
        load_config(&path).unwrap()
    }

    fn write_history(dir: &tempfile::TempDir, draws: usize) -> PathBuf {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let history: Vec<HistoricalDraw> = (0..draws)
            .map(|i| {
                let base = (i as u32 * 7) % 38;
                HistoricalDraw::new(
                    start + Duration::days(i as i64),
                    (0..6).map(|k| base + k * 2 + 1),
                )
            })
            .collect();
        let path = dir.path().join("history.json");
        std::fs::write(&path, serde_json::to_string(&history).unwrap()).unwrap();
        path
    }

    #[test]
    fn missing_config_reports_path() {
        let err = load_config(Path::new("does/not/exist.yml")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yml"));
    }

    #[tokio::test]
    async fn predicts_from_history_file() {
        let config = reference_config();
        let dir = tempfile::tempdir().unwrap();
        let source = HistoryArgs {
            domain: "lotto649".to_string(),
            history: write_history(&dir, 60),
        };
        let domain = config.domain(&source.domain).unwrap().clone();

        let history = load_history(&source, &domain).await.unwrap();
        assert_eq!(history.len(), 60);

        let predictor = Predictor::new(&domain, &config, random_source(Some(3))).unwrap();
        let report = predictor.predict(&history, &config.initial_weights).unwrap();
        assert_eq!(report.prediction.candidates.len(), 6);
        assert!(report.prediction.confidence <= 0.99);
    }

    #[tokio::test]
    async fn single_run_cycle_applies_backtest_outcomes() {
        let config = reference_config();
        let dir = tempfile::tempdir().unwrap();
        let source = HistoryArgs {
            domain: "lotto649".to_string(),
            history: write_history(&dir, 40),
        };
        let domain = config.domain(&source.domain).unwrap().clone();
        let outcomes = backtest_outcomes(&source, &domain, &config, Some(1), 10);

        let tracker = Arc::new(PerformanceTracker::new(config.tracker.clone()));
        let weights = SharedWeights::new(config.initial_weights.clone());
        let mut reweighting = ReweightingLoop::new(
            config.reweighting.clone(),
            tracker.clone(),
            weights,
            Arc::new(outcomes),
        );

        let report = reweighting.run_guarded().await.unwrap();
        assert_eq!(report.samples_ingested, 40);
        assert_eq!(report.outcome, CycleOutcome::Applied);
        assert!(report.expected_accuracy >= report.prior_expected_accuracy);
        assert_eq!(tracker.sample_count().unwrap(), 40);
    }
}
