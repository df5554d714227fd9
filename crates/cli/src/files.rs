//! File-backed collaborators for the binary.
//!
//! History and outcomes are JSON arrays read whole on every call, so edits
//! to the files are picked up by the next reweighting cycle. Sinks append
//! one JSON object per line.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use drawcast_core::{
    Alert, AlertSink, CombinedPrediction, HistoricalDraw, HistoryProvider, OutcomeProvider,
    PerformanceSample, PredictionSink, ProviderError,
};

async fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ProviderError> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw)
        .map_err(|e| ProviderError::Serialize(format!("{}: {e}", path.display())))
}

/// Draw history for a single domain, stored as a JSON array.
pub struct JsonHistoryFile {
    path: PathBuf,
}

impl JsonHistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every draw in the file, oldest first.
    pub async fn load(&self) -> Result<Vec<HistoricalDraw>, ProviderError> {
        let mut draws: Vec<HistoricalDraw> = read_json_array(&self.path).await?;
        draws.sort_by_key(|d| d.timestamp);
        Ok(draws)
    }
}

#[async_trait::async_trait]
impl HistoryProvider for JsonHistoryFile {
    async fn get_history(
        &self,
        domain_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoricalDraw>, ProviderError> {
        let mut draws = self.load().await.map_err(|e| match e {
            ProviderError::Io(err) => {
                ProviderError::History(format!("{}: {err}", self.path.display()))
            }
            other => other,
        })?;
        let skip = draws.len().saturating_sub(limit);
        draws.drain(..skip);
        debug!(domain = %domain_id, draws = draws.len(), path = %self.path.display(), "history loaded");
        Ok(draws)
    }
}

/// Recorded performance samples, stored as a JSON array.
pub struct JsonOutcomeFile {
    path: PathBuf,
}

impl JsonOutcomeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl OutcomeProvider for JsonOutcomeFile {
    async fn get_outcomes(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PerformanceSample>, ProviderError> {
        let mut samples: Vec<PerformanceSample> =
            read_json_array(&self.path).await.map_err(|e| match e {
                ProviderError::Io(err) => {
                    ProviderError::Outcomes(format!("{}: {err}", self.path.display()))
                }
                other => other,
            })?;
        if let Some(since) = since {
            samples.retain(|s| s.timestamp > since);
        }
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }
}

/// Appends records to a JSON Lines file, creating it on first write.
pub struct JsonlSink {
    name: String,
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    async fn append<T: Serialize>(&self, record: &T) -> Result<(), ProviderError> {
        let mut line = serde_json::to_string(record).map_err(|e| ProviderError::Sink {
            sink: self.name.clone(),
            reason: e.to_string(),
        })?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ProviderError::Sink {
                sink: self.name.clone(),
                reason: format!("{}: {e}", self.path.display()),
            })?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AlertSink for JsonlSink {
    async fn store(&self, alert: &Alert) -> Result<(), ProviderError> {
        self.append(alert).await
    }

    fn sink_name(&self) -> &str {
        &self.name
    }
}

#[async_trait::async_trait]
impl PredictionSink for JsonlSink {
    async fn store(&self, prediction: &CombinedPrediction) -> Result<(), ProviderError> {
        self.append(prediction).await
    }

    fn sink_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use drawcast_core::StrategyId;

    use super::*;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap() + Duration::days(n)
    }

    fn write_json<T: Serialize>(dir: &tempfile::TempDir, name: &str, value: &T) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn history_is_sorted_and_limited_to_newest() {
        let dir = tempfile::tempdir().unwrap();
        let draws = vec![
            HistoricalDraw::new(day(2), [3, 4, 5]),
            HistoricalDraw::new(day(0), [1, 2, 3]),
            HistoricalDraw::new(day(1), [2, 3, 4]),
        ];
        let path = write_json(&dir, "history.json", &draws);

        let provider = JsonHistoryFile::new(path);
        let all = provider.get_history("test", 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let newest = provider.get_history("test", 2).await.unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].timestamp, day(1));
        assert_eq!(newest[1].timestamp, day(2));
    }

    #[tokio::test]
    async fn missing_history_file_is_a_history_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonHistoryFile::new(dir.path().join("absent.json"));
        let err = provider.get_history("test", 10).await.unwrap_err();
        assert!(matches!(err, ProviderError::History(_)));
    }

    #[tokio::test]
    async fn malformed_history_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not an array").unwrap();

        let err = JsonHistoryFile::new(path).load().await.unwrap_err();
        assert!(matches!(err, ProviderError::Serialize(_)));
    }

    #[tokio::test]
    async fn outcomes_are_filtered_by_since() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<PerformanceSample> = (0..4)
            .map(|i| {
                PerformanceSample::from_outcome(
                    StrategyId::Frequency,
                    format!("test:{i}"),
                    3,
                    &[1, 2, 3],
                    &[1, 2, 9],
                    day(i),
                )
            })
            .collect();
        let path = write_json(&dir, "outcomes.json", &samples);
        let provider = JsonOutcomeFile::new(path);

        assert_eq!(provider.get_outcomes(None).await.unwrap().len(), 4);
        let newer = provider.get_outcomes(Some(day(1))).await.unwrap();
        assert_eq!(newer.len(), 2);
        assert!(newer.iter().all(|s| s.timestamp > day(1)));
    }

    #[tokio::test]
    async fn sink_appends_one_line_per_alert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.jsonl");
        let sink = JsonlSink::new("alerts", &path);

        AlertSink::store(&sink, &Alert::warning(Some(StrategyId::Recency), "degraded"))
            .await
            .unwrap();
        AlertSink::store(&sink, &Alert::info(None, "recovered"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Alert> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].message, "degraded");
        assert_eq!(AlertSink::sink_name(&sink), "alerts");
    }

    #[tokio::test]
    async fn sink_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::new("alerts", dir.path().join("missing").join("alerts.jsonl"));
        let err = AlertSink::store(&sink, &Alert::info(None, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Sink { .. }));
    }
}
