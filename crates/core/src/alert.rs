use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::strategy::StrategyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

/// Threshold alert raised by performance tracking or the reweighting loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub severity: AlertSeverity,
    pub subject_strategy_id: Option<StrategyId>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        severity: AlertSeverity,
        subject_strategy_id: Option<StrategyId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            severity,
            subject_strategy_id,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(subject: Option<StrategyId>, message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Info, subject, message)
    }

    pub fn warning(subject: Option<StrategyId>, message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Warning, subject, message)
    }

    pub fn error(subject: Option<StrategyId>, message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Error, subject, message)
    }
}
