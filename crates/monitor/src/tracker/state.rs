use serde::{Deserialize, Serialize};

use drawcast_core::config::TrackerConfig;
use drawcast_core::{Alert, StrategyId};

/// Health of one strategy, derived from its rolling accuracy.
///
/// Ordered from best to worst, so `max` over several states is the worst.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyState {
    /// No samples recorded yet.
    #[default]
    Untracked,
    Active,
    Degraded,
    Critical,
}

impl StrategyState {
    /// State for a rolling accuracy: ACTIVE at or above `active_threshold`,
    /// CRITICAL below `critical_threshold`, DEGRADED in between.
    pub fn classify(rolling_accuracy: f64, config: &TrackerConfig) -> Self {
        if rolling_accuracy < config.critical_threshold {
            StrategyState::Critical
        } else if rolling_accuracy < config.active_threshold {
            StrategyState::Degraded
        } else {
            StrategyState::Active
        }
    }

    /// Alert raised when a strategy moves from `self` to `next`.
    ///
    /// WARNING on entering DEGRADED, ERROR on entering CRITICAL, INFO when a
    /// tracked strategy recovers to ACTIVE. A first classification as ACTIVE
    /// raises nothing.
    pub fn transition_alert(self, next: StrategyState, strategy: StrategyId, accuracy: f64) -> Option<Alert> {
        if self == next {
            return None;
        }
        match next {
            StrategyState::Degraded => Some(Alert::warning(
                Some(strategy),
                format!("{strategy} degraded: rolling accuracy {accuracy:.3}"),
            )),
            StrategyState::Critical => Some(Alert::error(
                Some(strategy),
                format!("{strategy} critical: rolling accuracy {accuracy:.3}"),
            )),
            StrategyState::Active if self != StrategyState::Untracked => Some(Alert::info(
                Some(strategy),
                format!("{strategy} recovered: rolling accuracy {accuracy:.3}"),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use drawcast_core::AlertSeverity;

    use super::*;

    #[test]
    fn classify_bands() {
        let config = TrackerConfig::default();
        assert_eq!(StrategyState::classify(0.9, &config), StrategyState::Active);
        assert_eq!(StrategyState::classify(0.6, &config), StrategyState::Active);
        assert_eq!(StrategyState::classify(0.5, &config), StrategyState::Degraded);
        assert_eq!(StrategyState::classify(0.4, &config), StrategyState::Degraded);
        assert_eq!(StrategyState::classify(0.1, &config), StrategyState::Critical);
    }

    #[test]
    fn transition_alerts() {
        let s = StrategyId::Frequency;
        let severity = |from: StrategyState, to| from.transition_alert(to, s, 0.5).map(|a| a.severity);

        assert_eq!(severity(StrategyState::Untracked, StrategyState::Active), None);
        assert_eq!(severity(StrategyState::Active, StrategyState::Active), None);
        assert_eq!(
            severity(StrategyState::Active, StrategyState::Degraded),
            Some(AlertSeverity::Warning)
        );
        assert_eq!(
            severity(StrategyState::Degraded, StrategyState::Critical),
            Some(AlertSeverity::Error)
        );
        assert_eq!(
            severity(StrategyState::Untracked, StrategyState::Critical),
            Some(AlertSeverity::Error)
        );
        assert_eq!(
            severity(StrategyState::Critical, StrategyState::Active),
            Some(AlertSeverity::Info)
        );
    }

    #[test]
    fn worst_state_is_max() {
        let states = [StrategyState::Active, StrategyState::Critical, StrategyState::Degraded];
        assert_eq!(states.iter().max(), Some(&StrategyState::Critical));
    }
}
