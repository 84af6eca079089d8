//! Per-tick risk classification and the deduplicated anomaly alert.

use chrono::{DateTime, Duration, Utc};
use common::analytics::{AnomalyAlert, RiskLevel};
use common::detection::AudioStatus;
use serde::{Deserialize, Serialize};

/// Count thresholds for the crowd component of the risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub warn: u32,
    pub danger: u32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            warn: 10,
            danger: 20,
        }
    }
}

/// Total function from (count, audio status) to a risk level, evaluated
/// fresh every tick. No hysteresis: consecutive ticks straddling a
/// threshold will flap between adjacent levels.
pub fn classify(thresholds: RiskThresholds, count: u32, audio: &AudioStatus) -> RiskLevel {
    let crowd = if count >= thresholds.danger {
        RiskLevel::Danger
    } else if count >= thresholds.warn {
        RiskLevel::Warn
    } else {
        RiskLevel::Low
    };

    if audio.is_panic() {
        // Panic audio alone warrants a warning; combined with a dangerous
        // crowd it stays at danger.
        if crowd == RiskLevel::Danger {
            RiskLevel::Danger
        } else {
            RiskLevel::Warn
        }
    } else {
        crowd
    }
}

/// Holds at most one live alert. Warn/Danger ticks refresh the active
/// alert's message and expiry instead of stacking a new one; expired
/// alerts disappear from the active view with no further input.
#[derive(Debug, Default)]
pub struct AlertState {
    active: Option<AnomalyAlert>,
}

impl AlertState {
    /// Feed one tick's level through the notifier. Returns true when a new
    /// alert was raised (as opposed to refreshed or not qualifying).
    pub fn observe(
        &mut self,
        level: RiskLevel,
        count: u32,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> bool {
        if level < RiskLevel::Warn {
            return false;
        }

        let message = format!("{} risk: {} people detected", level, count);
        match &mut self.active {
            Some(alert) if alert.expires_at > now => {
                alert.message = message;
                alert.level = level;
                alert.expires_at = now + ttl;
                false
            }
            _ => {
                self.active = Some(AnomalyAlert {
                    message,
                    level,
                    created_at: now,
                    expires_at: now + ttl,
                });
                true
            }
        }
    }

    /// The current alert, pruning it first if it has expired.
    pub fn active(&mut self, now: DateTime<Utc>) -> Option<AnomalyAlert> {
        if let Some(alert) = &self.active {
            if alert.expires_at <= now {
                self.active = None;
            }
        }
        self.active.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_pure_over_a_sequence() {
        let thresholds = RiskThresholds::default();
        let counts = [5u32, 12, 25, 8];
        let levels: Vec<RiskLevel> = counts
            .iter()
            .map(|&c| classify(thresholds, c, &AudioStatus::Normal))
            .collect();
        assert_eq!(
            levels,
            vec![
                RiskLevel::Low,
                RiskLevel::Warn,
                RiskLevel::Danger,
                RiskLevel::Low
            ]
        );
    }

    #[test]
    fn test_threshold_boundaries_inclusive() {
        let thresholds = RiskThresholds::default();
        assert_eq!(
            classify(thresholds, 10, &AudioStatus::Normal),
            RiskLevel::Warn
        );
        assert_eq!(
            classify(thresholds, 20, &AudioStatus::Normal),
            RiskLevel::Danger
        );
        assert_eq!(classify(thresholds, 9, &AudioStatus::Normal), RiskLevel::Low);
    }

    #[test]
    fn test_panic_audio_escalates() {
        let thresholds = RiskThresholds::default();
        assert_eq!(classify(thresholds, 0, &AudioStatus::Panic), RiskLevel::Warn);
        assert_eq!(
            classify(thresholds, 15, &AudioStatus::Panic),
            RiskLevel::Warn
        );
        assert_eq!(
            classify(thresholds, 25, &AudioStatus::Panic),
            RiskLevel::Danger
        );
        // Unknown labels do not escalate.
        assert_eq!(
            classify(thresholds, 5, &AudioStatus::Other("GLASS_BREAK".into())),
            RiskLevel::Low
        );
    }

    #[test]
    fn test_alert_raised_once_then_refreshed() {
        let mut alerts = AlertState::default();
        let ttl = Duration::seconds(5);
        let t0 = Utc::now();

        assert!(alerts.observe(RiskLevel::Warn, 12, t0, ttl));
        let first = alerts.active(t0).unwrap();

        // A second qualifying tick refreshes, never stacks.
        let t1 = t0 + Duration::seconds(2);
        assert!(!alerts.observe(RiskLevel::Danger, 25, t1, ttl));
        let refreshed = alerts.active(t1).unwrap();
        assert_eq!(refreshed.created_at, first.created_at);
        assert_eq!(refreshed.level, RiskLevel::Danger);
        assert_eq!(refreshed.expires_at, t1 + ttl);
    }

    #[test]
    fn test_alert_expires_without_input() {
        let mut alerts = AlertState::default();
        let ttl = Duration::seconds(5);
        let t0 = Utc::now();
        alerts.observe(RiskLevel::Danger, 30, t0, ttl);

        assert!(alerts.active(t0 + Duration::seconds(4)).is_some());
        assert!(alerts.active(t0 + Duration::seconds(5)).is_none());
        // Pruned for good, not just hidden.
        assert!(alerts.active(t0).is_none());
    }

    #[test]
    fn test_low_risk_never_alerts() {
        let mut alerts = AlertState::default();
        let t0 = Utc::now();
        assert!(!alerts.observe(RiskLevel::Low, 3, t0, Duration::seconds(5)));
        assert!(alerts.active(t0).is_none());
    }

    #[test]
    fn test_new_alert_after_expiry() {
        let mut alerts = AlertState::default();
        let ttl = Duration::seconds(5);
        let t0 = Utc::now();
        alerts.observe(RiskLevel::Warn, 11, t0, ttl);

        let t1 = t0 + Duration::seconds(10);
        assert!(alerts.observe(RiskLevel::Warn, 13, t1, ttl));
        assert_eq!(alerts.active(t1).unwrap().created_at, t1);
    }
}
