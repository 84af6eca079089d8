use crate::detection::{AudioStatus, NormPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Crowd risk level, ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Warn,
    Danger,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Warn => write!(f, "WARN"),
            RiskLevel::Danger => write!(f, "DANGER"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "WARN" => Ok(RiskLevel::Warn),
            "DANGER" => Ok(RiskLevel::Danger),
            _ => Err(format!("Invalid risk level: {}", s)),
        }
    }
}

/// One observation in the people-count time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub count: u32,
    pub moving_avg: f64,
}

/// Aggregated person count for one hour of the day (0-23).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakHourBucket {
    pub hour: u32,
    pub count: u64,
}

/// Hour-of-day aggregation over the full log history. `peak_hour` is `None`
/// when no history has been recorded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakHourReport {
    pub peak_hour: Option<u32>,
    pub peak_count: u64,
    pub hourly: Vec<PeakHourBucket>,
}

/// Durable record of one processed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub person_count: u32,
    pub risk_score: RiskLevel,
    pub audio_status: AudioStatus,
}

/// Transient, auto-expiring anomaly notification. At most one is active at a
/// time; qualifying ticks refresh it instead of stacking new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    pub message: String,
    pub level: RiskLevel,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The per-tick state pushed to live subscribers and served at `/v1/snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub timestamp: DateTime<Utc>,
    pub people_count: u32,
    pub risk_level: RiskLevel,
    pub audio_status: AudioStatus,
    /// Raw camera-space coordinates consumed for spatial aggregation.
    pub coordinates: Vec<NormPoint>,
    /// Per-cell counts in map space, rebuilt every tick.
    pub heatmap: Vec<Vec<u32>>,
    /// Version of the calibration profile the tick ran against, if any.
    pub calibration_version: Option<u64>,
}

impl LiveSnapshot {
    /// Snapshot served before any detection frame has been processed.
    pub fn empty(grid_size: usize, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            people_count: 0,
            risk_level: RiskLevel::Low,
            audio_status: AudioStatus::Normal,
            coordinates: Vec::new(),
            heatmap: vec![vec![0; grid_size]; grid_size],
            calibration_version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Warn);
        assert!(RiskLevel::Warn < RiskLevel::Danger);
    }

    #[test]
    fn test_risk_level_serde_and_fromstr() {
        assert_eq!(serde_json::to_string(&RiskLevel::Danger).unwrap(), "\"DANGER\"");
        let level: RiskLevel = serde_json::from_str("\"WARN\"").unwrap();
        assert_eq!(level, RiskLevel::Warn);
        assert_eq!(RiskLevel::from_str("low").unwrap(), RiskLevel::Low);
        assert!(RiskLevel::from_str("CRITICAL").is_err());
    }

    #[test]
    fn test_empty_snapshot_shape() {
        let snapshot = LiveSnapshot::empty(10, Utc::now());
        assert_eq!(snapshot.heatmap.len(), 10);
        assert!(snapshot.heatmap.iter().all(|row| row.len() == 10));
        assert_eq!(snapshot.people_count, 0);
        assert!(snapshot.calibration_version.is_none());
    }
}
