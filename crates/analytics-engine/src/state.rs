//! Shared engine state and the serialized tick pipeline.
//!
//! All aggregates live behind one `Arc`'d inner; a tokio `Mutex` serializes
//! tick processing so queries only ever observe pre- or post-tick state.
//! Calibration saves are serialized by the profile's write lock; a tick in
//! flight keeps using the profile it captured at its start.

use crate::broadcaster::Broadcaster;
use crate::calibration::{fit_homography, CalibrationError, CalibrationProfile};
use crate::config::EngineConfig;
use crate::heatmap::HeatmapGrid;
use crate::peak_hour;
use crate::projection;
use crate::risk::{self, AlertState};
use crate::store::LogStore;
use crate::trend::TrendSeries;
use anyhow::Result;
use chrono::{Duration, Utc};
use common::analytics::{
    AnomalyAlert, LiveSnapshot, LogEntry, PeakHourReport, RiskLevel, TrendPoint,
};
use common::calibration::CalibrationRequest;
use common::detection::{AudioStatus, DetectionFrame, NormPoint};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Synchronously rejected query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("window_size must be a positive integer")]
    NonPositiveWindow,
}

#[derive(Clone)]
pub struct EngineState {
    inner: Arc<EngineStateInner>,
}

struct EngineStateInner {
    config: EngineConfig,
    calibration: RwLock<Option<CalibrationProfile>>,
    audio: RwLock<AudioStatus>,
    trend: RwLock<TrendSeries>,
    alerts: RwLock<AlertState>,
    snapshot: RwLock<Option<LiveSnapshot>>,
    tick_guard: Mutex<()>,
    store: Arc<dyn LogStore>,
    broadcaster: Broadcaster,
}

impl EngineState {
    pub fn new(config: EngineConfig, store: Arc<dyn LogStore>) -> Self {
        Self {
            inner: Arc::new(EngineStateInner {
                calibration: RwLock::new(None),
                audio: RwLock::new(AudioStatus::Normal),
                trend: RwLock::new(TrendSeries::new(config.trend_retention)),
                alerts: RwLock::new(AlertState::default()),
                snapshot: RwLock::new(None),
                tick_guard: Mutex::new(()),
                store,
                broadcaster: Broadcaster::new(config.subscriber_buffer),
                config,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    /// Fit and atomically activate a new calibration profile. On any
    /// validation failure the previously active profile stays in place.
    pub async fn save_calibration(
        &self,
        request: &CalibrationRequest,
    ) -> Result<CalibrationProfile, CalibrationError> {
        let matrix = match fit_homography(&request.camera_points, &request.map_points) {
            Ok(matrix) => matrix,
            Err(error) => {
                telemetry::metrics::CALIBRATION_UPDATES
                    .with_label_values(&["rejected"])
                    .inc();
                warn!(%error, "rejected calibration submission");
                return Err(error);
            }
        };

        let mut active = self.inner.calibration.write().await;
        let version = active.as_ref().map_or(1, |p| p.version() + 1);
        let profile = CalibrationProfile::new(matrix, version);
        *active = Some(profile.clone());

        telemetry::metrics::CALIBRATION_UPDATES
            .with_label_values(&["applied"])
            .inc();
        info!(version, "calibration profile replaced");
        Ok(profile)
    }

    pub async fn calibration(&self) -> Option<CalibrationProfile> {
        self.inner.calibration.read().await.clone()
    }

    /// Update the audio status from the independent audio producer.
    pub async fn update_audio(&self, status: AudioStatus) {
        debug!(%status, "audio status updated");
        *self.inner.audio.write().await = status;
    }

    /// Run one aggregation tick. Never fails: malformed points are dropped,
    /// a missing calibration degrades spatial aggregation to an empty grid,
    /// and a store failure is logged without aborting the tick.
    pub async fn process_frame(&self, frame: DetectionFrame) -> LiveSnapshot {
        let _tick = self.inner.tick_guard.lock().await;
        let started = std::time::Instant::now();

        // The profile captured here is used for the whole tick; a save that
        // lands mid-tick takes effect from the next frame.
        let profile = self.inner.calibration.read().await.clone();

        if let Some(status) = frame.audio_status {
            *self.inner.audio.write().await = status;
        }
        let audio = self.inner.audio.read().await.clone();

        let mut valid = Vec::with_capacity(frame.points.len());
        for point in &frame.points {
            if point.is_normalized() {
                valid.push(*point);
            } else {
                telemetry::metrics::DETECTION_POINTS_DISCARDED.inc();
                warn!(x = point.x, y = point.y, "dropping malformed detection point");
            }
        }

        let projected: Vec<NormPoint> = match &profile {
            Some(profile) => valid
                .iter()
                .filter_map(|point| projection::apply(profile.matrix(), *point))
                .collect(),
            None => {
                if !valid.is_empty() {
                    debug!("no active calibration; heatmap degraded to empty grid");
                }
                Vec::new()
            }
        };
        let heatmap = HeatmapGrid::from_points(&projected, self.inner.config.grid_size);

        let count = valid.len() as u32;
        let level = risk::classify(self.inner.config.thresholds, count, &audio);

        self.inner.trend.write().await.record(frame.timestamp, count);

        let now = Utc::now();
        let ttl = Duration::seconds(self.inner.config.alert_ttl_secs as i64);
        if self.inner.alerts.write().await.observe(level, count, now, ttl) {
            telemetry::metrics::ALERTS_FIRED
                .with_label_values(&[&level.to_string()])
                .inc();
            info!(%level, count, "anomaly alert raised");
        }

        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp: frame.timestamp,
            person_count: count,
            risk_score: level,
            audio_status: audio.clone(),
        };
        if let Err(error) = self.inner.store.append(entry).await {
            warn!(%error, "failed to persist crowd log entry");
        }

        let snapshot = LiveSnapshot {
            timestamp: frame.timestamp,
            people_count: count,
            risk_level: level,
            audio_status: audio,
            coordinates: valid,
            heatmap: heatmap.into_cells(),
            calibration_version: profile.as_ref().map(|p| p.version()),
        };

        *self.inner.snapshot.write().await = Some(snapshot.clone());
        self.inner.broadcaster.publish(&snapshot).await;

        telemetry::metrics::ENGINE_TICKS.with_label_values(&["ok"]).inc();
        telemetry::metrics::ENGINE_TICK_DURATION.observe(started.elapsed().as_secs_f64());

        snapshot
    }

    /// Latest published snapshot, or the empty pre-first-tick state.
    pub async fn snapshot(&self) -> LiveSnapshot {
        self.inner
            .snapshot
            .read()
            .await
            .clone()
            .unwrap_or_else(|| LiveSnapshot::empty(self.inner.config.grid_size, Utc::now()))
    }

    pub async fn trend_series(&self, window: usize) -> Result<Vec<TrendPoint>, QueryError> {
        if window == 0 {
            return Err(QueryError::NonPositiveWindow);
        }
        Ok(self.inner.trend.read().await.series(window))
    }

    pub async fn peak_hours(&self) -> Result<PeakHourReport> {
        let history = self.inner.store.history().await?;
        Ok(peak_hour::aggregate(&history))
    }

    pub async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.inner.store.recent(limit).await
    }

    pub async fn active_alert(&self) -> Option<AnomalyAlert> {
        self.inner.alerts.write().await.active(Utc::now())
    }

    /// Whether the current risk level warrants operator attention.
    pub async fn current_risk(&self) -> RiskLevel {
        self.inner
            .snapshot
            .read()
            .await
            .as_ref()
            .map_or(RiskLevel::Low, |s| s.risk_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLogStore;
    use common::detection::NormPoint;

    fn test_state() -> EngineState {
        EngineState::new(EngineConfig::default(), Arc::new(MemoryLogStore::new(1000)))
    }

    fn unit_square() -> Vec<NormPoint> {
        vec![
            NormPoint::new(0.0, 0.0),
            NormPoint::new(1.0, 0.0),
            NormPoint::new(1.0, 1.0),
            NormPoint::new(0.0, 1.0),
        ]
    }

    fn frame(points: Vec<NormPoint>) -> DetectionFrame {
        DetectionFrame {
            timestamp: Utc::now(),
            points,
            audio_status: None,
        }
    }

    #[tokio::test]
    async fn test_tick_without_calibration_degrades_to_empty_grid() {
        let state = test_state();
        let snapshot = state
            .process_frame(frame(vec![NormPoint::new(0.5, 0.5), NormPoint::new(0.2, 0.2)]))
            .await;

        assert_eq!(snapshot.people_count, 2);
        assert!(snapshot.calibration_version.is_none());
        let total: u32 = snapshot.heatmap.iter().flatten().sum();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_tick_with_identity_calibration_bins_points() {
        let state = test_state();
        state
            .save_calibration(&CalibrationRequest {
                camera_points: unit_square(),
                map_points: unit_square(),
            })
            .await
            .unwrap();

        let snapshot = state
            .process_frame(frame(vec![NormPoint::new(0.05, 0.05), NormPoint::new(0.95, 0.95)]))
            .await;

        assert_eq!(snapshot.calibration_version, Some(1));
        assert_eq!(snapshot.heatmap[0][0], 1);
        assert_eq!(snapshot.heatmap[9][9], 1);
    }

    #[tokio::test]
    async fn test_malformed_points_dropped_not_fatal() {
        let state = test_state();
        let snapshot = state
            .process_frame(frame(vec![
                NormPoint::new(0.5, 0.5),
                NormPoint::new(1.5, -0.2),
            ]))
            .await;
        assert_eq!(snapshot.people_count, 1);
        assert_eq!(snapshot.coordinates.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_calibration_preserves_previous_profile() {
        let state = test_state();
        state
            .save_calibration(&CalibrationRequest {
                camera_points: unit_square(),
                map_points: unit_square(),
            })
            .await
            .unwrap();

        // Collinear camera points must be rejected.
        let err = state
            .save_calibration(&CalibrationRequest {
                camera_points: vec![
                    NormPoint::new(0.1, 0.1),
                    NormPoint::new(0.5, 0.5),
                    NormPoint::new(0.9, 0.9),
                    NormPoint::new(0.2, 0.8),
                ],
                map_points: unit_square(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CalibrationError::CollinearPoints { .. }));

        let profile = state.calibration().await.unwrap();
        assert_eq!(profile.version(), 1);
    }

    #[tokio::test]
    async fn test_calibration_replacement_bumps_version() {
        let state = test_state();
        let request = CalibrationRequest {
            camera_points: unit_square(),
            map_points: unit_square(),
        };
        let first = state.save_calibration(&request).await.unwrap();
        let second = state.save_calibration(&request).await.unwrap();
        assert_eq!(first.version(), 1);
        assert_eq!(second.version(), 2);
    }

    #[tokio::test]
    async fn test_audio_label_escalates_risk() {
        let state = test_state();
        state.update_audio(AudioStatus::Panic).await;
        let snapshot = state.process_frame(frame(vec![NormPoint::new(0.5, 0.5)])).await;
        assert_eq!(snapshot.risk_level, RiskLevel::Warn);
        assert!(state.active_alert().await.is_some());
    }

    #[tokio::test]
    async fn test_frame_carried_audio_label_applies_to_tick() {
        let state = test_state();
        let mut f = frame(vec![NormPoint::new(0.5, 0.5)]);
        f.audio_status = Some(AudioStatus::Panic);
        let snapshot = state.process_frame(f).await;
        assert_eq!(snapshot.audio_status, AudioStatus::Panic);
        assert_eq!(snapshot.risk_level, RiskLevel::Warn);
    }

    #[tokio::test]
    async fn test_ticks_populate_trend_and_logs() {
        let state = test_state();
        for count in [3usize, 5, 7] {
            let points = (0..count)
                .map(|i| NormPoint::new(0.1 + i as f64 * 0.05, 0.5))
                .collect();
            state.process_frame(frame(points)).await;
        }

        let trend = state.trend_series(1).await.unwrap();
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[2].count, 7);

        let logs = state.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].person_count, 7);

        let report = state.peak_hours().await.unwrap();
        assert_eq!(report.hourly.iter().map(|b| b.count).sum::<u64>(), 15);
    }

    #[tokio::test]
    async fn test_zero_window_rejected() {
        let state = test_state();
        assert_eq!(
            state.trend_series(0).await.unwrap_err(),
            QueryError::NonPositiveWindow
        );
    }

    #[tokio::test]
    async fn test_snapshot_before_first_tick_is_empty() {
        let state = test_state();
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.people_count, 0);
        assert_eq!(state.current_risk().await, RiskLevel::Low);
    }
}
