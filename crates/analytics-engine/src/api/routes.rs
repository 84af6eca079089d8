use crate::api::ApiContext;
use crate::error::ApiError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use common::analytics::LiveSnapshot;
use common::calibration::{CalibrationRequest, CalibrationResponse};
use common::detection::{AudioStatus, DetectionFrame};
use serde::Deserialize;
use serde_json::json;

/// Submit a four-point calibration; replaces the active profile on success.
pub async fn submit_calibration(
    State(context): State<ApiContext>,
    Json(request): Json<CalibrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = context
        .engine
        .save_calibration(&request)
        .await
        .map_err(|e| ApiError::invalid_calibration(e.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(CalibrationResponse {
            matrix: profile.matrix_rows(),
            version: profile.version(),
            created_at: profile.created_at(),
        }),
    ))
}

/// Read back the active calibration profile.
pub async fn get_calibration(
    State(context): State<ApiContext>,
) -> Result<Json<CalibrationResponse>, ApiError> {
    context
        .engine
        .calibration()
        .await
        .map(|profile| {
            Json(CalibrationResponse {
                matrix: profile.matrix_rows(),
                version: profile.version(),
                created_at: profile.created_at(),
            })
        })
        .ok_or_else(ApiError::projection_unavailable)
}

/// Enqueue a detection frame for tick processing.
pub async fn submit_frame(
    State(context): State<ApiContext>,
    Json(frame): Json<DetectionFrame>,
) -> impl IntoResponse {
    context.pipeline.submit(frame).await;
    (StatusCode::ACCEPTED, Json(json!({ "accepted": true })))
}

#[derive(Debug, Deserialize)]
pub struct AudioUpdate {
    pub status: AudioStatus,
}

/// Update the audio status from the audio producer.
pub async fn update_audio(
    State(context): State<ApiContext>,
    Json(update): Json<AudioUpdate>,
) -> impl IntoResponse {
    context.engine.update_audio(update.status).await;
    StatusCode::NO_CONTENT
}

/// Latest per-tick snapshot (zeroed before the first tick).
pub async fn snapshot(State(context): State<ApiContext>) -> Json<LiveSnapshot> {
    Json(context.engine.snapshot().await)
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub window_size: Option<usize>,
}

/// People-count series with moving averages.
pub async fn trend(
    State(context): State<ApiContext>,
    Query(query): Query<TrendQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = query
        .window_size
        .unwrap_or(context.engine.config().trend_window);
    let points = context
        .engine
        .trend_series(window)
        .await
        .map_err(|e| ApiError::invalid_query(e.to_string()))?;

    Ok(Json(json!({
        "window_size": window,
        "points": points,
    })))
}

/// Hour-of-day aggregation over the full log history.
pub async fn peak_hours(
    State(context): State<ApiContext>,
) -> Result<impl IntoResponse, ApiError> {
    let report = context.engine.peak_hours().await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Recent crowd log entries, newest first.
pub async fn logs(
    State(context): State<ApiContext>,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50);
    let entries = context.engine.recent_logs(limit).await?;
    Ok(Json(json!({ "logs": entries })))
}

/// The currently active (non-expired) anomaly alert, if any.
pub async fn active_alert(State(context): State<ApiContext>) -> impl IntoResponse {
    let alert = context.engine.active_alert().await;
    Json(json!({ "alert": alert }))
}

/// Health check endpoint
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "analytics-engine"
        })),
    )
}

/// Readiness check endpoint
pub async fn readyz(State(context): State<ApiContext>) -> impl IntoResponse {
    if context.pipeline.is_shutdown() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "calibrated": context.engine.calibration().await.is_some(),
            "risk_level": context.engine.current_risk().await,
            "queued_frames": context.pipeline.queued().await,
        })),
    )
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics() -> impl IntoResponse {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = telemetry::metrics::REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response();
    }

    match String::from_utf8(buffer) {
        Ok(s) => s.into_response(),
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to convert metrics",
            )
                .into_response()
        }
    }
}
