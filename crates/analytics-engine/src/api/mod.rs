pub mod routes;
pub mod websocket;

use crate::pipeline::FramePipeline;
use crate::state::EngineState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Everything the handlers need.
#[derive(Clone)]
pub struct ApiContext {
    pub engine: EngineState,
    pub pipeline: FramePipeline,
}

/// Build the API router
pub fn router(context: ApiContext) -> Router {
    Router::new()
        // Health and metrics endpoints
        .route("/healthz", get(routes::healthz))
        .route("/readyz", get(routes::readyz))
        .route("/metrics", get(routes::metrics))
        // Calibration
        .route(
            "/v1/calibration",
            get(routes::get_calibration).post(routes::submit_calibration),
        )
        // Producer inputs
        .route("/v1/frames", post(routes::submit_frame))
        .route("/v1/audio", post(routes::update_audio))
        // Derived state
        .route("/v1/snapshot", get(routes::snapshot))
        .route("/v1/live", get(websocket::ws_handler))
        .route("/v1/analytics/trend", get(routes::trend))
        .route("/v1/analytics/peak-hours", get(routes::peak_hours))
        .route("/v1/logs", get(routes::logs))
        .route("/v1/alerts/active", get(routes::active_alert))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}
