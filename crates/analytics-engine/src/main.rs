use analytics_engine::api::{self, ApiContext};
use analytics_engine::pipeline::FramePipeline;
use analytics_engine::store::MemoryLogStore;
use analytics_engine::{EngineConfig, EngineState};
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize telemetry (logging and metrics)
    telemetry::init();

    info!("Starting Analytics Engine...");

    // Load configuration from environment
    let config = EngineConfig::from_env()?;
    info!(
        "Analytics Engine configuration: bind={}, grid={}x{}, trend_window={}",
        config.bind_addr, config.grid_size, config.grid_size, config.trend_window
    );

    // Create application state over the in-memory log store
    let store = Arc::new(MemoryLogStore::new(config.log_retention));
    let ingest_capacity = config.ingest_capacity;
    let engine = EngineState::new(config.clone(), store);

    // Start the frame ingest worker
    let (pipeline, worker) = FramePipeline::spawn(engine.clone(), ingest_capacity);

    // Build HTTP router
    let app = api::router(ApiContext {
        engine,
        pipeline: pipeline.clone(),
    });

    // Bind and serve
    info!("Binding to {}", config.bind_addr);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Analytics Engine listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pipeline))
        .await?;

    // Let the worker drain and stop before exiting
    let _ = worker.await;

    Ok(())
}

async fn shutdown_signal(pipeline: FramePipeline) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
    pipeline.shutdown();
}
