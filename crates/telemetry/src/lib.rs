use tracing_subscriber::{fmt, EnvFilter};

pub mod metrics;

/// Initialize logging from `RUST_LOG`, defaulting to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
    tracing::info!("telemetry initialized");
}

/// Non-panicking variant for tests, where a subscriber may already be set.
pub fn try_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
