use crate::risk::RiskThresholds;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address to bind the HTTP server to
    pub bind_addr: String,

    /// Heatmap resolution (NxN cells)
    pub grid_size: usize,

    /// Default moving-average window for the trend query
    pub trend_window: usize,

    /// Maximum retained trend points
    pub trend_retention: usize,

    /// Person-count thresholds for risk classification
    pub thresholds: RiskThresholds,

    /// How long an anomaly alert stays active without being refreshed
    pub alert_ttl_secs: u64,

    /// Ingest queue depth; the oldest unprocessed frame is evicted on overflow
    pub ingest_capacity: usize,

    /// Per-subscriber live event buffer depth
    pub subscriber_buffer: usize,

    /// Maximum crowd log entries retained by the in-memory store
    pub log_retention: usize,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("ENGINE_ADDR").unwrap_or_else(|_| "0.0.0.0:8087".to_string());

        Ok(Self {
            bind_addr,
            grid_size: parse_env("HEATMAP_GRID_SIZE", 10)?,
            trend_window: parse_env("TREND_WINDOW", 5)?,
            trend_retention: parse_env("TREND_RETENTION", 720)?,
            thresholds: RiskThresholds {
                warn: parse_env("RISK_WARN_THRESHOLD", 10)?,
                danger: parse_env("RISK_DANGER_THRESHOLD", 20)?,
            },
            alert_ttl_secs: parse_env("ALERT_TTL_SECS", 5)?,
            ingest_capacity: parse_env("INGEST_CAPACITY", 8)?,
            subscriber_buffer: parse_env("SUBSCRIBER_BUFFER", 16)?,
            log_retention: parse_env("LOG_RETENTION", 10_000)?,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8087".to_string(),
            grid_size: 10,
            trend_window: 5,
            trend_retention: 720,
            thresholds: RiskThresholds::default(),
            alert_ttl_secs: 5,
            ingest_capacity: 8,
            subscriber_buffer: 16,
            log_retention: 10_000,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
