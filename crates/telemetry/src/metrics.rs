use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ==== Tick pipeline ====
    pub static ref ENGINE_TICKS: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "analytics_engine_ticks_total",
                "Total number of processed detection ticks",
            ),
            &["status"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref ENGINE_TICK_DURATION: Histogram = {
        let metric = Histogram::with_opts(HistogramOpts::new(
            "analytics_engine_tick_duration_seconds",
            "Duration of one aggregation tick",
        ))
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref INGEST_FRAMES_DROPPED: IntCounter = {
        let metric = IntCounter::new(
            "analytics_engine_ingest_frames_dropped_total",
            "Frames evicted from the ingest queue in favor of newer ones",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref DETECTION_POINTS_DISCARDED: IntCounter = {
        let metric = IntCounter::new(
            "analytics_engine_malformed_points_total",
            "Detection points discarded for being outside normalized range",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Calibration ====
    pub static ref CALIBRATION_UPDATES: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "analytics_engine_calibration_updates_total",
                "Calibration submissions by outcome",
            ),
            &["status"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Alerts ====
    pub static ref ALERTS_FIRED: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "analytics_engine_alerts_fired_total",
                "Anomaly alerts raised, by level",
            ),
            &["level"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Live fan-out ====
    pub static ref LIVE_SUBSCRIBERS: IntGauge = {
        let metric = IntGauge::new(
            "analytics_engine_live_subscribers",
            "Currently connected live snapshot subscribers",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref LIVE_EVENTS_DROPPED: IntCounter = {
        let metric = IntCounter::new(
            "analytics_engine_live_events_dropped_total",
            "Snapshot events dropped because a subscriber buffer was full",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };
}
