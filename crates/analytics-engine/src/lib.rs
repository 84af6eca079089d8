pub mod api;
pub mod broadcaster;
pub mod calibration;
pub mod config;
pub mod error;
pub mod heatmap;
pub mod peak_hour;
pub mod pipeline;
pub mod projection;
pub mod risk;
pub mod state;
pub mod store;
pub mod trend;

pub use config::EngineConfig;
pub use state::EngineState;
