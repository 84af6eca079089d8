pub mod analytics;
pub mod calibration;
pub mod detection;
