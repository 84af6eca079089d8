use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point normalized to [0,1] of its image's width/height. All coordinates
/// crossing the engine boundary use this form; nothing assumes pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    pub x: f64,
    pub y: f64,
}

impl NormPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates lie inside the normalized [0,1] range.
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Audio classification produced by the external audio detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioStatus {
    #[default]
    Normal,
    Panic,
    /// Detector-defined label outside the core vocabulary.
    #[serde(untagged)]
    Other(String),
}

impl AudioStatus {
    pub fn is_panic(&self) -> bool {
        matches!(self, AudioStatus::Panic)
    }
}

impl std::fmt::Display for AudioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioStatus::Normal => write!(f, "NORMAL"),
            AudioStatus::Panic => write!(f, "PANIC"),
            AudioStatus::Other(label) => write!(f, "{}", label),
        }
    }
}

/// One tick's worth of raw detections in camera-normalized space, as emitted
/// by the external person detector. Consumed once, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub timestamp: DateTime<Utc>,
    pub points: Vec<NormPoint>,
    /// Audio label riding along with the frame, if the detector merges both
    /// streams. Updates the engine's audio state for this tick onward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_status: Option<AudioStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_range_check() {
        assert!(NormPoint::new(0.0, 0.0).is_normalized());
        assert!(NormPoint::new(1.0, 1.0).is_normalized());
        assert!(NormPoint::new(0.5, 0.25).is_normalized());
        assert!(!NormPoint::new(-0.01, 0.5).is_normalized());
        assert!(!NormPoint::new(0.5, 1.2).is_normalized());
    }

    #[test]
    fn test_audio_status_serde() {
        let normal: AudioStatus = serde_json::from_str("\"NORMAL\"").unwrap();
        assert_eq!(normal, AudioStatus::Normal);
        assert!(!normal.is_panic());

        let panic: AudioStatus = serde_json::from_str("\"PANIC\"").unwrap();
        assert!(panic.is_panic());

        // Labels outside the core vocabulary survive a round trip.
        let other: AudioStatus = serde_json::from_str("\"GLASS_BREAK\"").unwrap();
        assert_eq!(other, AudioStatus::Other("GLASS_BREAK".to_string()));
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"GLASS_BREAK\"");
    }

    #[test]
    fn test_frame_without_audio_label() {
        let json = r#"{"timestamp":"2026-08-29T10:00:00Z","points":[{"x":0.5,"y":0.5}]}"#;
        let frame: DetectionFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.points.len(), 1);
        assert!(frame.audio_status.is_none());
    }
}
