use crate::detection::NormPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calibration submission: four camera-space points and the four floor-plan
/// points they correspond to, in matching order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRequest {
    pub camera_points: Vec<NormPoint>,
    pub map_points: Vec<NormPoint>,
}

/// The active projective transform, as stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResponse {
    /// Row-major 3x3 homography with the bottom-right element fixed at 1.
    pub matrix: [[f64; 3]; 3],
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_from_wire_shape() {
        let json = r#"{
            "camera_points": [
                {"x": 0.1, "y": 0.1}, {"x": 0.9, "y": 0.1},
                {"x": 0.9, "y": 0.9}, {"x": 0.1, "y": 0.9}
            ],
            "map_points": [
                {"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 0.0},
                {"x": 1.0, "y": 1.0}, {"x": 0.0, "y": 1.0}
            ]
        }"#;
        let request: CalibrationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.camera_points.len(), 4);
        assert_eq!(request.map_points.len(), 4);
    }
}
