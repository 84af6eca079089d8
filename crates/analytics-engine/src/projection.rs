//! Applying the active projective transform to camera-space points.

use common::detection::NormPoint;
use nalgebra::{Matrix3, Vector3};

/// Scale factor magnitude below which the projection is undefined.
const W_EPS: f64 = 1e-9;

/// Homogeneous multiply + perspective divide. Returns `None` when the point
/// maps to infinity; callers treat that the same as having no calibration at
/// all rather than emitting a garbage coordinate.
pub fn apply(matrix: &Matrix3<f64>, point: NormPoint) -> Option<NormPoint> {
    let v = matrix * Vector3::new(point.x, point.y, 1.0);
    if v.z.abs() < W_EPS {
        return None;
    }
    Some(NormPoint::new(v.x / v.z, v.y / v.z))
}
