//! Four-point homography fitting between camera space and floor-plan space.
//!
//! Each correspondence pair contributes two rows to an 8-unknown linear
//! system (the bottom-right matrix element is fixed at 1). Four pairs make
//! the system exactly determined, so it is solved directly by LU.

use chrono::{DateTime, Utc};
use common::detection::NormPoint;
use nalgebra::{Matrix3, SMatrix, SVector};
use thiserror::Error;

/// Doubled triangle area below which three points are treated as collinear.
const COLLINEARITY_EPS: f64 = 1e-9;
/// Determinant magnitude below which a fitted transform is rejected.
const SINGULARITY_EPS: f64 = 1e-12;

pub const REQUIRED_POINTS: usize = 4;

/// Why a calibration submission was rejected. The previously active profile
/// stays in place whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationError {
    #[error("expected exactly {expected} {side} points, got {actual}")]
    WrongPointCount {
        side: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{side} point {index} is outside the normalized [0,1] range")]
    PointOutOfRange { side: &'static str, index: usize },
    #[error("{side} points {a}, {b} and {c} are collinear; no unique projective solution")]
    CollinearPoints {
        side: &'static str,
        a: usize,
        b: usize,
        c: usize,
    },
    #[error("correspondence pairs produce a singular transform")]
    SingularTransform,
}

/// The fitted projective transform, versioned so consumers can observe
/// atomic profile replacements.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationProfile {
    matrix: Matrix3<f64>,
    version: u64,
    created_at: DateTime<Utc>,
}

impl CalibrationProfile {
    pub fn new(matrix: Matrix3<f64>, version: u64) -> Self {
        Self {
            matrix,
            version,
            created_at: Utc::now(),
        }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Row-major wire form of the matrix.
    pub fn matrix_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }
}

/// Fit the 3x3 homography mapping each camera point to its floor-plan
/// counterpart. Rejects degenerate configurations before solving.
pub fn fit_homography(
    camera: &[NormPoint],
    map: &[NormPoint],
) -> Result<Matrix3<f64>, CalibrationError> {
    validate_side("camera", camera)?;
    validate_side("map", map)?;

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (i, (src, dst)) in camera.iter().zip(map.iter()).enumerate() {
        let r = i * 2;
        // x' = (h11 x + h12 y + h13) / (h31 x + h32 y + 1)
        a[(r, 0)] = src.x;
        a[(r, 1)] = src.y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -src.x * dst.x;
        a[(r, 7)] = -src.y * dst.x;
        b[r] = dst.x;
        // y' = (h21 x + h22 y + h23) / (h31 x + h32 y + 1)
        a[(r + 1, 3)] = src.x;
        a[(r + 1, 4)] = src.y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -src.x * dst.y;
        a[(r + 1, 7)] = -src.y * dst.y;
        b[r + 1] = dst.y;
    }

    let h = a
        .lu()
        .solve(&b)
        .ok_or(CalibrationError::SingularTransform)?;

    let matrix = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
    if matrix.determinant().abs() < SINGULARITY_EPS {
        return Err(CalibrationError::SingularTransform);
    }

    Ok(matrix)
}

fn validate_side(side: &'static str, points: &[NormPoint]) -> Result<(), CalibrationError> {
    if points.len() != REQUIRED_POINTS {
        return Err(CalibrationError::WrongPointCount {
            side,
            expected: REQUIRED_POINTS,
            actual: points.len(),
        });
    }

    for (index, point) in points.iter().enumerate() {
        if !point.is_normalized() {
            return Err(CalibrationError::PointOutOfRange { side, index });
        }
    }

    // Any collinear triple among the four points collapses the system.
    for a in 0..REQUIRED_POINTS {
        for b in (a + 1)..REQUIRED_POINTS {
            for c in (b + 1)..REQUIRED_POINTS {
                let (pa, pb, pc) = (points[a], points[b], points[c]);
                let cross = (pb.x - pa.x) * (pc.y - pa.y) - (pb.y - pa.y) * (pc.x - pa.x);
                if cross.abs() < COLLINEARITY_EPS {
                    return Err(CalibrationError::CollinearPoints { side, a, b, c });
                }
            }
        }
    }

    Ok(())
}
