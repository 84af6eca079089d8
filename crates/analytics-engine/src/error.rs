use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::{self, Display};

pub const INVALID_CALIBRATION: &str = "INVALID_CALIBRATION";
pub const PROJECTION_UNAVAILABLE: &str = "PROJECTION_UNAVAILABLE";
pub const QUERY_PARAMETER_INVALID: &str = "QUERY_PARAMETER_INVALID";
pub const INTERNAL: &str = "INTERNAL";

/// API-surface error carrying a machine-readable code alongside the message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn invalid_calibration(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, INVALID_CALIBRATION, message)
    }

    pub fn projection_unavailable() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROJECTION_UNAVAILABLE,
            "no valid calibration profile is active",
        )
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, QUERY_PARAMETER_INVALID, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL, message)
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.code,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.code, self.message, self.status)
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    error: String,
}
