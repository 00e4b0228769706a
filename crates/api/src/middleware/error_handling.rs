//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and a uniform JSON body:
//!
//! ```json
//! { "error": "Room is already booked for this time period", "code": "ROOM_CONFLICT" }
//! ```
//!
//! Storage and internal faults are logged in full and reported to the client
//! with a generic message only.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use timetable_core::errors::{TimeError, ValidationError};
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// Handlers return `Result<_, AppError>` and use `?` on anything producing a
/// `TimeError`.
#[derive(Debug)]
pub struct AppError(pub TimeError);

pub fn status_for(err: &TimeError) -> StatusCode {
    match err {
        TimeError::NotFound(_) => StatusCode::NOT_FOUND,
        TimeError::Validation(_) | TimeError::NotADoctor | TimeError::InvalidRoom(_) => {
            StatusCode::BAD_REQUEST
        }
        TimeError::RoomConflict
        | TimeError::DoctorConflict
        | TimeError::SlotTaken
        | TimeError::TimetableLocked => StatusCode::CONFLICT,
        TimeError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        TimeError::Authentication(_) => StatusCode::UNAUTHORIZED,
        TimeError::Authorization(_) => StatusCode::FORBIDDEN,
        TimeError::Database(_) | TimeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        let message = if self.0.is_client_facing() {
            self.0.to_string()
        } else {
            error!("Request failed: {:?}", self.0);
            "Internal server error".to_string()
        };
        let body = Json(json!({ "error": message, "code": self.0.code() }));

        (status, body).into_response()
    }
}

impl From<TimeError> for AppError {
    fn from(err: TimeError) -> Self {
        AppError(err)
    }
}

/// Automatic conversion from eyre::Report to AppError
///
/// Wraps the report in a `TimeError::Database` variant.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(TimeError::Database(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        malformed(rejection.body_text())
    }
}

fn malformed(detail: String) -> AppError {
    AppError(TimeError::Validation(ValidationError::Malformed(detail)))
}

/// Maps a TimeError to an HTTP response
pub fn map_error(err: TimeError) -> Response {
    AppError(err).into_response()
}
