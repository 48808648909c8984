//! HTTP error mapping
//!
//! Every pipeline failure is reported as a single `{"detail": ...}`
//! response carrying the original error text; only the not-found and
//! access-denied cases get their own status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sculpt_core::SculptError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Sculpt(SculptError),
    BadRequest(String),
    Internal(String),
}

impl From<SculptError> for ApiError {
    fn from(err: SculptError) -> Self {
        ApiError::Sculpt(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Sculpt(err) => (status_for(&err), err.to_string()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

fn status_for(err: &SculptError) -> StatusCode {
    match err {
        SculptError::NotFound(_) => StatusCode::NOT_FOUND,
        SculptError::Forbidden(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
