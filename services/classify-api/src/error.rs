//! Service error type and its JSON rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use classification::ClassifyError;
use geoserver_client::GeoServerError;

/// Errors returned by the HTTP handlers.
///
/// Every variant renders as `{"error": "<message>"}`; the variant only picks
/// the status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request is malformed or inconsistent with the layer.
    #[error("{0}")]
    Validation(String),

    /// GeoServer could not be reached or returned something unusable.
    #[error("cannot fetch layer: {0}")]
    Upstream(String),

    #[error("error classifying data: {0}")]
    Classification(#[from] ClassifyError),

    /// Building the response table failed.
    #[error("cannot prepare data: {0}")]
    Preparation(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Classification(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Preparation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for the `outcome` metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Upstream(_) => "upstream",
            ApiError::Classification(_) => "classification",
            ApiError::Preparation(_) => "preparation",
        }
    }

    /// Render the error, optionally forcing HTTP 200 for older clients.
    pub fn into_response_with(self, legacy_status: bool) -> Response {
        let status = if legacy_status {
            StatusCode::OK
        } else {
            self.status_code()
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

impl From<GeoServerError> for ApiError {
    fn from(err: GeoServerError) -> Self {
        match err {
            GeoServerError::InvalidName { .. } => ApiError::Validation(err.to_string()),
            err if err.is_upstream() => ApiError::Upstream(err.to_string()),
            err => ApiError::Preparation(err.to_string()),
        }
    }
}
