use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use tracker_core::TrackerError;
use tracker_types::api::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] TrackerError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected(TrackerError::TimelineNotFound) => StatusCode::NOT_FOUND,
            ApiError::Rejected(TrackerError::NotAuthorized) => StatusCode::FORBIDDEN,
            ApiError::Rejected(TrackerError::AlreadyClaimed | TrackerError::EmailInUse) => {
                StatusCode::CONFLICT
            }
            ApiError::Rejected(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Rejected(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal(e) = &self {
            error!("Request failed: {:#}", e);
        }

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
