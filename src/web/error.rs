//! HTTP mapping for [`ShareError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::error::ShareError;

/// Error returned by JSON handlers.
#[derive(Debug)]
pub enum ApiError {
    Share(ShareError),
    /// A like toggle for the same (media, user) is still pending.
    Busy,
    /// Malformed request that never reached the domain layer.
    BadRequest(String),
}

impl From<ShareError> for ApiError {
    fn from(err: ShareError) -> Self {
        Self::Share(err)
    }
}

/// Status code for a domain error.
#[must_use]
pub const fn status_for(err: &ShareError) -> StatusCode {
    match err {
        ShareError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ShareError::NotFound(_) => StatusCode::NOT_FOUND,
        ShareError::Unauthorized => StatusCode::UNAUTHORIZED,
        ShareError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
        ShareError::Write(_) | ShareError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log a domain error at a level matching its severity.
pub fn log_share_error(err: &ShareError) {
    match err {
        ShareError::Connectivity(_) | ShareError::Write(_) | ShareError::Query(_) => {
            error!("{err}");
        }
        ShareError::Validation(_) | ShareError::NotFound(_) | ShareError::Unauthorized => {
            warn!("{err}");
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Share(err) => {
                log_share_error(&err);
                (status_for(&err), err.user_message())
            }
            Self::Busy => (
                StatusCode::CONFLICT,
                "Still saving your last change. Please wait a moment.".to_string(),
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
