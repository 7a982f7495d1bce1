//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use reefhub_domain::error::{ReefHubError, RegistryError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`ReefHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(ReefHubError);

impl From<ReefHubError> for ApiError {
    fn from(err: ReefHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ReefHubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ReefHubError::InvalidConfig(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ReefHubError::NotReversible(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ReefHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ReefHubError::Registry(err @ RegistryError::UnknownSubsystem { .. }) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            ReefHubError::Registry(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ReefHubError::Actuator(err) => {
                tracing::warn!(error = %err, "actuator failure");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ReefHubError::Timeout(err) => (StatusCode::GATEWAY_TIMEOUT, err.to_string()),
            ReefHubError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string()),
            ReefHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
