//! API error handling
//!
//! Adapts registry errors to HTTP responses. The status code mapping
//! lives on `RegistryError` itself; this wrapper only carries it across
//! the axum boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::api::responses::ErrorResponse;
use crate::error::RegistryError;

/// API error
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] RegistryError);

impl ApiError {
    /// Create a not found error
    pub fn not_found(message: &str) -> Self {
        Self(RegistryError::EntityNotFound(message.to_string()))
    }

    /// Create an internal error
    pub fn internal(message: &str) -> Self {
        Self(RegistryError::internal(message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(ErrorResponse {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
            status_code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing = ApiError::not_found("http://onto-ns.com/meta/0.1/Person");
        assert_eq!(
            missing.into_response().status(),
            StatusCode::NOT_FOUND
        );

        let internal = ApiError::internal("boom");
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
