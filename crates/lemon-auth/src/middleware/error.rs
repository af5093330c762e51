//! Error response handling for the auth middleware.
//!
//! Bodies never carry the internal reason; it is logged instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::http::{ApiResponse, ResponseCode};

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = error_details(&self);

        if self.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "request failed");
        } else {
            tracing::debug!(error = %self, category = %self.category(), "request denied");
        }

        ApiResponse::error(code, code.default_message()).into_response_with_status(status)
    }
}

/// Returns (HTTP status, envelope code) for an error.
fn error_details(error: &AuthError) -> (StatusCode, ResponseCode) {
    match error {
        AuthError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, ResponseCode::Unauthorized),
        AuthError::Forbidden { .. } => (StatusCode::FORBIDDEN, ResponseCode::Forbidden),
        AuthError::BadRequest { .. } => (StatusCode::BAD_REQUEST, ResponseCode::BadRequest),
        AuthError::RealmNotFound { .. }
        | AuthError::TokenEncoding { .. }
        | AuthError::Storage { .. }
        | AuthError::Configuration { .. }
        | AuthError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, ResponseCode::Failure)
        }
    }
}
