//! Uniform JSON envelope: `{ "code": i32, "message": str, "data": T | null }`.
//!
//! | Code | Meaning | HTTP status |
//! |------|---------|-------------|
//! | 0 | success | 200 |
//! | 1 | failure | 200 (business) / 500 (server) |
//! | 2 | bad request | 400 |
//! | 1000 | unauthorized | 401 |
//! | 1001 | forbidden | 403 |
//!
//! Every non-zero response carries the [`ERROR_HEADER`] header so that the
//! audit middleware can tell a failed operation from a successful one even
//! when the status is 200.

use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Header marking a response as a failed operation.
pub const ERROR_HEADER: &str = "x-lemon-error";

/// Envelope result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success,
    Failure,
    BadRequest,
    Unauthorized,
    Forbidden,
}

impl ResponseCode {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::BadRequest => 2,
            Self::Unauthorized => 1000,
            Self::Forbidden => 1001,
        }
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::Failure),
            2 => Some(Self::BadRequest),
            1000 => Some(Self::Unauthorized),
            1001 => Some(Self::Forbidden),
            _ => None,
        }
    }

    /// Default HTTP status for the code.
    pub fn status(self) -> StatusCode {
        match self {
            Self::Success | Self::Failure => StatusCode::OK,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Operation failed",
            Self::BadRequest => "Bad request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
        }
    }
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: ResponseCode::Success.as_i32(),
            message: ResponseCode::Success.default_message().to_string(),
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ResponseCode::Success.as_i32()
    }
}

impl ApiResponse<()> {
    /// Success without payload.
    pub fn ok() -> Self {
        Self {
            code: ResponseCode::Success.as_i32(),
            message: ResponseCode::Success.default_message().to_string(),
            data: None,
        }
    }

    pub fn error(code: ResponseCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_i32(),
            message: message.into(),
            data: None,
        }
    }

    /// Business failure (code 1, HTTP 200).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::error(ResponseCode::Failure, message)
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Render with an explicit status instead of the code's default.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let failed = !self.is_success();
        let mut response = (status, Json(self)).into_response();
        if failed {
            response
                .headers_mut()
                .insert(ERROR_HEADER, HeaderValue::from_static("1"));
        }
        response
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = ResponseCode::from_i32(self.code)
            .map(ResponseCode::status)
            .unwrap_or(StatusCode::OK);
        self.into_response_with_status(status)
    }
}
