//! HTTP response envelope shared by the middleware and handlers.

pub mod response;

pub use response::{ApiResponse, ERROR_HEADER, ResponseCode};
