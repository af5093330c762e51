//! Token issuance, validation and revocation.
//!
//! - [`claims`] - JWT claim set and subject identity
//! - [`registry`] - revocation entries and single-session markers
//! - [`service`] - HS256 issuer/validator over the realm registry

pub mod claims;
pub mod registry;
pub mod service;

pub use claims::{SubjectInfo, TokenClaims};
pub use registry::SessionRegistry;
pub use service::TokenService;
