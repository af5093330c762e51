//! # lemon-auth
//!
//! Authentication and authorization core of the Lemon admin backend.
//!
//! This crate provides:
//! - HS256 token issuance and validation over named realms
//! - Revocation and single-session (SSO) registry
//! - Per-realm inactive-subject gate
//! - Permission resolution with flag-based cache invalidation
//! - Axum middleware for authentication, permission checks and audit logs
//!
//! ## Modules
//!
//! - [`config`] - Realm and permission configuration
//! - [`realm`] - Realm registry
//! - [`token`] - Token service and session registry
//! - [`inactive`] - Inactive-subject gate
//! - [`permission`] - Permission resolver
//! - [`storage`] - Storage traits consumed by the core
//! - [`middleware`] - HTTP middleware
//! - [`http`] - Response envelope

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod inactive;
pub mod middleware;
pub mod password;
pub mod permission;
pub mod realm;
pub mod services;
pub mod storage;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, ConfigError, FlagScope, PermissionConfig, RealmConfig};
pub use error::{AuthError, ErrorCategory, Rejection};
pub use http::{ApiResponse, ResponseCode};
pub use inactive::InactiveSubjectGate;
pub use middleware::{AuthState, CurrentUser, RoutePolicy, RouteTable};
pub use permission::PermissionResolver;
pub use realm::{Realm, RealmRegistry};
pub use services::AuthServices;
pub use storage::{
    Account, AccountStore, InMemoryStore, OperationLog, OperationLogSink, SubjectStore,
};
pub use token::{SessionRegistry, SubjectInfo, TokenClaims, TokenService};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
