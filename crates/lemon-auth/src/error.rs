//! Authentication and authorization error types.
//!
//! Per-request outcomes (a token that fails validation, a missing
//! permission) are not errors: the public operations return `Option` or
//! `bool` for those. [`AuthError`] is reserved for configuration problems,
//! storage failures and the opaque 401/403 outcomes produced by the
//! middleware. [`Rejection`] carries the internal reason a token was refused
//! and is only ever logged.

use std::fmt;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No realm matches the requested name.
    #[error("Realm not found: {name}")]
    RealmNotFound {
        /// The requested realm name.
        name: String,
    },

    /// A token could not be signed.
    #[error("Token encoding failed: {message}")]
    TokenEncoding {
        /// Description of the encoding failure.
        message: String,
    },

    /// The request lacks valid authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Server-side description; never sent to the client.
        message: String,
    },

    /// The authenticated subject lacks the required permission.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Server-side description; never sent to the client.
        message: String,
    },

    /// The request is malformed.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Description of what is wrong with the request.
        message: String,
    },

    /// An error occurred while reading or writing the subject store.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `RealmNotFound` error.
    #[must_use]
    pub fn realm_not_found(name: impl Into<String>) -> Self {
        Self::RealmNotFound { name: name.into() }
    }

    /// Creates a new `TokenEncoding` error.
    #[must_use]
    pub fn token_encoding(message: impl Into<String>) -> Self {
        Self::TokenEncoding {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `BadRequest` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the caller failed to authenticate.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns true if the caller is authenticated but not allowed.
    #[must_use]
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Returns true if this error is the client's fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::Forbidden { .. } | Self::BadRequest { .. }
        )
    }

    /// Returns true if this error originates on the server.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the error category for logging and monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RealmNotFound { .. } => ErrorCategory::Configuration,
            Self::TokenEncoding { .. } => ErrorCategory::Token,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::BadRequest { .. } => ErrorCategory::Validation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of authentication/authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Identity could not be established.
    Authentication,
    /// Identity established but access denied.
    Authorization,
    /// Token creation problems.
    Token,
    /// Request validation errors.
    Validation,
    /// Storage or cache failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

// =============================================================================
// Rejection reasons
// =============================================================================

/// Why a token was refused.
///
/// Callers only ever see "invalid"; the reason is written to debug logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("issuer mismatch")]
    InvalidIssuer,

    #[error("audience mismatch")]
    InvalidAudience,

    #[error("token expired")]
    Expired,

    #[error("missing claim: {0}")]
    MissingClaim(&'static str),

    #[error("token revoked")]
    Revoked,

    #[error("token superseded by a newer session")]
    Superseded,

    #[error("subject is inactive")]
    InactiveSubject,

    #[error("session state unavailable")]
    Unavailable,
}

impl From<jsonwebtoken::errors::Error> for Rejection {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
                "exp" => Self::MissingClaim("exp"),
                "iss" => Self::MissingClaim("iss"),
                "aud" => Self::MissingClaim("aud"),
                _ => Self::Malformed(err.to_string()),
            },
            _ => Self::Malformed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::realm_not_found("portal");
        assert_eq!(err.to_string(), "Realm not found: portal");

        let err = AuthError::unauthorized("missing token");
        assert_eq!(err.to_string(), "Unauthorized: missing token");
    }

    #[test]
    fn test_client_and_server_errors() {
        assert!(AuthError::unauthorized("x").is_client_error());
        assert!(AuthError::forbidden("x").is_client_error());
        assert!(AuthError::bad_request("x").is_client_error());

        assert!(AuthError::storage("x").is_server_error());
        assert!(AuthError::configuration("x").is_server_error());
        assert!(AuthError::realm_not_found("x").is_server_error());
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            AuthError::unauthorized("x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::forbidden("x").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            AuthError::storage("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }

    #[test]
    fn test_rejection_from_jwt_error() {
        use jsonwebtoken::errors::{Error, ErrorKind};

        assert_eq!(
            Rejection::from(Error::from(ErrorKind::InvalidSignature)),
            Rejection::InvalidSignature
        );
        assert_eq!(
            Rejection::from(Error::from(ErrorKind::InvalidAudience)),
            Rejection::InvalidAudience
        );
        assert!(matches!(
            Rejection::from(Error::from(ErrorKind::InvalidToken)),
            Rejection::Malformed(_)
        ));
    }
}
