//! Per-route authentication, permission and audit policy.
//!
//! Routes are described up front in a [`RouteTable`] instead of being
//! annotated on handlers:
//!
//! ```ignore
//! let routes = RouteTable::new()
//!     .route(Method::POST, "/admin/auth/login", RoutePolicy::public())
//!     .route(
//!         Method::DELETE,
//!         "/admin/users/{id}",
//!         RoutePolicy::required()
//!             .permission("system.user.delete")
//!             .audit("Delete user"),
//!     );
//! ```
//!
//! Unlisted routes fall back to the table default, which requires
//! authentication.

use axum::http::Method;

/// Whether a route needs a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthRequirement {
    #[default]
    Required,
    Skip,
}

/// Policy attached to one route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutePolicy {
    pub auth: AuthRequirement,
    /// Realm to validate against; otherwise derived from the path.
    pub realm: Option<String>,
    /// Permission the caller must hold.
    pub permission: Option<String>,
    /// Audit description; when set, requests are written to the operation log.
    pub description: Option<String>,
}

impl RoutePolicy {
    /// Authenticated route.
    pub fn required() -> Self {
        Self::default()
    }

    /// Route open to anonymous callers.
    pub fn public() -> Self {
        Self {
            auth: AuthRequirement::Skip,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    #[must_use]
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    #[must_use]
    pub fn audit(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn requires_auth(&self) -> bool {
        self.auth == AuthRequirement::Required
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Rest,
}

/// Axum-style path template: `/users/{id}`, `/files/{*path}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(source: &str) -> Self {
        let segments = split_path(source)
            .map(|segment| {
                if segment.starts_with("{*") && segment.ends_with('}') {
                    Segment::Rest
                } else if segment.starts_with('{') && segment.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();
        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = split_path(path);
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Param => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(literal) => {
                    if parts.next() != Some(literal.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// First non-empty path segment, used as the realm name.
pub fn first_segment(path: &str) -> Option<&str> {
    split_path(path).next()
}

#[derive(Debug, Clone)]
struct RouteEntry {
    method: Option<Method>,
    pattern: PathPattern,
    policy: RoutePolicy,
}

/// Ordered route policies. The first matching entry wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    fallback: RoutePolicy,
}

impl RouteTable {
    /// Empty table whose fallback requires authentication.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fallback(mut self, policy: RoutePolicy) -> Self {
        self.fallback = policy;
        self
    }

    /// Add a policy for one method.
    #[must_use]
    pub fn route(mut self, method: Method, pattern: &str, policy: RoutePolicy) -> Self {
        self.entries.push(RouteEntry {
            method: Some(method),
            pattern: PathPattern::parse(pattern),
            policy,
        });
        self
    }

    /// Add a policy for every method.
    #[must_use]
    pub fn any(mut self, pattern: &str, policy: RoutePolicy) -> Self {
        self.entries.push(RouteEntry {
            method: None,
            pattern: PathPattern::parse(pattern),
            policy,
        });
        self
    }

    /// Policy for a request.
    ///
    /// `matched` is the router template (axum's `MatchedPath`) when known;
    /// it is compared verbatim before `path` is matched segment by segment.
    pub fn lookup(&self, method: &Method, matched: Option<&str>, path: &str) -> &RoutePolicy {
        let method_ok =
            |entry: &&RouteEntry| entry.method.as_ref().is_none_or(|m| m == method);

        if let Some(template) = matched
            && let Some(entry) = self
                .entries
                .iter()
                .filter(method_ok)
                .find(|entry| entry.pattern.as_str() == template)
        {
            return &entry.policy;
        }

        self.entries
            .iter()
            .filter(method_ok)
            .find(|entry| entry.pattern.matches(path))
            .map(|entry| &entry.policy)
            .unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
