//! JWT claim set.

use serde::{Deserialize, Serialize};

/// Claims carried by every issued token.
///
/// `sub` and `jti` default to empty when absent so that a foreign token
/// missing them is rejected by the validator rather than by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier.
    #[serde(default)]
    pub sub: String,

    /// Unique token identifier (UUID v4).
    #[serde(default)]
    pub jti: String,

    /// Issued at (unix seconds).
    #[serde(default)]
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,

    pub iss: String,

    pub aud: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl TokenClaims {
    /// Seconds of validity left at `now`; zero or negative once expired.
    pub fn remaining_secs(&self, now: i64) -> i64 {
        self.exp.saturating_sub(now)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }

    pub fn subject(&self) -> SubjectInfo {
        SubjectInfo {
            id: self.sub.clone(),
            username: self.username.clone(),
            nickname: self.nickname.clone(),
        }
    }
}

/// Identity of an authenticated subject.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub id: String,
    pub username: Option<String>,
    pub nickname: Option<String>,
}

impl SubjectInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the username; an empty value clears it.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = non_empty(username.into());
        self
    }

    /// Sets the nickname; an empty value clears it.
    #[must_use]
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = non_empty(nickname.into());
        self
    }

    /// The subject id as a positive integer, if it is one.
    pub fn numeric_id(&self) -> Option<i64> {
        self.id.parse::<i64>().ok().filter(|id| *id > 0)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

impl From<&str> for SubjectInfo {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubjectInfo {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<i64> for SubjectInfo {
    fn from(id: i64) -> Self {
        Self::new(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_fields_skipped_when_absent() {
        let claims = TokenClaims {
            sub: "42".to_string(),
            jti: "j".to_string(),
            iat: 10,
            exp: 20,
            iss: "lemon".to_string(),
            aud: "lemon-admin".to_string(),
            username: None,
            nickname: Some("Bob".to_string()),
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("username").is_none());
        assert_eq!(json["nickname"], "Bob");
    }

    #[test]
    fn test_expiry_boundary() {
        let claims: TokenClaims =
            serde_json::from_str(r#"{"exp":100,"iss":"i","aud":"a"}"#).unwrap();
        assert!(claims.sub.is_empty());
        assert!(!claims.is_expired(99));
        assert!(claims.is_expired(100));
        assert_eq!(claims.remaining_secs(40), 60);
    }

    #[test]
    fn test_subject_builders() {
        let subject = SubjectInfo::from(42)
            .with_username("admin")
            .with_nickname("");
        assert_eq!(subject.id, "42");
        assert_eq!(subject.username.as_deref(), Some("admin"));
        assert_eq!(subject.nickname, None);
        assert_eq!(subject.numeric_id(), Some(42));

        assert_eq!(SubjectInfo::from("0").numeric_id(), None);
        assert_eq!(SubjectInfo::from("abc").numeric_id(), None);
    }
}
