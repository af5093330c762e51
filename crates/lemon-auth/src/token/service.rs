//! HS256 token issuer and validator.
//!
//! ## Token lifecycle
//!
//! ```text
//! Issued ──► Valid ──► Expired  (now >= exp)
//!              └─────► Revoked  (revocation entry, or superseded under SSO)
//! ```
//!
//! ## Validation order
//!
//! 1. Signature, issuer and audience (no clock skew)
//! 2. Expiry against the injected [`Clock`]
//! 3. `jti` and `sub` present
//! 4. Not revoked
//! 5. SSO realms: `jti` matches the registered session
//! 6. Subject not in the realm's inactive list
//!
//! Every failure is reported as `None`; the reason is logged at debug level.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, Header, decode, encode};
use lemon_cache::HybridCache;
use uuid::Uuid;

use super::claims::{SubjectInfo, TokenClaims};
use super::registry::SessionRegistry;
use crate::AuthResult;
use crate::clock::Clock;
use crate::error::{AuthError, Rejection};
use crate::inactive::InactiveSubjectGate;
use crate::realm::{Realm, RealmRegistry};

/// Issues, validates and revokes tokens across all realms.
#[derive(Clone)]
pub struct TokenService {
    realms: Arc<RealmRegistry>,
    sessions: SessionRegistry,
    inactive: InactiveSubjectGate,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(
        realms: Arc<RealmRegistry>,
        cache: HybridCache,
        inactive: InactiveSubjectGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            realms,
            sessions: SessionRegistry::new(cache),
            inactive,
            clock,
        }
    }

    pub fn realms(&self) -> &RealmRegistry {
        &self.realms
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn inactive_gate(&self) -> &InactiveSubjectGate {
        &self.inactive
    }

    // =========================================================================
    // Issuance
    // =========================================================================

    /// Sign a new token for `subject` in `realm` (default realm when `None`).
    ///
    /// In SSO realms the new token id replaces the subject's registered
    /// session, which invalidates every earlier token of that subject.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RealmNotFound` for an unknown realm and
    /// `AuthError::TokenEncoding` if signing fails.
    pub async fn generate_token(
        &self,
        subject: impl Into<SubjectInfo>,
        realm: Option<&str>,
    ) -> AuthResult<String> {
        let subject = subject.into();
        let realm = self.realms.resolve(realm)?;

        let now = self.clock.now_unix();
        let lifetime = realm.lifetime();
        let claims = TokenClaims {
            sub: subject.id.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX)),
            iss: realm.issuer().to_string(),
            aud: realm.audience().to_string(),
            username: subject.username.filter(|value| !value.is_empty()),
            nickname: subject.nickname.filter(|value| !value.is_empty()),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, realm.encoding_key())
            .map_err(|e| AuthError::token_encoding(e.to_string()))?;

        if realm.sso_enabled()
            && !self
                .sessions
                .register_session(realm.name(), &claims.sub, &claims.jti, lifetime)
                .await
        {
            tracing::warn!(realm = %realm.name(), subject = %claims.sub, "failed to register session");
        }

        tracing::debug!(realm = %realm.name(), subject = %claims.sub, jti = %claims.jti, "token issued");
        Ok(token)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate `token` and return its subject, or `None` if it must be
    /// refused for any reason.
    ///
    /// # Errors
    ///
    /// Only configuration problems (unknown realm) are errors.
    pub async fn validate_and_get_subject(
        &self,
        token: &str,
        realm: Option<&str>,
    ) -> AuthResult<Option<SubjectInfo>> {
        let realm = self.realms.resolve(realm)?;
        match self.check(token, realm).await {
            Ok(subject) => Ok(Some(subject)),
            Err(rejection) => {
                tracing::debug!(realm = %realm.name(), reason = %rejection, "token rejected");
                Ok(None)
            }
        }
    }

    async fn check(&self, token: &str, realm: &Realm) -> Result<SubjectInfo, Rejection> {
        let claims = self.decode_claims(token, realm)?;

        if claims.is_expired(self.clock.now_unix()) {
            return Err(Rejection::Expired);
        }
        if claims.jti.is_empty() {
            return Err(Rejection::MissingClaim("jti"));
        }
        if claims.sub.is_empty() {
            return Err(Rejection::MissingClaim("sub"));
        }

        let revoked = self
            .sessions
            .is_revoked(realm.name(), &claims.jti)
            .await
            .map_err(|e| unavailable(realm, &e))?;
        if revoked {
            return Err(Rejection::Revoked);
        }

        if realm.sso_enabled() {
            let current = self
                .sessions
                .is_current_session(realm.name(), &claims.sub, &claims.jti)
                .await
                .map_err(|e| unavailable(realm, &e))?;
            if !current {
                return Err(Rejection::Superseded);
            }
        }

        if self.inactive.is_inactive(&claims.sub, realm.name()).await {
            return Err(Rejection::InactiveSubject);
        }

        Ok(claims.subject())
    }

    /// Verify signature, issuer and audience. Expiry is left to the caller.
    fn decode_claims(&self, token: &str, realm: &Realm) -> Result<TokenClaims, Rejection> {
        let data = decode::<TokenClaims>(token, realm.decoding_key(), realm.validation())?;
        Ok(data.claims)
    }

    // =========================================================================
    // Revocation
    // =========================================================================

    /// Revoke `token` until its natural expiry.
    ///
    /// Superseded tokens and tokens of inactive subjects can still be
    /// revoked. An already-expired token needs no entry and reports success.
    /// Returns `false` for a token that does not verify.
    ///
    /// # Errors
    ///
    /// Only configuration problems (unknown realm) are errors.
    pub async fn revoke_token(&self, token: &str, realm: Option<&str>) -> AuthResult<bool> {
        let realm = self.realms.resolve(realm)?;

        let claims = match self.decode_claims(token, realm) {
            Ok(claims) => claims,
            Err(rejection) => {
                tracing::debug!(realm = %realm.name(), reason = %rejection, "cannot revoke token");
                return Ok(false);
            }
        };
        if claims.jti.is_empty() {
            tracing::debug!(realm = %realm.name(), "cannot revoke token without jti");
            return Ok(false);
        }

        let remaining = claims.remaining_secs(self.clock.now_unix());
        let Ok(remaining) = u64::try_from(remaining) else {
            return Ok(true);
        };
        if remaining == 0 {
            return Ok(true);
        }

        let revoked = self
            .sessions
            .revoke(realm.name(), &claims.jti, Duration::from_secs(remaining))
            .await;
        tracing::debug!(realm = %realm.name(), jti = %claims.jti, remaining_secs = remaining, "token revoked");
        Ok(revoked)
    }
}

fn unavailable(realm: &Realm, error: &lemon_cache::CacheError) -> Rejection {
    tracing::warn!(realm = %realm.name(), error = %error, "session registry unavailable, denying token");
    Rejection::Unavailable
}
