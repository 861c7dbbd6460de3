//! HS256 token issuance and validation.
//!
//! Tokens are signed, self-contained, and carry an expiry. There is no
//! server-side session or revocation list: once issued, a token is valid
//! until its stated expiry, and a compromised token can only be cut off by
//! rotating the secret. Access and refresh tokens share the claim shape and
//! differ only in lifetime and the `kind` claim; the refresh endpoint
//! rejects access tokens and vice versa.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use coldwatch_core::Role;

/// Which half of the token pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every coldwatch token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: a user email or `device:<id>`.
    pub sub: String,
    pub role: Role,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Token validation failures. All of them map to Unauthorized at the API
/// boundary, never to an internal error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            other => TokenError::Malformed(format!("{:?}", other)),
        }
    }
}

/// Configuration for the token service.
///
/// Lifetimes are signed seconds; a negative lifetime produces an
/// already-expired token, which the tests use to exercise the expiry path
/// without sleeping.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// An issued access/refresh pair, as returned by login and refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds, for the response body.
    pub expires_in: i64,
}

/// Issues and validates tokens. Pure function of the secret and the clock;
/// requires no synchronization.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    pub fn issue_access(&self, subject: &str, role: Role) -> Result<String, TokenError> {
        self.issue(subject, role, TokenKind::Access, self.access_ttl_secs)
    }

    pub fn issue_refresh(&self, subject: &str, role: Role) -> Result<String, TokenError> {
        self.issue(subject, role, TokenKind::Refresh, self.refresh_ttl_secs)
    }

    /// Issue a fresh access+refresh pair for a subject.
    pub fn issue_pair(&self, subject: &str, role: Role) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access(subject, role)?,
            refresh_token: self.issue_refresh(subject, role)?,
            expires_in: self.access_ttl_secs,
        })
    }

    fn issue(
        &self,
        subject: &str,
        role: Role,
        kind: TokenKind,
        ttl_secs: i64,
    ) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            kind,
            iat: now,
            exp: now + ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(Into::into)
    }

    /// Validate signature and expiry, and check the token is of the expected
    /// kind. Every failure is classified; none degrades to "valid but
    /// unauthenticated".
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // jsonwebtoken defaults to 60s of expiry leeway; expiry here is exact.
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if data.claims.kind != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&TokenConfig {
            secret: "test-secret-key".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86_400,
        })
    }

    #[test]
    fn access_token_round_trips_subject_and_role() {
        let svc = service();
        let token = svc.issue_access("user@test.com", Role::Operator).unwrap();
        let claims = svc.validate(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "user@test.com");
        assert_eq!(claims.role, Role::Operator);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn expired_token_is_classified_as_expired() {
        let svc = TokenService::new(&TokenConfig {
            secret: "test-secret-key".to_string(),
            access_ttl_secs: -60,
            refresh_ttl_secs: 86_400,
        });
        let token = svc.issue_access("user@test.com", Role::Admin).unwrap();
        let err = svc.validate(&token, TokenKind::Access).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn wrong_secret_is_classified_as_signature_invalid() {
        let token = service().issue_access("user@test.com", Role::Admin).unwrap();
        let other = TokenService::new(&TokenConfig {
            secret: "a-different-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86_400,
        });
        let err = other.validate(&token, TokenKind::Access).unwrap_err();
        assert_eq!(err, TokenError::SignatureInvalid);
    }

    #[test]
    fn garbage_is_classified_as_malformed() {
        let err = service()
            .validate("not.a.token", TokenKind::Access)
            .unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn access_token_is_rejected_on_the_refresh_path() {
        let svc = service();
        let token = svc.issue_access("user@test.com", Role::Admin).unwrap();
        let err = svc.validate(&token, TokenKind::Refresh).unwrap_err();
        assert_eq!(
            err,
            TokenError::WrongKind {
                expected: TokenKind::Refresh
            }
        );
    }

    #[test]
    fn pair_carries_access_lifetime() {
        let pair = service().issue_pair("user@test.com", Role::Admin).unwrap();
        assert_eq!(pair.expires_in, 900);
        assert_ne!(pair.access_token, pair.refresh_token);
    }
}
