use std::sync::Arc;

use tracing::info;

use coldwatch_auth::{verify_password, TokenKind, TokenPair, TokenService};
use coldwatch_core::Error;
use coldwatch_storage::TelemetryStore;

/// Login and refresh against the credential store.
///
/// Both paths report the same generic Unauthorized for unknown accounts and
/// bad passwords, so neither can be used to discover which emails exist.
pub struct SessionFlow<S> {
    store: Arc<S>,
    tokens: Arc<TokenService>,
}

impl<S: TelemetryStore> SessionFlow<S> {
    pub fn new(store: Arc<S>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, Error> {
        let user = self
            .store
            .user_by_email(email)
            .await?
            .ok_or_else(invalid_credentials)?;
        let verified = verify_password(password, &user.password_hash)
            .map_err(|e| Error::Internal(e.to_string()))?;
        if !verified {
            return Err(invalid_credentials());
        }
        let pair = self
            .tokens
            .issue_pair(&user.email, user.role)
            .map_err(|e| Error::Internal(e.to_string()))?;
        info!(user = %user.email, "login succeeded");
        Ok(pair)
    }

    /// Exchange a valid refresh token for a fresh pair.
    ///
    /// The presented refresh token stays valid until its own expiry; there
    /// is no rotation or revocation, consistent with the stateless token
    /// model.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        let claims = self
            .tokens
            .validate(refresh_token, TokenKind::Refresh)
            .map_err(|e| Error::Unauthorized(e.to_string()))?;
        // The account must still exist at refresh time.
        let user = self
            .store
            .user_by_email(&claims.sub)
            .await?
            .ok_or_else(invalid_credentials)?;
        self.tokens
            .issue_pair(&user.email, user.role)
            .map_err(|e| Error::Internal(e.to_string()))
    }
}

fn invalid_credentials() -> Error {
    Error::Unauthorized("Invalid email or password".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldwatch_auth::{hash_password, TokenConfig};
    use coldwatch_core::{Role, User};
    use coldwatch_storage::MemoryStore;

    async fn flow(access_ttl_secs: i64) -> SessionFlow<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .add_user(User {
                email: "admin@coldwatch.test".to_string(),
                password_hash: hash_password("s3cret!").unwrap(),
                role: Role::Admin,
            })
            .await;
        let tokens = Arc::new(TokenService::new(&TokenConfig {
            secret: "session-test-secret".to_string(),
            access_ttl_secs,
            refresh_ttl_secs: 86_400,
        }));
        SessionFlow::new(store, tokens)
    }

    #[tokio::test]
    async fn login_issues_a_pair() {
        let flow = flow(900).await;
        let pair = flow.login("admin@coldwatch.test", "s3cret!").await.unwrap();
        assert_eq!(pair.expires_in, 900);
        assert!(!pair.access_token.is_empty());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let flow = flow(900).await;
        let wrong = flow
            .login("admin@coldwatch.test", "nope")
            .await
            .unwrap_err();
        let unknown = flow.login("ghost@coldwatch.test", "nope").await.unwrap_err();
        assert_eq!(wrong, unknown);
        assert!(matches!(wrong, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn refresh_with_refresh_token_issues_new_pair() {
        let flow = flow(900).await;
        let pair = flow.login("admin@coldwatch.test", "s3cret!").await.unwrap();
        let renewed = flow.refresh(&pair.refresh_token).await.unwrap();
        assert!(!renewed.access_token.is_empty());
    }

    #[tokio::test]
    async fn refresh_rejects_an_access_token() {
        let flow = flow(900).await;
        let pair = flow.login("admin@coldwatch.test", "s3cret!").await.unwrap();
        let err = flow.refresh(&pair.access_token).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn refresh_rejects_garbage() {
        let flow = flow(900).await;
        let err = flow.refresh("not-a-token").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
