use std::future::Future;

use axum::http::HeaderMap;
use tracing::{debug, warn};

use crate::claims::Claims;
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::extractors::extract_bearer_token;
use crate::jwks::KeyResolver;
use crate::permissions::check_permissions;
use crate::verifier::JwtVerifier;

/// Extract, verify, then check permissions, stopping at the first failure.
pub struct AuthGuard {
    resolver: KeyResolver,
    verifier: JwtVerifier,
}

impl AuthGuard {
    pub fn new(resolver: KeyResolver, verifier: JwtVerifier) -> Self {
        Self { resolver, verifier }
    }

    pub fn from_config(config: AuthConfig) -> AuthResult<Self> {
        let resolver = KeyResolver::from_config(&config)?;
        Ok(Self::new(resolver, JwtVerifier::new(config)))
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    pub fn verifier(&self) -> &JwtVerifier {
        &self.verifier
    }

    /// Verify `token` against the provider's current keys.
    pub async fn verify_token(&self, token: &str) -> AuthResult<Claims> {
        let keys = self.resolver.resolve().await?;
        match self.verifier.verify(token, &keys) {
            Err(AuthError::UnknownKeyId(kid)) if self.resolver.is_caching() => {
                // cached set may predate a key rotation
                match self.resolver.refresh_for_unknown_kid().await? {
                    Some(keys) => {
                        debug!(kid = %kid, "kid not in cached JWKS, refetched");
                        self.verifier.verify(token, &keys)
                    }
                    None => {
                        debug!(kid = %kid, "kid not in cached JWKS, refetch throttled");
                        Err(AuthError::UnknownKeyId(kid))
                    }
                }
            }
            result => result,
        }
    }

    pub async fn authorize(&self, headers: &HeaderMap, permission: &str) -> AuthResult<Claims> {
        let result = self.run_checks(headers, permission).await;

        if let Err(err) = &result {
            match err {
                AuthError::JwksUnavailable(_) => {
                    warn!(code = err.code(), permission, "request rejected: signing keys unavailable")
                }
                _ => debug!(code = err.code(), detail = ?err, permission, "request rejected"),
            }
        }
        result
    }

    async fn run_checks(&self, headers: &HeaderMap, permission: &str) -> AuthResult<Claims> {
        let token = extract_bearer_token(headers)?;
        let claims = self.verify_token(&token).await?;
        check_permissions(permission, &claims)?;
        Ok(claims)
    }

    /// Run `operation` with the verified claims, or return the rejection without running it.
    pub async fn protect<F, Fut, T>(
        &self,
        headers: &HeaderMap,
        permission: &str,
        operation: F,
    ) -> AuthResult<T>
    where
        F: FnOnce(Claims) -> Fut,
        Fut: Future<Output = T>,
    {
        let claims = self.authorize(headers, permission).await?;
        Ok(operation(claims).await)
    }
}
