use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::guards::AuthGuard;
use crate::permissions::RequiredPermission;

/// Raw bearer token from the `Authorization` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> AuthResult<String> {
    let header_value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;
    let raw = header_value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization("Authorization header is not valid text."))?;

    let parts: Vec<&str> = raw.split_whitespace().collect();
    let [scheme, token] = parts.as_slice() else {
        return Err(AuthError::InvalidAuthorization(
            "Authorization header must be in the form 'Bearer <token>'.",
        ));
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthorization(
            "Authorization header must start with 'Bearer'.",
        ));
    }

    Ok((*token).to_owned())
}

/// Verified claims for a request whose token carries permission `P`.
#[derive(Debug, Clone)]
pub struct Authorized<P> {
    pub claims: Claims,
    _permission: PhantomData<fn() -> P>,
}

impl<P> Authorized<P> {
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

#[async_trait]
impl<S, P> FromRequestParts<S> for Authorized<P>
where
    Arc<AuthGuard>: FromRef<S>,
    S: Send + Sync,
    P: RequiredPermission,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = Arc::<AuthGuard>::from_ref(state);
        let claims = guard.authorize(&parts.headers, P::PERMISSION).await?;

        Ok(Self {
            claims,
            _permission: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn accepts_bearer_token_unmodified() {
        let token = extract_bearer_token(&headers("Bearer abc.def.ghi")).expect("token");
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let token = extract_bearer_token(&headers("bEaReR abc.def.ghi")).expect("token");
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn missing_header_is_missing_authorization() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err, AuthError::MissingAuthorization);
        assert_eq!(err.code(), "missing_authorization_header");
        assert_eq!(err.status().as_u16(), 401);
    }

    #[test]
    fn rejects_wrong_part_counts_and_schemes() {
        for value in ["", "Bearer", "Bearer    ", "Bearer a b", "Basic abc123", "Token abc"] {
            let err = extract_bearer_token(&headers(value)).unwrap_err();
            assert_eq!(err.code(), "invalid_header", "header {value:?}");
            assert_eq!(err.status().as_u16(), 401, "header {value:?}");
        }
    }

    #[test]
    fn rejects_non_text_header() {
        let mut map = HeaderMap::new();
        map.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").expect("opaque bytes"),
        );
        let err = extract_bearer_token(&map).unwrap_err();
        assert!(matches!(err, AuthError::InvalidAuthorization(_)));
    }
}
