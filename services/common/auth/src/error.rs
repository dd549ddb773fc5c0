use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common_http_errors::error_response;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Every way a protected request can be rejected. Statuses are limited to 400, 401 and 403.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingAuthorization,
    #[error("{0}")]
    InvalidAuthorization(&'static str),
    #[error("Authorization malformed.")]
    MissingKeyId,
    #[error("Unable to find the appropriate key.")]
    UnknownKeyId(String),
    #[error("Unable to parse authentication token.")]
    Unparseable(String),
    #[error("Token expired.")]
    TokenExpired,
    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims(String),
    #[error("Permissions not included in JWT.")]
    MissingPermissions,
    #[error("Permission not found.")]
    InvalidPermissions(String),
    #[error("Unable to retrieve signing keys.")]
    JwksUnavailable(String),
}

impl AuthError {
    /// Machine-readable code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization => "missing_authorization_header",
            AuthError::InvalidAuthorization(_)
            | AuthError::MissingKeyId
            | AuthError::UnknownKeyId(_)
            | AuthError::Unparseable(_) => "invalid_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::MissingPermissions => "missing_permissions",
            AuthError::InvalidPermissions(_) => "invalid_permissions",
            AuthError::JwksUnavailable(_) => "jwks_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthorization
            | AuthError::InvalidAuthorization(_)
            | AuthError::MissingKeyId
            | AuthError::TokenExpired
            | AuthError::InvalidClaims(_) => StatusCode::UNAUTHORIZED,
            AuthError::UnknownKeyId(_)
            | AuthError::Unparseable(_)
            | AuthError::MissingPermissions
            | AuthError::JwksUnavailable(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidPermissions(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Human-readable description; never includes the internal detail some variants carry.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match value.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims(value.to_string()),
            _ => AuthError::Unparseable(value.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.code(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::{Error as JwtError, ErrorKind};

    #[test]
    fn statuses_stay_within_auth_range() {
        let all = [
            AuthError::MissingAuthorization,
            AuthError::InvalidAuthorization("Authorization header must be bearer token."),
            AuthError::MissingKeyId,
            AuthError::UnknownKeyId("kid".into()),
            AuthError::Unparseable("bad".into()),
            AuthError::TokenExpired,
            AuthError::InvalidClaims("aud".into()),
            AuthError::MissingPermissions,
            AuthError::InvalidPermissions("delete:drinks".into()),
            AuthError::JwksUnavailable("timeout".into()),
        ];
        for err in all {
            let status = err.status().as_u16();
            assert!(matches!(status, 400 | 401 | 403), "{err:?} -> {status}");
        }
    }

    #[test]
    fn jwt_error_kinds_map_to_taxonomy() {
        let expired: AuthError = JwtError::from(ErrorKind::ExpiredSignature).into();
        assert_eq!(expired.code(), "token_expired");
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let audience: AuthError = JwtError::from(ErrorKind::InvalidAudience).into();
        assert_eq!(audience.code(), "invalid_claims");
        assert_eq!(audience.status(), StatusCode::UNAUTHORIZED);

        let issuer: AuthError = JwtError::from(ErrorKind::InvalidIssuer).into();
        assert_eq!(issuer.code(), "invalid_claims");

        let signature: AuthError = JwtError::from(ErrorKind::InvalidSignature).into();
        assert_eq!(signature.code(), "invalid_header");
        assert_eq!(signature.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn description_hides_internal_detail() {
        let err = AuthError::Unparseable("InvalidSignature at byte 42".into());
        assert_eq!(err.description(), "Unable to parse authentication token.");
    }

    #[test]
    fn response_carries_code_header() {
        let resp = AuthError::InvalidPermissions("delete:drinks".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            resp.headers().get("X-Error-Code").unwrap(),
            "invalid_permissions"
        );
    }
}
