pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod jwks;
pub mod permissions;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod verifier;

pub use claims::Claims;
pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use extractors::{extract_bearer_token, Authorized};
pub use guards::AuthGuard;
pub use jwks::{Jwk, JwkSet, JwksFetcher, KeyResolver};
pub use permissions::{check_permissions, NoPermission, RequiredPermission};
pub use verifier::JwtVerifier;
