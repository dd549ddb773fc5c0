use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::claims::Claims;
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwks::{Jwk, JwkSet};

/// Validates signature, issuer, audience and expiry of provider-issued tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    config: AuthConfig,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: AuthConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer()]);
        validation.set_audience(&[config.audience.clone()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = config.leeway_seconds.into();
        Self { config, validation }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Key id the token claims to be signed with, read without verifying anything.
    pub fn key_id(token: &str) -> AuthResult<String> {
        let header =
            decode_header(token).map_err(|err| AuthError::Unparseable(err.to_string()))?;
        header.kid.ok_or(AuthError::MissingKeyId)
    }

    pub fn verify(&self, token: &str, keys: &JwkSet) -> AuthResult<Claims> {
        let kid = Self::key_id(token)?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| AuthError::UnknownKeyId(kid.clone()))?;
        let key = decoding_key(&kid, jwk)?;

        let token_data = decode::<Map<String, Value>>(token, &key, &self.validation)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(kid, subject = ?claims.subject, "verified JWT successfully");
        Ok(claims)
    }
}

fn decoding_key(kid: &str, jwk: &Jwk) -> AuthResult<DecodingKey> {
    if let Some(kty) = jwk.kty.as_deref() {
        if kty != "RSA" {
            return Err(AuthError::Unparseable(format!(
                "key '{kid}' uses unsupported key type '{kty}'"
            )));
        }
    }
    let (Some(modulus), Some(exponent)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        return Err(AuthError::Unparseable(format!(
            "key '{kid}' missing RSA components"
        )));
    };
    DecodingKey::from_rsa_components(modulus, exponent)
        .map_err(|err| AuthError::Unparseable(format!("key '{kid}': {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{KeyMaterial, TokenBuilder};
    use chrono::Utc;

    const DOMAIN: &str = "tenant.auth0.com";
    const AUDIENCE: &str = "coffee_shop";

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(AuthConfig::new(DOMAIN, AUDIENCE))
    }

    fn token() -> TokenBuilder {
        TokenBuilder::new(DOMAIN, AUDIENCE).permissions(["get:drinks-detail"])
    }

    #[test]
    fn accepts_valid_token() {
        let material = KeyMaterial::shared();
        let jwt = token().sign(material);
        let claims = verifier().verify(&jwt, &material.jwk_set()).expect("valid");

        assert_eq!(claims.issuer.as_deref(), Some("https://tenant.auth0.com/"));
        assert_eq!(claims.audience, vec![AUDIENCE.to_string()]);
        assert!(claims.has_permission("get:drinks-detail"));
        assert!(claims.expires_at > Utc::now());
    }

    #[test]
    fn verification_is_repeatable() {
        let material = KeyMaterial::shared();
        let jwt = token().sign(material);
        let keys = material.jwk_set();
        let first = verifier().verify(&jwt, &keys).unwrap();
        let second = verifier().verify(&jwt, &keys).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_kid_is_401_invalid_header() {
        let material = KeyMaterial::shared();
        let jwt = token().without_kid().sign(material);
        let err = verifier().verify(&jwt, &material.jwk_set()).unwrap_err();
        assert_eq!(err, AuthError::MissingKeyId);
        assert_eq!(err.status().as_u16(), 401);
        assert_eq!(err.code(), "invalid_header");
    }

    #[test]
    fn unknown_kid_is_400_invalid_header() {
        let material = KeyMaterial::shared();
        let jwt = token().kid("rotated-away").sign(material);
        let err = verifier().verify(&jwt, &material.jwk_set()).unwrap_err();
        assert!(matches!(err, AuthError::UnknownKeyId(ref kid) if kid == "rotated-away"));
        assert_eq!(err.status().as_u16(), 400);
    }

    #[test]
    fn garbage_token_is_400_invalid_header() {
        let material = KeyMaterial::shared();
        let err = verifier().verify("not-a-jwt", &material.jwk_set()).unwrap_err();
        assert!(matches!(err, AuthError::Unparseable(_)));
        assert_eq!(err.status().as_u16(), 400);
    }

    #[test]
    fn foreign_signature_is_400_invalid_header() {
        let material = KeyMaterial::shared();
        let other = KeyMaterial::generate();
        // signed by a different key but claiming the published kid
        let jwt = token().kid(material.kid()).sign(&other);
        let err = verifier().verify(&jwt, &material.jwk_set()).unwrap_err();
        assert_eq!(err.code(), "invalid_header");
        assert_eq!(err.status().as_u16(), 400);
    }

    #[test]
    fn expired_token_is_401_token_expired() {
        let material = KeyMaterial::shared();
        let jwt = token().expires_in(-3600).sign(material);
        let err = verifier().verify(&jwt, &material.jwk_set()).unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
        assert_eq!(err.status().as_u16(), 401);
    }

    #[test]
    fn wrong_audience_is_401_invalid_claims() {
        let material = KeyMaterial::shared();
        let jwt = token().audience("someone_else").sign(material);
        let err = verifier().verify(&jwt, &material.jwk_set()).unwrap_err();
        assert_eq!(err.code(), "invalid_claims");
        assert_eq!(err.status().as_u16(), 401);
    }

    #[test]
    fn wrong_issuer_is_401_invalid_claims() {
        let material = KeyMaterial::shared();
        let jwt = token().issuer("https://evil.example.com/").sign(material);
        let err = verifier().verify(&jwt, &material.jwk_set()).unwrap_err();
        assert_eq!(err.code(), "invalid_claims");
    }

    #[test]
    fn non_rsa_key_is_rejected() {
        let material = KeyMaterial::shared();
        let mut keys = material.jwk_set();
        keys.keys[0].kty = Some("EC".into());
        let jwt = token().sign(material);
        let err = verifier().verify(&jwt, &keys).unwrap_err();
        assert!(matches!(err, AuthError::Unparseable(_)));
    }
}
