//! Key and token minting helpers for tests that need real RS256 tokens.

use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Map, Value};

use crate::jwks::{Jwk, JwkSet};

pub const TEST_KID: &str = "test-key";

pub struct KeyMaterial {
    kid: String,
    encoding: EncodingKey,
    modulus: String,
    exponent: String,
}

impl KeyMaterial {
    pub fn generate() -> Self {
        Self::generate_with_kid(TEST_KID)
    }

    pub fn generate_with_kid(kid: &str) -> Self {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let public_key = private_key.to_public_key();
        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private pem");

        Self {
            kid: kid.to_string(),
            encoding: EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key"),
            modulus: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            exponent: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    }

    /// One key pair per test binary; RSA generation is slow in debug builds.
    pub fn shared() -> &'static KeyMaterial {
        static SHARED: OnceLock<KeyMaterial> = OnceLock::new();
        SHARED.get_or_init(KeyMaterial::generate)
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn jwk(&self) -> Jwk {
        Jwk {
            kty: Some("RSA".into()),
            kid: Some(self.kid.clone()),
            key_use: Some("sig".into()),
            alg: Some("RS256".into()),
            n: Some(self.modulus.clone()),
            e: Some(self.exponent.clone()),
        }
    }

    pub fn jwk_set(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.jwk()],
        }
    }

    /// JSON document as served from `/.well-known/jwks.json`.
    pub fn jwks_json(&self) -> String {
        serde_json::to_string(&self.jwk_set()).expect("serialize jwks")
    }
}

/// Builds signed tokens shaped like the ones an Auth0 tenant issues.
#[derive(Clone)]
pub struct TokenBuilder {
    issuer: String,
    audience: String,
    subject: String,
    kid: Option<String>,
    expires_in: i64,
    permissions: Option<Vec<String>>,
    extra: Map<String, Value>,
}

impl TokenBuilder {
    pub fn new(domain: &str, audience: &str) -> Self {
        Self {
            issuer: format!("https://{domain}/"),
            audience: audience.to_string(),
            subject: "auth0|test-user".to_string(),
            kid: Some(TEST_KID.to_string()),
            expires_in: 600,
            permissions: None,
            extra: Map::new(),
        }
    }

    pub fn issuer(mut self, issuer: &str) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    pub fn audience(mut self, audience: &str) -> Self {
        self.audience = audience.to_string();
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    /// Seconds from now; negative values produce an already-expired token.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = seconds;
        self
    }

    pub fn permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.permissions = Some(permissions.into_iter().map(Into::into).collect());
        self
    }

    pub fn claim(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn sign(&self, material: &KeyMaterial) -> String {
        let issued_at = Utc::now().timestamp();
        let mut claims = self.extra.clone();
        claims.insert("iss".into(), json!(self.issuer));
        claims.insert("sub".into(), json!(self.subject));
        claims.insert("aud".into(), json!(self.audience));
        claims.insert("iat".into(), json!(issued_at));
        claims.insert("exp".into(), json!(issued_at + self.expires_in));
        if let Some(permissions) = &self.permissions {
            claims.insert("permissions".into(), json!(permissions));
        }

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.kid.clone();
        encode(&header, &claims, &material.encoding).expect("sign token")
    }
}
