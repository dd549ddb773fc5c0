use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use jsonwebtoken::Algorithm;

const DEFAULT_CACHE_SECONDS: u64 = 600;
const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_MIN_REFRESH_SECONDS: u64 = 30;

/// Runtime configuration for bearer-token verification against an Auth0-style tenant.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity provider host, e.g. `tenant.us.auth0.com`.
    pub domain: String,
    /// Expected audience claim (aud).
    pub audience: String,
    /// Signing algorithm tokens must use.
    pub algorithm: Algorithm,
    /// Where the key set is fetched from; derived from the domain unless overridden.
    pub jwks_url: String,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u32,
    /// How long a fetched key set is reused. Zero re-fetches on every verification.
    pub jwks_cache_ttl: Duration,
    /// Upper bound on a single key-set fetch.
    pub jwks_fetch_timeout: Duration,
    /// Minimum gap between refetches forced by an unrecognised `kid`.
    pub jwks_min_refresh_interval: Duration,
}

impl AuthConfig {
    pub fn new(domain: impl Into<String>, audience: impl Into<String>) -> Self {
        let domain = domain.into();
        let jwks_url = format!("https://{domain}/.well-known/jwks.json");
        Self {
            domain,
            audience: audience.into(),
            algorithm: Algorithm::RS256,
            jwks_url,
            leeway_seconds: 0,
            jwks_cache_ttl: Duration::from_secs(DEFAULT_CACHE_SECONDS),
            jwks_fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
            jwks_min_refresh_interval: Duration::from_secs(DEFAULT_MIN_REFRESH_SECONDS),
        }
    }

    /// Expected issuer claim (iss).
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_fetch_timeout = timeout;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.jwks_min_refresh_interval = interval;
        self
    }

    /// Load from `AUTH0_DOMAIN`, `API_AUDIENCE`, `AUTH0_ALGO` and the optional tuning variables.
    pub fn from_env() -> Result<Self> {
        let domain = required("AUTH0_DOMAIN")?;
        let audience = required("API_AUDIENCE")?;
        let mut config = AuthConfig::new(domain, audience);

        if let Some(algo) = optional("AUTH0_ALGO") {
            config.algorithm = parse_algorithm(&algo)?;
        }
        if let Some(url) = optional("AUTH0_JWKS_URL") {
            config.jwks_url = url;
        }
        if let Some(value) = optional("AUTH0_LEEWAY_SECONDS") {
            config.leeway_seconds = value
                .parse()
                .with_context(|| format!("AUTH0_LEEWAY_SECONDS must be an integer, got '{value}'"))?;
        }
        if let Some(value) = optional("JWKS_CACHE_SECONDS") {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("JWKS_CACHE_SECONDS must be an integer, got '{value}'"))?;
            config.jwks_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(value) = optional("JWKS_FETCH_TIMEOUT_SECONDS") {
            let secs: u64 = value.parse().with_context(|| {
                format!("JWKS_FETCH_TIMEOUT_SECONDS must be an integer, got '{value}'")
            })?;
            config.jwks_fetch_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(value) = optional("JWKS_MIN_REFRESH_SECONDS") {
            let secs: u64 = value.parse().with_context(|| {
                format!("JWKS_MIN_REFRESH_SECONDS must be an integer, got '{value}'")
            })?;
            config.jwks_min_refresh_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_algorithm(value: &str) -> Result<Algorithm> {
    match value.trim().to_ascii_uppercase().as_str() {
        "RS256" => Ok(Algorithm::RS256),
        other => Err(anyhow!("Unsupported AUTH0_ALGO '{other}'. Only RS256 is accepted.")),
    }
}
