use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Published signing keys, in the order the provider lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// First key carrying `kid`; duplicates after it are ignored.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kty: Option<String>,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::JwksUnavailable(err.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> AuthResult<JwkSet> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::JwksUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|err| AuthError::JwksUnavailable(err.to_string()))
    }
}

struct CachedKeys {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Fetches the provider's key set, optionally reusing it for a bounded time.
pub struct KeyResolver {
    fetcher: JwksFetcher,
    ttl: Duration,
    min_refresh_interval: Duration,
    cache: RwLock<Option<CachedKeys>>,
    last_forced_refresh: Mutex<Option<Instant>>,
}

impl KeyResolver {
    pub fn new(fetcher: JwksFetcher, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            cache: RwLock::new(None),
            last_forced_refresh: Mutex::new(None),
        }
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let fetcher = JwksFetcher::new(config.jwks_url.clone(), config.jwks_fetch_timeout)?;
        Ok(Self::new(fetcher, config.jwks_cache_ttl)
            .with_min_refresh_interval(config.jwks_min_refresh_interval))
    }

    pub fn fetcher(&self) -> &JwksFetcher {
        &self.fetcher
    }

    /// Current key set: cached while fresh, otherwise fetched.
    pub async fn resolve(&self) -> AuthResult<Arc<JwkSet>> {
        if let Some(keys) = self.cached() {
            return Ok(keys);
        }
        self.refresh().await
    }

    /// Fetch unconditionally and replace any cached copy.
    pub async fn refresh(&self) -> AuthResult<Arc<JwkSet>> {
        let keys = match self.fetcher.fetch().await {
            Ok(keys) => Arc::new(keys),
            Err(err) => {
                warn!(error = ?err, jwks_url = %self.fetcher.url(), "Failed to fetch JWKS");
                return Err(err);
            }
        };
        debug!(count = keys.keys.len(), jwks_url = %self.fetcher.url(), "Fetched JWKS");

        if !self.ttl.is_zero() {
            let mut guard = self.cache.write().expect("rwlock poisoned");
            *guard = Some(CachedKeys {
                keys: keys.clone(),
                fetched_at: Instant::now(),
            });
        }
        Ok(keys)
    }

    /// Refetch after a `kid` miss, at most once per `min_refresh_interval`.
    /// `None` means a forced refetch ran too recently and was skipped.
    pub async fn refresh_for_unknown_kid(&self) -> AuthResult<Option<Arc<JwkSet>>> {
        {
            let mut last = self.last_forced_refresh.lock().expect("mutex poisoned");
            if last.is_some_and(|at| at.elapsed() < self.min_refresh_interval) {
                return Ok(None);
            }
            *last = Some(Instant::now());
        }
        self.refresh().await.map(Some)
    }

    /// True when the key set may have come from the cache, so a miss is worth a refetch.
    pub fn is_caching(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn cached(&self) -> Option<Arc<JwkSet>> {
        if self.ttl.is_zero() {
            return None;
        }
        let guard = self.cache.read().expect("rwlock poisoned");
        guard
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.keys.clone())
    }
}
