//! Sources of token signing keys.
//!
//! # Purpose
//! Fetch the issuer's published JWKS so the verifier can locate the key a
//! token was signed with.
//!
//! # Key invariants
//! - [`HttpKeyProvider`] makes one bounded-time request per call and never
//!   retries. Transport failures, timeouts and non-success statuses all
//!   surface as [`AuthError::KeyProviderUnavailable`].
//! - [`CachingKeyProvider`] is opt-in. Entries expire after a fixed TTL and
//!   the verifier bypasses the cache once when a `kid` is not found, so key
//!   rotation is picked up without waiting for expiry.
//!
//! # Concurrency model
//! The cache is a `DashMap` shared across request tasks. Two concurrent misses
//! may both fetch; the later insert wins.
use crate::{AuthError, AuthResult, Jwks};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Well-known JWKS location for an issuer domain.
pub fn jwks_url_for(issuer_domain: &str) -> String {
    format!(
        "https://{}/.well-known/jwks.json",
        issuer_domain.trim_end_matches('/')
    )
}

#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn fetch_keys(&self, issuer_domain: &str) -> AuthResult<Jwks>;

    /// Fetch again, skipping any cached copy.
    async fn refresh_keys(&self, issuer_domain: &str) -> AuthResult<Jwks> {
        self.fetch_keys(issuer_domain).await
    }

    /// Whether `fetch_keys` may return a copy older than the current request.
    fn is_cached(&self) -> bool {
        false
    }
}

/// Fetches the JWKS over HTTP on every call.
#[derive(Debug, Clone)]
pub struct HttpKeyProvider {
    client: reqwest::Client,
    jwks_url: Option<String>,
}

impl HttpKeyProvider {
    /// Build a provider whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::from_client(client))
    }

    /// Use a preconfigured client. Its timeout bounds every fetch.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            jwks_url: None,
        }
    }

    /// Fetch from `url` instead of the issuer's well-known location.
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = Some(url.into());
        self
    }

    fn url_for(&self, issuer_domain: &str) -> String {
        self.jwks_url
            .clone()
            .unwrap_or_else(|| jwks_url_for(issuer_domain))
    }
}

#[async_trait]
impl KeyProvider for HttpKeyProvider {
    async fn fetch_keys(&self, issuer_domain: &str) -> AuthResult<Jwks> {
        let url = self.url_for(issuer_domain);
        let result = fetch_jwks(&self.client, &url).await;
        let label = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("casting_jwks_fetch_total", "result" => label).increment(1);
        if let Err(err) = &result {
            tracing::warn!(error = %err, %url, "jwks fetch failed");
        }
        result
    }
}

async fn fetch_jwks(client: &reqwest::Client, url: &str) -> AuthResult<Jwks> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| unavailable("fetch jwks", &err))?
        .error_for_status()
        .map_err(|err| unavailable("jwks status", &err))?;
    response
        .json::<Jwks>()
        .await
        .map_err(|err| unavailable("decode jwks", &err))
}

fn unavailable(context: &str, err: &reqwest::Error) -> AuthError {
    let reason = if err.is_timeout() {
        format!("{context}: timed out")
    } else {
        format!("{context}: {err}")
    };
    AuthError::KeyProviderUnavailable(reason)
}

#[derive(Debug, Clone)]
struct CachedJwks {
    jwks: Jwks,
    expires_at: Instant,
}

/// Wraps another provider with a per-issuer, time-bounded cache.
#[derive(Clone)]
pub struct CachingKeyProvider<P> {
    inner: P,
    cache: Arc<DashMap<String, CachedJwks>>,
    ttl: Duration,
}

impl<P: KeyProvider> CachingKeyProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn cached(&self, issuer_domain: &str) -> Option<Jwks> {
        self.cache.get(issuer_domain).and_then(|entry| {
            if entry.expires_at > Instant::now() {
                Some(entry.jwks.clone())
            } else {
                None
            }
        })
    }

    fn store(&self, issuer_domain: &str, jwks: &Jwks) {
        self.cache.insert(
            issuer_domain.to_string(),
            CachedJwks {
                jwks: jwks.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

#[async_trait]
impl<P: KeyProvider> KeyProvider for CachingKeyProvider<P> {
    async fn fetch_keys(&self, issuer_domain: &str) -> AuthResult<Jwks> {
        if let Some(jwks) = self.cached(issuer_domain) {
            return Ok(jwks);
        }
        self.refresh_keys(issuer_domain).await
    }

    async fn refresh_keys(&self, issuer_domain: &str) -> AuthResult<Jwks> {
        let jwks = self.inner.fetch_keys(issuer_domain).await?;
        self.store(issuer_domain, &jwks);
        Ok(jwks)
    }

    fn is_cached(&self) -> bool {
        true
    }
}
