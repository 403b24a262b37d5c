//! Signing key cache
//!
//! The key set is fetched once at startup (a failure there is fatal),
//! refreshed on a fixed interval by [`JwksCache::spawn_refresh`], and
//! refreshed on demand when a token names a key id that is not cached. On
//! demand refreshes are throttled so a flood of tokens with bogus key ids
//! cannot hammer the identity provider. A failed refresh keeps the previous
//! key set.

use jsonwebtoken::{jwk::JwkSet, DecodingKey};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::AuthError;

/// Path of the key set relative to the issuer URL
pub const JWKS_PATH: &str = "/publickeys";

/// Minimum spacing between on-demand refreshes
pub const MIN_ON_DEMAND_REFRESH: Duration = Duration::from_secs(60);

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

struct KeySource {
    url: String,
    client: reqwest::Client,
}

impl KeySource {
    fn new(issuer_url: &str) -> Result<Self, AuthError> {
        let url = format!("{}{}", issuer_url.trim_end_matches('/'), JWKS_PATH);
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|source| AuthError::KeySetUnavailable {
                url: url.clone(),
                source,
            })?;
        Ok(Self { url, client })
    }

    async fn load(&self) -> Result<JwkSet, AuthError> {
        let unavailable = |source| AuthError::KeySetUnavailable {
            url: self.url.clone(),
            source,
        };

        self.client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(unavailable)?
            .json::<JwkSet>()
            .await
            .map_err(unavailable)
    }
}

pub struct JwksCache {
    source: Option<KeySource>,
    keys: RwLock<Arc<JwkSet>>,
    last_refresh: Mutex<Option<Instant>>,
    min_on_demand_refresh: Duration,
}

impl JwksCache {
    /// Fetch `<issuer_url>/publickeys`
    pub async fn fetch(issuer_url: &str) -> Result<Self, AuthError> {
        let source = KeySource::new(issuer_url)?;
        let keys = source.load().await?;

        tracing::info!(url = %source.url, keys = keys.keys.len(), "Loaded signing key set");

        Ok(Self {
            source: Some(source),
            keys: RwLock::new(Arc::new(keys)),
            last_refresh: Mutex::new(Some(Instant::now())),
            min_on_demand_refresh: MIN_ON_DEMAND_REFRESH,
        })
    }

    /// A fixed key set that is never refreshed
    pub fn from_static(keys: JwkSet) -> Self {
        Self {
            source: None,
            keys: RwLock::new(Arc::new(keys)),
            last_refresh: Mutex::new(None),
            min_on_demand_refresh: MIN_ON_DEMAND_REFRESH,
        }
    }

    pub fn with_min_on_demand_refresh(mut self, interval: Duration) -> Self {
        self.min_on_demand_refresh = interval;
        self
    }

    pub async fn keys(&self) -> Arc<JwkSet> {
        self.keys.read().await.clone()
    }

    /// Replace the cached key set with a fresh copy from the issuer
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let Some(source) = &self.source else {
            return Ok(());
        };

        let keys = source.load().await?;
        let count = keys.keys.len();
        *self.keys.write().await = Arc::new(keys);
        *self.last_refresh.lock().await = Some(Instant::now());

        tracing::debug!(keys = count, "Refreshed signing key set");
        Ok(())
    }

    /// Decoding key for `kid`, refreshing once if the id is unknown
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.cached_key(kid).await? {
            return Ok(key);
        }

        if self.refresh_for_unknown_kid(kid).await {
            if let Some(key) = self.cached_key(kid).await? {
                return Ok(key);
            }
        }

        Err(AuthError::UnknownKey(kid.to_string()))
    }

    async fn cached_key(&self, kid: &str) -> Result<Option<DecodingKey>, AuthError> {
        let keys = self.keys().await;
        keys.find(kid)
            .map(|jwk| DecodingKey::from_jwk(jwk).map_err(AuthError::InvalidKey))
            .transpose()
    }

    async fn refresh_for_unknown_kid(&self, kid: &str) -> bool {
        if self.source.is_none() {
            return false;
        }

        {
            let mut last = self.last_refresh.lock().await;
            if let Some(at) = *last {
                if at.elapsed() < self.min_on_demand_refresh {
                    return false;
                }
            }
            *last = Some(Instant::now());
        }

        tracing::info!(kid = %kid, "Unknown signing key, refreshing key set");
        match self.refresh().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Key set refresh failed, keeping previous keys");
                false
            },
        }
    }

    /// Refresh every `every` until the returned task is aborted
    pub fn spawn_refresh(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh().await {
                    tracing::warn!(error = %e, "Key set refresh failed, keeping previous keys");
                }
            }
        })
    }
}
