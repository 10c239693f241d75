//! Identity provider signing keys.
//!
//! Readers share an immutable [`KeySnapshot`] behind an `Arc`; a refresh builds
//! the next snapshot without holding the lock and swaps it in. Only one refresh
//! runs at a time.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::DecodingKey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use super::AuthError;

/// Used when the provider sends no usable `Cache-Control: max-age`.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(60 * 60);

/// An unknown `kid` forces a refresh at most this often.
pub const MIN_FORCED_REFRESH: Duration = Duration::from_secs(30);

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A key set plus how long the provider says it may be cached.
pub struct FetchedKeys {
    pub set: JwkSet,
    pub max_age: Option<Duration>,
}

#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<FetchedKeys, AuthError>;
}

/// Fetches a JWK set over HTTPS.
pub struct HttpKeySource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<FetchedKeys, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?;

        let max_age = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age);

        let set = response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeysUnavailable(format!("invalid JWK set: {}", e)))?;

        Ok(FetchedKeys { set, max_age })
    }
}

/// A fixed key set, for tests and offline development.
pub struct StaticKeySource {
    set: JwkSet,
}

impl StaticKeySource {
    pub fn new(set: JwkSet) -> Self {
        Self { set }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<FetchedKeys, AuthError> {
        Ok(FetchedKeys {
            set: self.set.clone(),
            max_age: None,
        })
    }
}

/// `max-age` seconds from a Cache-Control header value.
pub fn parse_max_age(header: &str) -> Option<Duration> {
    header.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if name.trim().eq_ignore_ascii_case("max-age") {
            value.trim().parse::<u64>().ok().map(Duration::from_secs)
        } else {
            None
        }
    })
}

/// Decoding keys by `kid`, valid until `expires_at`.
pub struct KeySnapshot {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
    expires_at: Instant,
}

impl KeySnapshot {
    fn from_fetched(fetched: FetchedKeys) -> Self {
        let now = Instant::now();
        let ttl = fetched.max_age.unwrap_or(DEFAULT_KEY_TTL);
        Self::new(&fetched.set, now, now + ttl)
    }

    /// Usable keys from `set`; entries without a `kid` or with an
    /// unsupported key type are skipped.
    pub fn new(set: &JwkSet, fetched_at: Instant, expires_at: Instant) -> Self {
        let mut keys = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!("Skipping identity provider key without kid");
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => tracing::warn!("Skipping unusable identity provider key {}: {}", kid, e),
            }
        }

        Self {
            keys,
            fetched_at,
            expires_at,
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// The most recent failed fetch. Refreshes within [`MIN_FORCED_REFRESH`] of it
/// reuse its error instead of calling the provider again.
struct FailedFetch {
    at: Instant,
    error: AuthError,
}

pub struct JwksCache {
    source: Box<dyn KeySource>,
    current: RwLock<Option<Arc<KeySnapshot>>>,
    refreshing: Mutex<Option<FailedFetch>>,
}

impl JwksCache {
    pub fn new(source: Box<dyn KeySource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            refreshing: Mutex::new(None),
        }
    }

    pub async fn snapshot(&self) -> Option<Arc<KeySnapshot>> {
        self.current.read().await.clone()
    }

    /// Decoding key for `kid`, refreshing the key set when it is stale or
    /// does not know `kid`.
    pub async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let seen = self.snapshot().await;

        if let Some(snapshot) = &seen {
            if snapshot.is_fresh() {
                if let Some(key) = snapshot.keys.get(kid) {
                    return Ok(key.clone());
                }
                if snapshot.fetched_at.elapsed() < MIN_FORCED_REFRESH {
                    return Err(AuthError::SignatureInvalid);
                }
            }
        }

        match self.refresh(seen.as_ref()).await {
            Ok(snapshot) => snapshot
                .keys
                .get(kid)
                .cloned()
                .ok_or(AuthError::SignatureInvalid),
            Err(err) => {
                // Serve from the stale set rather than fail every request
                // while the provider is unreachable.
                if let Some(key) = seen.as_ref().and_then(|s| s.keys.get(kid)) {
                    tracing::warn!("Key refresh failed, using cached keys: {}", err);
                    return Ok(key.clone());
                }
                Err(err)
            }
        }
    }

    /// Fetch a new key set and swap it in. If another task already replaced
    /// `seen` while we waited, its snapshot is used instead; if a fetch failed
    /// recently, its error is returned without fetching again.
    async fn refresh(&self, seen: Option<&Arc<KeySnapshot>>) -> Result<Arc<KeySnapshot>, AuthError> {
        let mut last_failure = self.refreshing.lock().await;

        if let Some(latest) = self.snapshot().await {
            let replaced = match seen {
                Some(seen) => !Arc::ptr_eq(seen, &latest),
                None => true,
            };
            if replaced {
                return Ok(latest);
            }
        }

        if let Some(failure) = last_failure.as_ref() {
            if failure.at.elapsed() < MIN_FORCED_REFRESH {
                return Err(failure.error.clone());
            }
        }

        let fetched = match self.source.fetch().await {
            Ok(fetched) => fetched,
            Err(error) => {
                tracing::error!("Identity provider key fetch failed: {}", error);
                *last_failure = Some(FailedFetch {
                    at: Instant::now(),
                    error: error.clone(),
                });
                return Err(error);
            }
        };
        *last_failure = None;

        let snapshot = Arc::new(KeySnapshot::from_fetched(fetched));
        tracing::info!("Refreshed identity provider keys ({} keys)", snapshot.len());

        *self.current.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }
}
